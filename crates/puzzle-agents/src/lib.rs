//! Puzzle debate runner: HTTP model client, configuration, image encoding and
//! the `evaluate` driver built on the `coordination` debate core.

pub mod client;
pub mod config;
pub mod evaluate;
pub mod images;

pub use client::OpenAiChatClient;
pub use config::EvalConfig;
pub use evaluate::{evaluate, EvalSummary, EvaluateArgs};
pub use images::{attach_image, encode_image, ImageError};
