//! Puzzle Debate Coordination Library
//!
//! This library provides the deterministic core of a multi-agent debate
//! evaluator for multiple-choice visual puzzles:
//! - Data model for samples, messages, and per-agent contexts
//! - Round-synchronized debate orchestration with majority voting
//! - Prompt templates and free-text answer extraction
//! - Dataset persistence, scoring, and score reports
//!
//! The model backend is a trait ([`ModelClient`]); this crate performs no
//! network I/O itself.
//!
//! # Usage
//!
//! ```ignore
//! let prompter = select_prompter("cot_multi_extract", PrompterOptions::default())?;
//! let orchestrator = DebateOrchestrator::new(client, Arc::new(prompter), DebateConfig::default())?;
//! let outcome = orchestrator.run(&mut sample).await?;
//! println!("{}", outcome.prediction);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod benchmark;
pub mod dataset;
pub mod debate;
pub mod ensemble;
pub mod prompting;

// Re-export key debate types
pub use debate::{
    AgentContext, DebateConfig, DebateError, DebateOrchestrator, DebateOutcome, GuardrailConfig,
    Message, MessageContent, ModelClient, ModelError, RetryCategory, Role,
};

// Re-export dataset types
pub use dataset::{output_path, Dataset, DatasetError, Sample, NO_ANSWER};

// Re-export prompting types
pub use prompting::{
    extract_answer, select_prompter, PromptStyle, Prompter, PrompterOptions, TemplatePrompter,
    UnknownPrompt,
};

// Re-export voting types
pub use ensemble::{majority_vote, VoteOutcome};

// Re-export scoring types
pub use benchmark::{ExactScorer, ReportError, ScoreReport, ScoreTracker, Scorer};
