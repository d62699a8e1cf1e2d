//! Society-of-Mind Debate — N agents, R synchronized rounds, majority vote
//!
//! Every agent holds a private conversation context. Round 0 is an
//! independent first pass; each later round shows every agent its peers'
//! previous answers before asking again. Rounds are separated by a full
//! barrier, so no agent ever reads a peer's in-progress answer.
//!
//! # Debate Flow
//!
//! ```text
//! seed ×N ─→ round 0 ─→ [review msgs] ─→ round 1 ─→ … ─→ round R-1
//!              │  (agents in parallel,        │
//!              │   one JoinSet per round)     │
//!              └──────────── barrier ─────────┘
//!                                                   │
//!                               extract answer ×N ─→ majority vote ─→ pred
//! ```

pub mod client;
pub mod errors;
pub mod guardrails;
pub mod message;
pub mod orchestrator;
pub mod review;
pub mod state;

pub use client::ModelClient;
pub use errors::{DebateError, ModelError, RetryCategory};
pub use guardrails::{guarded_call, CallSite, GuardrailConfig};
pub use message::{AgentContext, Message, MessageContent, Role};
pub use orchestrator::{DebateConfig, DebateOrchestrator, DebateOutcome};
pub use review::{construct_review_message, last_assistant_offset, ReviewError};
pub use state::{DebateParams, DebateSession, RoundRecord};
