//! Benchmark Module
//!
//! Scores finished debates and summarises result files.
//!
//! # Architecture
//!
//! ```text
//! evaluate loop ─→ Scorer ─→ ScoreTracker (running accuracy)
//!
//! <task>/<model>/<prompt>.jsonl ×K ─→ ScoreReport
//!                                        ├─ individual tasks
//!                                        ├─ single-concept groups
//!                                        └─ dual-concept groups
//! ```

pub mod report;
pub mod scorer;

pub use report::{
    concept_for, random_baseline, run_score, ReportError, RunKey, ScoreReport, ScoreTable,
    TableRow, AVERAGE_LABEL, INVALID_RUN_SCORE,
};
pub use scorer::{ExactScorer, ScoreTracker, Scorer};
