//! Agent ensemble aggregation.
//!
//! Reduces the answers extracted from every agent's final turn to a single
//! prediction by majority vote.

pub mod voting;

pub use voting::{majority_vote, VoteOutcome};
