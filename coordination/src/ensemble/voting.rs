//! Majority voting over extracted agent answers.
//!
//! Tie-break: when several answers share the highest count, the one that
//! appears first in the input wins. Empty input produces no winner.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::NO_ANSWER;

/// Outcome of a voting round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    /// Most frequent answer, `None` if nobody voted.
    pub winner: Option<String>,
    /// `(answer, count)` in first-seen order.
    pub tally: Vec<(String, usize)>,
    /// Answers sharing the top count, in first-seen order. Length > 1 means a tie was broken.
    pub tied: Vec<String>,
}

impl VoteOutcome {
    /// Winner, or the empty-prediction sentinel.
    pub fn prediction(&self) -> String {
        self.winner.clone().unwrap_or_else(|| NO_ANSWER.to_string())
    }

    pub fn was_tie(&self) -> bool {
        self.tied.len() > 1
    }

    pub fn total_votes(&self) -> usize {
        self.tally.iter().map(|(_, n)| n).sum()
    }
}

/// Count each distinct answer and pick the most frequent one.
pub fn majority_vote<S: AsRef<str>>(answers: &[S]) -> VoteOutcome {
    let mut tally: Vec<(String, usize)> = Vec::new();
    for answer in answers {
        let answer = answer.as_ref();
        match tally.iter_mut().find(|(a, _)| a == answer) {
            Some((_, count)) => *count += 1,
            None => tally.push((answer.to_string(), 1)),
        }
    }

    let max = tally.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let tied: Vec<String> = tally
        .iter()
        .filter(|(_, n)| *n == max && max > 0)
        .map(|(a, _)| a.clone())
        .collect();
    let winner = tied.first().cloned();

    if tied.len() > 1 {
        debug!(tied = ?tied, winner = ?winner, "Vote tie broken by first-seen order");
    }

    VoteOutcome {
        winner,
        tally,
        tied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_majority() {
        let outcome = majority_vote(&["A", "A", "B"]);
        assert_eq!(outcome.winner.as_deref(), Some("A"));
        assert!(!outcome.was_tie());
        assert_eq!(outcome.tally, vec![("A".into(), 2), ("B".into(), 1)]);
        assert_eq!(outcome.total_votes(), 3);
    }

    #[test]
    fn test_tie_prefers_first_seen() {
        let outcome = majority_vote(&["A", "B"]);
        assert_eq!(outcome.winner.as_deref(), Some("A"));
        assert!(outcome.was_tie());
        assert_eq!(outcome.tied, vec!["A".to_string(), "B".to_string()]);

        let reversed = majority_vote(&["B", "A"]);
        assert_eq!(reversed.winner.as_deref(), Some("B"));
    }

    #[test]
    fn test_tie_is_reproducible() {
        let input = ["7", "3", "3", "7", "5"];
        let first = majority_vote(&input);
        for _ in 0..10 {
            assert_eq!(majority_vote(&input), first);
        }
        assert_eq!(first.winner.as_deref(), Some("7"));
    }

    #[test]
    fn test_later_majority_beats_earlier_single() {
        let outcome = majority_vote(&["C", "D", "D"]);
        assert_eq!(outcome.winner.as_deref(), Some("D"));
    }

    #[test]
    fn test_empty_returns_sentinel() {
        let outcome = majority_vote::<&str>(&[]);
        assert!(outcome.winner.is_none());
        assert!(outcome.tied.is_empty());
        assert_eq!(outcome.prediction(), NO_ANSWER);
    }

    #[test]
    fn test_accepts_owned_strings() {
        let answers = vec!["red".to_string(), "blue".to_string(), "blue".to_string()];
        assert_eq!(majority_vote(&answers).prediction(), "blue");
    }
}
