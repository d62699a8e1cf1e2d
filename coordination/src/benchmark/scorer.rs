//! Per-sample scoring and running accuracy.

use serde::{Deserialize, Serialize};

use crate::dataset::Sample;

/// Scores one evaluated sample in `[0, 1]`.
pub trait Scorer: Send + Sync {
    fn score(&self, sample: &Sample) -> f64;
}

/// 1.0 iff the prediction equals the ground-truth answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactScorer;

impl Scorer for ExactScorer {
    fn score(&self, sample: &Sample) -> f64 {
        if sample.pred == sample.answer {
            1.0
        } else {
            0.0
        }
    }
}

/// Running accuracy accumulator, owned by whoever drives the evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreTracker {
    total: f64,
    count: usize,
    blank: usize,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample's score. Returns the score.
    pub fn record(&mut self, scorer: &dyn Scorer, sample: &Sample) -> f64 {
        let score = scorer.score(sample);
        self.total += score;
        self.count += 1;
        if !sample.has_prediction() {
            self.blank += 1;
        }
        score
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Samples whose prediction was left blank.
    pub fn blank(&self) -> usize {
        self.blank
    }

    /// Mean score so far, 0 when nothing has been recorded.
    pub fn accuracy(&self) -> f64 {
        if self.count > 0 {
            self.total / self.count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(pred: &str, answer: &str) -> Sample {
        let mut s = Sample::new("q", vec!["1".into(), "2".into()], answer);
        s.pred = pred.to_string();
        s
    }

    #[test]
    fn test_exact_scorer() {
        assert_eq!(ExactScorer.score(&scored("2", "2")), 1.0);
        assert_eq!(ExactScorer.score(&scored("1", "2")), 0.0);
        assert_eq!(ExactScorer.score(&scored("", "2")), 0.0);
    }

    #[test]
    fn test_tracker_accumulates() {
        let mut tracker = ScoreTracker::new();
        assert_eq!(tracker.accuracy(), 0.0);

        tracker.record(&ExactScorer, &scored("2", "2"));
        tracker.record(&ExactScorer, &scored("1", "2"));
        tracker.record(&ExactScorer, &scored("", "2"));
        tracker.record(&ExactScorer, &scored("2", "2"));

        assert_eq!(tracker.count(), 4);
        assert_eq!(tracker.blank(), 1);
        assert!((tracker.accuracy() - 0.5).abs() < f64::EPSILON);
    }
}
