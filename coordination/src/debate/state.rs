//! Debate session state. N agent contexts advanced through R synchronized rounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DebateError;
use super::message::{AgentContext, Message};
use super::review::construct_review_message;

/// Fixed size of a debate: agent count and round count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateParams {
    num_agents: usize,
    num_rounds: usize,
}

impl DebateParams {
    pub fn new(num_agents: usize, num_rounds: usize) -> Result<Self, DebateError> {
        if num_agents == 0 {
            return Err(DebateError::InvalidConfig(
                "num_agents must be at least 1".to_string(),
            ));
        }
        if num_rounds == 0 {
            return Err(DebateError::InvalidConfig(
                "num_rounds must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            num_agents,
            num_rounds,
        })
    }

    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    /// Messages every context holds once `round` has completed.
    pub fn context_len_after(round: usize) -> usize {
        2 * (round + 1)
    }
}

/// Timing record of one completed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round index (0 = independent first pass).
    pub round: usize,
    /// Whether peer-review messages were injected.
    pub reviewed: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Transient state of one sample's debate.
///
/// Contexts are only replaced wholesale at round boundaries, so readers never
/// observe a half-finished round.
#[derive(Debug, Clone)]
pub struct DebateSession {
    pub id: Uuid,
    params: DebateParams,
    question_prompt: String,
    contexts: Vec<AgentContext>,
    rounds: Vec<RoundRecord>,
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    /// Seed every agent with the same opening message.
    pub fn new(params: DebateParams, seed: Message, question_prompt: impl Into<String>) -> Self {
        let contexts = (0..params.num_agents())
            .map(|_| AgentContext::seeded(seed.clone()))
            .collect();
        Self {
            id: Uuid::new_v4(),
            params,
            question_prompt: question_prompt.into(),
            contexts,
            rounds: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn params(&self) -> DebateParams {
        self.params
    }

    pub fn question_prompt(&self) -> &str {
        &self.question_prompt
    }

    pub fn contexts(&self) -> &[AgentContext] {
        &self.contexts
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds.len()
    }

    /// Index of the next round to run, or `None` once all rounds are done.
    pub fn next_round(&self) -> Option<usize> {
        let next = self.rounds.len();
        (next < self.params.num_rounds()).then_some(next)
    }

    pub fn is_complete(&self) -> bool {
        self.next_round().is_none()
    }

    /// Review messages for `round`, one per agent, built from the current
    /// (end of `round - 1`) contexts. Agent `i` never sees its own context.
    pub fn review_messages(&self, round: usize) -> Result<Vec<Message>, DebateError> {
        (0..self.contexts.len())
            .map(|i| {
                let peers = self
                    .contexts
                    .iter()
                    .enumerate()
                    .filter(move |(j, _)| *j != i);
                construct_review_message(peers, &self.question_prompt, round)
                    .map_err(DebateError::from)
            })
            .collect()
    }

    /// Hand the contexts to per-agent tasks for one round.
    pub fn take_contexts(&mut self) -> Vec<AgentContext> {
        std::mem::take(&mut self.contexts)
    }

    /// Install the contexts returned by a finished round after checking the barrier.
    pub fn commit_round(
        &mut self,
        record: RoundRecord,
        contexts: Vec<AgentContext>,
    ) -> Result<(), DebateError> {
        let round = record.round;
        let expected = DebateParams::context_len_after(round);

        if contexts.len() != self.params.num_agents() {
            return Err(DebateError::AgentTask(format!(
                "round {} returned {} contexts for {} agents",
                round,
                contexts.len(),
                self.params.num_agents()
            )));
        }
        for (agent, ctx) in contexts.iter().enumerate() {
            let ends_with_answer = ctx.last().is_some_and(Message::is_assistant);
            if ctx.len() != expected || !ends_with_answer {
                return Err(DebateError::RoundBarrier {
                    round,
                    agent,
                    expected,
                    actual: ctx.len(),
                });
            }
        }

        self.contexts = contexts;
        self.rounds.push(record);
        Ok(())
    }

    /// Each agent's latest assistant text, in agent order.
    pub fn final_texts(&self) -> Vec<String> {
        self.contexts
            .iter()
            .map(|ctx| ctx.last_assistant_text().unwrap_or_default().to_string())
            .collect()
    }

    /// Give up ownership of the contexts once the debate is over.
    pub fn into_contexts(self) -> Vec<AgentContext> {
        self.contexts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::review::ReviewError;

    fn record(round: usize) -> RoundRecord {
        RoundRecord {
            round,
            reviewed: round > 0,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    fn answer_all(session: &mut DebateSession, round: usize, reviews: Option<Vec<Message>>) {
        let mut contexts = session.take_contexts();
        if let Some(reviews) = reviews {
            for (ctx, review) in contexts.iter_mut().zip(reviews) {
                ctx.push(review);
            }
        }
        for (i, ctx) in contexts.iter_mut().enumerate() {
            ctx.push(Message::assistant(format!("agent {} round {}", i, round)));
        }
        session.commit_round(record(round), contexts).unwrap();
    }

    #[test]
    fn test_params_validation() {
        assert!(DebateParams::new(0, 1).is_err());
        assert!(DebateParams::new(1, 0).is_err());
        let p = DebateParams::new(3, 2).unwrap();
        assert_eq!((p.num_agents(), p.num_rounds()), (3, 2));
    }

    #[test]
    fn test_new_session_seeds_identical_contexts() {
        let params = DebateParams::new(3, 2).unwrap();
        let session = DebateSession::new(params, Message::user("seed"), "Q?");
        assert_eq!(session.contexts().len(), 3);
        assert!(session.contexts().iter().all(|c| c.len() == 1));
        assert_eq!(session.next_round(), Some(0));
    }

    #[test]
    fn test_review_messages_exclude_self() {
        let params = DebateParams::new(3, 2).unwrap();
        let mut session = DebateSession::new(params, Message::user("seed"), "Q?");
        answer_all(&mut session, 0, None);

        let reviews = session.review_messages(1).unwrap();
        assert_eq!(reviews.len(), 3);
        for (i, review) in reviews.iter().enumerate() {
            assert!(!review.text().contains(&format!("agent {} round 0", i)));
            assert_eq!(review.text().matches("One agent's response").count(), 2);
        }
    }

    #[test]
    fn test_review_error_reports_broken_agent() {
        let params = DebateParams::new(3, 2).unwrap();
        let mut session = DebateSession::new(params, Message::user("seed"), "Q?");
        answer_all(&mut session, 0, None);
        // Corrupt agent 1's round-0 answer in place.
        let mut contexts = session.take_contexts();
        contexts[1] = AgentContext::seeded(Message::user("seed"));
        contexts[1].push(Message::user("not an answer"));
        session.contexts = contexts;

        let err = session.review_messages(1).unwrap_err();
        assert!(matches!(
            err,
            DebateError::Review(ReviewError::UnexpectedRole { peer: 1, offset: 1, .. })
        ));
    }

    #[test]
    fn test_commit_enforces_barrier() {
        let params = DebateParams::new(2, 1).unwrap();
        let mut session = DebateSession::new(params, Message::user("seed"), "Q?");
        let mut contexts = session.take_contexts();
        contexts[0].push(Message::assistant("done"));
        // agent 1 never answered

        let err = session.commit_round(record(0), contexts).unwrap_err();
        assert!(matches!(
            err,
            DebateError::RoundBarrier {
                agent: 1,
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(session.rounds_completed(), 0);
    }

    #[test]
    fn test_commit_rejects_wrong_agent_count() {
        let params = DebateParams::new(2, 1).unwrap();
        let mut session = DebateSession::new(params, Message::user("seed"), "Q?");
        let mut contexts = session.take_contexts();
        contexts.truncate(1);
        contexts[0].push(Message::assistant("a"));
        assert!(session.commit_round(record(0), contexts).is_err());
    }

    #[test]
    fn test_full_session_lifecycle() {
        let params = DebateParams::new(2, 2).unwrap();
        let mut session = DebateSession::new(params, Message::user("seed"), "Q?");
        answer_all(&mut session, 0, None);
        let reviews = session.review_messages(1).unwrap();
        answer_all(&mut session, 1, Some(reviews));

        assert!(session.is_complete());
        assert!(session.contexts().iter().all(|c| c.len() == 4));
        assert_eq!(
            session.final_texts(),
            vec!["agent 0 round 1".to_string(), "agent 1 round 1".to_string()]
        );
        assert_eq!(session.rounds().len(), 2);
        assert!(session.rounds()[1].reviewed);
    }
}
