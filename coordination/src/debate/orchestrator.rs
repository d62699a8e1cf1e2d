//! Debate orchestrator — drives N agents through R synchronized rounds.
//!
//! Ties together the session state, review messages, guarded model calls,
//! answer extraction, and majority voting to evaluate one sample end-to-end.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::ModelClient;
use super::errors::DebateError;
use super::guardrails::{guarded_call, CallSite, GuardrailConfig};
use super::message::{AgentContext, Message};
use super::state::{DebateParams, DebateSession, RoundRecord};
use crate::dataset::Sample;
use crate::ensemble::{majority_vote, VoteOutcome};
use crate::prompting::Prompter;

/// Configuration for the debate orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Independent agents per sample.
    pub num_agents: usize,
    /// Rounds, including the independent first pass.
    pub num_rounds: usize,
    /// Model identifier passed to the client.
    pub model: String,
    /// Timeout, retry, and parallelism policy.
    pub guardrails: GuardrailConfig,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            num_agents: 3,
            num_rounds: 2,
            model: String::new(),
            guardrails: GuardrailConfig::default(),
        }
    }
}

/// Outcome of a completed debate.
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    pub session_id: Uuid,
    /// Final prediction (empty string when nobody produced a usable answer).
    pub prediction: String,
    pub votes: VoteOutcome,
    /// Per-agent extracted answer, in agent order.
    pub extracted: Vec<Option<String>>,
    /// Per-agent final-round text, in agent order.
    pub final_texts: Vec<String>,
    pub contexts: Vec<AgentContext>,
    pub rounds: Vec<RoundRecord>,
}

impl DebateOutcome {
    /// Agents whose final text yielded no option.
    pub fn abstentions(&self) -> usize {
        self.extracted.iter().filter(|e| e.is_none()).count()
    }
}

/// Runs multi-agent debates against a model client.
pub struct DebateOrchestrator {
    client: Arc<dyn ModelClient>,
    prompter: Arc<dyn Prompter>,
    config: DebateConfig,
    params: DebateParams,
    cancel: CancellationToken,
}

impl DebateOrchestrator {
    pub fn new(
        client: Arc<dyn ModelClient>,
        prompter: Arc<dyn Prompter>,
        config: DebateConfig,
    ) -> Result<Self, DebateError> {
        let params = DebateParams::new(config.num_agents, config.num_rounds)?;
        if config.guardrails.max_parallel == 0 {
            return Err(DebateError::InvalidConfig(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            client,
            prompter,
            config,
            params,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an external token so callers can abort in-flight debates.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    /// Opening user text every agent receives.
    pub fn seed_text(base_prompt: &str) -> String {
        format!(
            "{}\nMake sure to state your answer at the end of the response.",
            base_prompt
        )
    }

    /// Question restated inside review messages.
    pub fn question_prompt(base_prompt: &str) -> String {
        format!("We seek to find the result of {}?", base_prompt.trim())
    }

    /// Debate one sample, append every agent's final answer to its raw-output
    /// log and record the prediction.
    ///
    /// The sample is only written after every round has succeeded; on error it
    /// is left untouched.
    pub async fn run(&self, sample: &mut Sample) -> Result<DebateOutcome, DebateError> {
        if sample.options.is_empty() {
            return Err(DebateError::EmptyOptions);
        }

        let base_prompt = self.prompter.base_prompt(sample);
        let seed_text = Self::seed_text(&base_prompt);
        let seed = match &sample.image_data {
            Some(url) => Message::user_with_image(seed_text, url.clone()),
            None => Message::user(seed_text),
        };

        let mut session =
            DebateSession::new(self.params, seed, Self::question_prompt(&base_prompt));
        info!(
            session = %session.id,
            agents = self.params.num_agents(),
            rounds = self.params.num_rounds(),
            has_image = sample.image_data.is_some(),
            "Starting debate"
        );

        while let Some(round) = session.next_round() {
            self.run_round(&mut session, round).await?;
        }

        let final_texts = session.final_texts();
        let extracted: Vec<Option<String>> = final_texts
            .iter()
            .enumerate()
            .map(|(agent, text)| {
                let answer = self.prompter.extract_answer(text, &sample.options);
                if answer.is_none() {
                    warn!(session = %session.id, agent, "No option found in agent answer");
                }
                answer
            })
            .collect();

        let ballots: Vec<&str> = extracted.iter().flatten().map(String::as_str).collect();
        let votes = majority_vote(&ballots);
        let prediction = votes.prediction();

        sample.prompt = base_prompt;
        for text in &final_texts {
            sample.log_agent_answer(text);
        }
        sample.pred = prediction.clone();

        info!(
            session = %session.id,
            prediction = %prediction,
            votes = votes.total_votes(),
            tie = votes.was_tie(),
            "Debate complete"
        );

        let session_id = session.id;
        let rounds = session.rounds().to_vec();
        Ok(DebateOutcome {
            session_id,
            prediction,
            votes,
            extracted,
            final_texts,
            contexts: session.into_contexts(),
            rounds,
        })
    }

    // ── One synchronized round (fan-out / fan-in) ─────────────────────────

    async fn run_round(
        &self,
        session: &mut DebateSession,
        round: usize,
    ) -> Result<(), DebateError> {
        let started_at = Utc::now();
        let start = Instant::now();

        // All review messages come from the end-of-previous-round state.
        let reviews = if round > 0 {
            Some(session.review_messages(round)?)
        } else {
            None
        };
        let mut contexts = session.take_contexts();
        if let Some(reviews) = reviews {
            for (ctx, review) in contexts.iter_mut().zip(reviews) {
                ctx.push(review);
            }
        }

        let sem = Arc::new(Semaphore::new(self.config.guardrails.max_parallel));
        let guardrails = Arc::new(self.config.guardrails.clone());
        let model: Arc<str> = Arc::from(self.config.model.as_str());
        let mut join_set: JoinSet<(usize, Result<AgentContext, DebateError>)> = JoinSet::new();

        for (agent, mut ctx) in contexts.into_iter().enumerate() {
            let sem = sem.clone();
            let client = self.client.clone();
            let guardrails = guardrails.clone();
            let model = model.clone();
            let cancel = self.cancel.clone();

            join_set.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (agent, Err(DebateError::Cancelled)),
                };
                let site = CallSite { agent, round };
                let result =
                    guarded_call(client.as_ref(), &ctx, &model, &guardrails, &cancel, site)
                        .await
                        .map(|text| {
                            ctx.push(Message::assistant(text));
                            ctx
                        });
                (agent, result)
            });
        }

        let mut slots: Vec<Option<AgentContext>> = vec![None; self.params.num_agents()];
        while let Some(joined) = join_set.join_next().await {
            let (agent, result) = joined.map_err(|e| DebateError::AgentTask(e.to_string()))?;
            // First failure wins; dropping the set aborts the remaining agents.
            let ctx = result?;
            debug!(session = %session.id, agent, round, len = ctx.len(), "Agent answered");
            slots[agent] = Some(ctx);
        }

        let contexts: Vec<AgentContext> = slots.into_iter().flatten().collect();
        let duration_ms = start.elapsed().as_millis() as u64;
        session.commit_round(
            RoundRecord {
                round,
                reviewed: round > 0,
                started_at,
                duration_ms,
            },
            contexts,
        )?;

        info!(session = %session.id, round, duration_ms, "Round complete");
        Ok(())
    }
}
