//! Call guardrails: per-call timeout and bounded retries.
//!
//! Every model invocation runs inside its agent's own task, so retries never
//! cross the round barrier: a retried call still belongs to the same round.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::client::ModelClient;
use super::errors::{DebateError, ModelError};
use super::message::AgentContext;

/// Upper bound on a single back-off sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Guardrail configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Deadline for one model call.
    pub call_timeout: Duration,
    /// Retries after the first attempt for retriable failures.
    pub max_retries: u32,
    /// Base delay; doubles with each retry.
    pub retry_backoff: Duration,
    /// Concurrent agent calls within one round.
    pub max_parallel: usize,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(300),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
            max_parallel: 4,
        }
    }
}

impl GuardrailConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Which agent and round a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub agent: usize,
    pub round: usize,
}

/// Invoke the model under the configured timeout and retry policy.
pub async fn guarded_call(
    client: &dyn ModelClient,
    context: &AgentContext,
    model: &str,
    config: &GuardrailConfig,
    cancel: &CancellationToken,
    site: CallSite,
) -> Result<String, DebateError> {
    let mut attempt: u32 = 0;
    loop {
        let call =
            tokio::time::timeout(config.call_timeout, client.generate_answer(context, model));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DebateError::Cancelled),
            res = call => res.unwrap_or_else(|_| Err(ModelError::Timeout(config.call_timeout))),
        };

        let err = match result {
            Ok(text) => {
                debug!(
                    agent = site.agent,
                    round = site.round,
                    attempt,
                    chars = text.len(),
                    "Model call succeeded"
                );
                return Ok(text);
            }
            Err(err) => err,
        };

        if !err.is_retriable() || attempt >= config.max_retries {
            return Err(DebateError::ModelCall {
                agent: site.agent,
                round: site.round,
                source: err,
            });
        }

        let delay = config.backoff_for(attempt);
        warn!(
            agent = site.agent,
            round = site.round,
            attempt,
            category = %err.retry_category(),
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Retrying model call"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DebateError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
