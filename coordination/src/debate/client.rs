//! Model client seam.

use async_trait::async_trait;

use super::errors::ModelError;
use super::message::AgentContext;

/// Produces the next assistant turn for a conversation.
///
/// The context's last message may be either a user or an assistant turn.
/// Implementations must not retry internally; the debate call policy owns
/// timeouts and retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate_answer(
        &self,
        context: &AgentContext,
        model: &str,
    ) -> Result<String, ModelError>;
}
