//! OpenAI-compatible chat-completions client.
//!
//! Multimodal messages are sent as content parts (`text` + `image_url`), so
//! any server speaking the `/v1/chat/completions` vision format works.

use async_trait::async_trait;
use coordination::debate::{AgentContext, MessageContent, ModelClient, ModelError, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EvalConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: ChatContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_chat_messages(context: &AgentContext) -> Vec<ChatMessage<'_>> {
    context
        .messages()
        .iter()
        .map(|m| ChatMessage {
            role: role_name(m.role),
            content: match &m.content {
                MessageContent::Text { text } => ChatContent::Text(text),
                MessageContent::Multimodal { text, image_url } => ChatContent::Parts(vec![
                    ContentPart::Text { text },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ]),
            },
        })
        .collect()
}

/// Map a non-success HTTP status to a model error.
fn status_error(status: u16, body: String) -> ModelError {
    match status {
        401 | 403 => ModelError::Auth(body),
        429 => ModelError::RateLimited(body),
        _ => ModelError::Api { status, body },
    }
}

/// Pull the assistant text out of a completion body.
fn completion_text(body: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("Failed to parse response: {}", e)))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("No choices in response".to_string()))?;

    match (choice.message.content, choice.message.reasoning_content) {
        (Some(content), _) if !content.trim().is_empty() => Ok(content),
        (_, Some(reasoning)) if !reasoning.trim().is_empty() => Ok(reasoning),
        _ => Err(ModelError::MalformedResponse(
            "Empty message content".to_string(),
        )),
    }
}

/// Chat-completions backend for the debate.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatClient {
    pub fn from_config(config: &EvalConfig) -> Result<Self, reqwest::Error> {
        // Per-call deadlines are enforced by the debate guardrails.
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelClient for OpenAiChatClient {
    async fn generate_answer(
        &self,
        context: &AgentContext,
        model: &str,
    ) -> Result<String, ModelError> {
        let request = ChatRequest {
            model,
            messages: to_chat_messages(context),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(format!("Failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), body));
        }

        debug!(model, status = status.as_u16(), bytes = body.len(), "Chat completion received");
        completion_text(&body)
    }
}
