use anyhow::{Context, Result};
use coordination::debate::{DebateConfig, GuardrailConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default OpenAI-compatible base URL.
pub const DEFAULT_MODEL_URL: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Evaluation configuration.
///
/// Missing TOML keys fall back to [`EvalConfig::default`], which reads the
/// `PUZZLE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// OpenAI-compatible `/v1` base URL.
    pub url: String,
    /// Bearer token; omitted from requests when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub num_agents: usize,
    pub num_rounds: usize,
    /// Per-call deadline in seconds.
    pub call_timeout_secs: u64,
    pub max_retries: u32,
    /// Base back-off in milliseconds; doubles per retry.
    pub retry_backoff_ms: u64,
    /// Concurrent agent calls within one round.
    pub max_parallel: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("PUZZLE_MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_URL.into()),
            api_key: std::env::var("PUZZLE_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok(),
            model: std::env::var("PUZZLE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            temperature: 0.0,
            max_tokens: 1024,
            num_agents: 3,
            num_rounds: 2,
            call_timeout_secs: 300,
            max_retries: 2,
            retry_backoff_ms: 2000,
            max_parallel: 4,
        }
    }
}

impl EvalConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse evaluation config")
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Reject values the debate cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.num_agents >= 1, "num_agents must be at least 1");
        anyhow::ensure!(self.num_rounds >= 1, "num_rounds must be at least 1");
        anyhow::ensure!(self.max_parallel >= 1, "max_parallel must be at least 1");
        anyhow::ensure!(self.call_timeout_secs >= 1, "call_timeout_secs must be at least 1");
        anyhow::ensure!(!self.model.trim().is_empty(), "model must not be empty");
        anyhow::ensure!(!self.url.trim().is_empty(), "url must not be empty");
        Ok(())
    }

    pub fn guardrails(&self) -> GuardrailConfig {
        GuardrailConfig {
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_parallel: self.max_parallel,
        }
    }

    pub fn debate_config(&self) -> DebateConfig {
        DebateConfig {
            num_agents: self.num_agents,
            num_rounds: self.num_rounds,
            model: self.model.clone(),
            guardrails: self.guardrails(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvalConfig::default();
        assert_eq!(config.num_agents, 3);
        assert_eq!(config.num_rounds, 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EvalConfig::from_toml_str(
            r#"
            model = "llava-1.6"
            num_agents = 5
            call_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.model, "llava-1.6");
        assert_eq!(config.num_agents, 5);
        assert_eq!(config.num_rounds, 2);
        assert_eq!(config.guardrails().call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EvalConfig {
            num_rounds: 0,
            ..EvalConfig::default()
        };
        assert!(config.validate().is_err());

        assert!(EvalConfig::from_toml_str("num_agents = \"three\"").is_err());
    }

    #[test]
    fn test_debate_config_carries_model_and_policy() {
        let config = EvalConfig {
            model: "m".into(),
            max_retries: 7,
            retry_backoff_ms: 10,
            ..EvalConfig::default()
        };
        let debate = config.debate_config();
        assert_eq!(debate.model, "m");
        assert_eq!(debate.guardrails.max_retries, 7);
        assert_eq!(debate.guardrails.retry_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.toml");
        std::fs::write(&path, "num_rounds = 4\nmax_parallel = 1\n").unwrap();
        let config = EvalConfig::load(&path).unwrap();
        assert_eq!(config.num_rounds, 4);
        assert_eq!(config.max_parallel, 1);

        assert!(EvalConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
