//! Evaluation sample record.

use serde::{Deserialize, Serialize};

/// Prediction value meaning "no agent produced a usable answer".
pub const NO_ANSWER: &str = "";

/// One multiple-choice puzzle plus the debate's outputs for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub question: String,
    /// Image path relative to the dataset image directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduction: Option<String>,
    /// Base prompt sent to the agents.
    #[serde(default)]
    pub prompt: String,
    /// Every agent's final-round text, one `agent answer:` entry per agent.
    #[serde(default)]
    pub raw_output: String,
    #[serde(default)]
    pub pred: String,
    /// Encoded image (`data:` URL). Never persisted.
    #[serde(skip)]
    pub image_data: Option<String>,
}

impl Sample {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_image_data(mut self, data_url: impl Into<String>) -> Self {
        self.image_data = Some(data_url.into());
        self
    }

    /// Whether a non-blank prediction has been recorded.
    pub fn has_prediction(&self) -> bool {
        self.pred != NO_ANSWER
    }

    /// Append one agent's final text to the raw-output log.
    pub fn log_agent_answer(&mut self, text: &str) {
        self.raw_output.push_str("agent answer: ");
        self.raw_output.push_str(text);
        self.raw_output.push('\n');
    }
}
