//! Prompter seam: base prompt construction and answer extraction.

pub mod extract;
pub mod templates;

use thiserror::Error;

use crate::dataset::Sample;

pub use extract::{extract_answer, option_label};
pub use templates::{TemplatePrompter, PROMPT_VERSION};

/// Builds the question prompt for a sample and reads answers back out.
pub trait Prompter: Send + Sync {
    /// Prompt name, used in output paths.
    fn name(&self) -> &str;

    fn base_prompt(&self, sample: &Sample) -> String;

    /// Map agent text to one of `options`, or `None` if no option is identified.
    fn extract_answer(&self, text: &str, options: &[String]) -> Option<String>;
}

/// Template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Reason step by step, then answer.
    ChainOfThought,
    /// Answer with an option directly.
    Direct,
}

/// Flags honoured by the templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrompterOptions {
    /// Discourage answering before reasoning.
    pub prevent_direct_answer: bool,
    /// Ask for an image description before solving.
    pub use_describe_image_prompt: bool,
}

impl Default for PrompterOptions {
    fn default() -> Self {
        Self {
            prevent_direct_answer: false,
            use_describe_image_prompt: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown prompt name '{0}' (expected one of: cot_multi_extract, cot, direct)")]
pub struct UnknownPrompt(pub String);

/// Resolve a prompt name to a prompter.
pub fn select_prompter(
    name: &str,
    options: PrompterOptions,
) -> Result<TemplatePrompter, UnknownPrompt> {
    let style = match name {
        "cot_multi_extract" | "cot" => PromptStyle::ChainOfThought,
        "direct" => PromptStyle::Direct,
        other => return Err(UnknownPrompt(other.to_string())),
    };
    Ok(TemplatePrompter::new(name, style, options))
}
