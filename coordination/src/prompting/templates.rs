//! Prompt templates for multiple-choice visual puzzles.
//!
//! Bump `PROMPT_VERSION` whenever template text changes so result files can
//! be traced back to the wording that produced them.

use crate::dataset::Sample;

use super::extract::{extract_answer, option_label};
use super::{PromptStyle, Prompter, PrompterOptions};

/// Template version. Bump on any wording change.
pub const PROMPT_VERSION: &str = "1.0.0";

const DESCRIBE_IMAGE_INSTRUCTION: &str = "\
First, describe the image in detail, including every shape, color, number and \
its position. Then use your description to solve the puzzle.";

const CHAIN_OF_THOUGHT_INSTRUCTION: &str = "\
Answer the question by reasoning step by step about the pattern in the image, \
then choose the correct option.";

const PREVENT_DIRECT_ANSWER_INSTRUCTION: &str = "\
Do not state the final answer until you have explained your reasoning.";

const DIRECT_INSTRUCTION: &str = "\
Answer with the option's letter from the given choices directly.";

/// Builds base prompts from fixed templates and extracts answers by heuristics.
#[derive(Debug, Clone)]
pub struct TemplatePrompter {
    name: String,
    style: PromptStyle,
    options: PrompterOptions,
}

impl TemplatePrompter {
    pub fn new(name: impl Into<String>, style: PromptStyle, options: PrompterOptions) -> Self {
        Self {
            name: name.into(),
            style,
            options,
        }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn options(&self) -> &PrompterOptions {
        &self.options
    }
}

fn format_options(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, opt)| match option_label(i) {
            Some(label) => format!("({}) {}", label, opt),
            None => opt.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Prompter for TemplatePrompter {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_prompt(&self, sample: &Sample) -> String {
        let mut parts: Vec<String> = Vec::new();

        if self.options.use_describe_image_prompt && self.style == PromptStyle::ChainOfThought {
            parts.push(DESCRIBE_IMAGE_INSTRUCTION.to_string());
        }

        parts.push(sample.question.trim().to_string());
        parts.push(format!("Options:\n{}", format_options(&sample.options)));

        match self.style {
            PromptStyle::ChainOfThought => {
                parts.push(CHAIN_OF_THOUGHT_INSTRUCTION.to_string());
                if self.options.prevent_direct_answer {
                    parts.push(PREVENT_DIRECT_ANSWER_INSTRUCTION.to_string());
                }
            }
            PromptStyle::Direct => parts.push(DIRECT_INSTRUCTION.to_string()),
        }

        parts.join("\n\n")
    }

    fn extract_answer(&self, text: &str, options: &[String]) -> Option<String> {
        extract_answer(text, options)
    }
}
