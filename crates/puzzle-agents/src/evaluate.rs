//! The `evaluate` driver: debate every sample of one task file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use coordination::benchmark::{ExactScorer, ScoreTracker};
use coordination::dataset::{output_path, Dataset};
use coordination::debate::{DebateOrchestrator, ModelClient};
use coordination::prompting::{select_prompter, PrompterOptions};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EvalConfig;
use crate::images::attach_image;

/// Inputs of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub data_path: PathBuf,
    pub image_dir: PathBuf,
    pub prompt_name: String,
    pub output_dir: PathBuf,
    pub prompter: PrompterOptions,
    /// Only debate the first N samples.
    pub limit: Option<usize>,
}

impl EvaluateArgs {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            image_dir: PathBuf::from("data"),
            prompt_name: "cot_multi_extract".to_string(),
            output_dir: PathBuf::from("outputs_debate"),
            prompter: PrompterOptions::default(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub output_path: PathBuf,
    pub samples: usize,
    pub accuracy: f64,
    /// Samples where no agent produced a usable answer.
    pub blank: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Debate every sample, rewriting the result file after each one.
///
/// A failing sample aborts the run; results already written stay on disk.
pub async fn evaluate(
    args: &EvaluateArgs,
    config: &EvalConfig,
    client: Arc<dyn ModelClient>,
    cancel: CancellationToken,
) -> Result<EvalSummary> {
    let started_at = Utc::now();
    config.validate()?;

    let prompter = select_prompter(&args.prompt_name, args.prompter.clone())?;
    let orchestrator = DebateOrchestrator::new(client, Arc::new(prompter), config.debate_config())?
        .with_cancellation(cancel);

    let mut data = Dataset::load(&args.data_path)
        .with_context(|| format!("Failed to load dataset {}", args.data_path.display()))?;
    if let Some(limit) = args.limit {
        data.samples.truncate(limit);
    }

    let out = output_path(
        &args.output_dir,
        &args.data_path,
        &config.model,
        &args.prompt_name,
    );
    info!(
        data = %args.data_path.display(),
        output = %out.display(),
        samples = data.samples.len(),
        agents = config.num_agents,
        rounds = config.num_rounds,
        model = %config.model,
        "Starting evaluation"
    );

    let mut tracker = ScoreTracker::new();
    for i in 0..data.samples.len() {
        let sample = &mut data.samples[i];
        attach_image(sample, &args.image_dir)?;

        let outcome = orchestrator
            .run(sample)
            .await
            .with_context(|| format!("Debate failed on sample {}", i))?;
        sample.image_data = None;

        let score = tracker.record(&ExactScorer, sample);
        info!(
            sample = i,
            pred = %outcome.prediction,
            answer = %sample.answer,
            score,
            accuracy = tracker.accuracy(),
            "Sample evaluated"
        );

        data.save(&out)
            .with_context(|| format!("Failed to save results to {}", out.display()))?;
    }

    let summary = EvalSummary {
        output_path: out,
        samples: tracker.count(),
        accuracy: tracker.accuracy(),
        blank: tracker.blank(),
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        samples = summary.samples,
        accuracy = summary.accuracy,
        blank = summary.blank,
        "Evaluation complete"
    );
    Ok(summary)
}
