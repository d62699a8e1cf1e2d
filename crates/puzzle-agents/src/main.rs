use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use coordination::benchmark::{ExactScorer, ScoreReport};
use coordination::prompting::PrompterOptions;
use puzzle_agents::{evaluate, EvalConfig, EvaluateArgs, OpenAiChatClient};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "puzzle-debate",
    version,
    about = "Multi-agent debate evaluation on multiple-choice visual puzzles"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Debate every sample of a task file and write predictions.
    Evaluate(EvaluateCmd),
    /// Print score tables for result files (<task>/<model>/<prompt>.jsonl).
    Report {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct EvaluateCmd {
    /// JSONL task file.
    data_path: PathBuf,
    #[arg(long, default_value = "data")]
    image_dir: PathBuf,
    #[arg(long, default_value = "cot_multi_extract")]
    prompt_name: String,
    #[arg(long, default_value = "outputs_debate")]
    output_dir: PathBuf,
    #[arg(long)]
    num_agents: Option<usize>,
    #[arg(long)]
    rounds: Option<usize>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    prevent_direct_answer: bool,
    /// Skip the image-description step.
    #[arg(long)]
    no_describe_image: bool,
    /// TOML config file; its values override environment defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only debate the first N samples.
    #[arg(long)]
    limit: Option<usize>,
}

impl EvaluateCmd {
    fn resolve_config(&self) -> Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => EvalConfig::load(path)?,
            None => EvalConfig::default(),
        };
        if let Some(n) = self.num_agents {
            config.num_agents = n;
        }
        if let Some(r) = self.rounds {
            config.num_rounds = r;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn evaluate_args(&self) -> EvaluateArgs {
        EvaluateArgs {
            data_path: self.data_path.clone(),
            image_dir: self.image_dir.clone(),
            prompt_name: self.prompt_name.clone(),
            output_dir: self.output_dir.clone(),
            prompter: PrompterOptions {
                prevent_direct_answer: self.prevent_direct_answer,
                use_describe_image_prompt: !self.no_describe_image,
            },
            limit: self.limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Evaluate(cmd) => run_evaluate(cmd).await,
        Command::Report { paths } => {
            let report = ScoreReport::from_paths(&paths, &ExactScorer)
                .context("Failed to build score report")?;
            println!("{report}");
            Ok(())
        }
    }
}

async fn run_evaluate(cmd: EvaluateCmd) -> Result<()> {
    let config = cmd.resolve_config()?;
    let client = OpenAiChatClient::from_config(&config).context("Failed to build HTTP client")?;
    info!(endpoint = %client.endpoint(), model = %config.model, "Puzzle debate starting");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight debate");
            on_signal.cancel();
        }
    });

    let summary = evaluate(&cmd.evaluate_args(), &config, Arc::new(client), cancel).await?;
    println!(
        "{}: {} samples, accuracy {:.1}%",
        summary.output_path.display(),
        summary.samples,
        summary.accuracy * 100.0
    );
    Ok(())
}
