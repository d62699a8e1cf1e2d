//! Evaluate pipeline test: dataset file in, result file and report out,
//! with a stub model client standing in for the HTTP backend.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coordination::benchmark::{ExactScorer, ScoreReport};
use coordination::dataset::{Dataset, Sample};
use coordination::debate::{AgentContext, ModelClient, ModelError};
use puzzle_agents::{evaluate, EvalConfig, EvaluateArgs};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

/// Always picks option (A) and remembers whether it saw an image.
#[derive(Default)]
struct OptionAClient {
    calls: AtomicUsize,
    with_image: AtomicUsize,
}

#[async_trait]
impl ModelClient for OptionAClient {
    async fn generate_answer(
        &self,
        context: &AgentContext,
        _model: &str,
    ) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if context.messages()[0].content.image_url().is_some() {
            self.with_image.fetch_add(1, Ordering::SeqCst);
        }
        Ok("Counting the sides first. The answer is (A)".to_string())
    }
}

fn config() -> EvalConfig {
    EvalConfig {
        model: "stub".to_string(),
        num_agents: 3,
        num_rounds: 2,
        max_parallel: 2,
        ..EvalConfig::default()
    }
}

fn write_task(dir: &Path) -> std::path::PathBuf {
    std::fs::create_dir_all(dir.join("images")).unwrap();
    std::fs::write(dir.join("images/0.png"), b"\x89PNG").unwrap();

    let samples = vec![
        Sample::new("How many sides?", vec!["3".into(), "4".into(), "5".into()], "3")
            .with_image("images/0.png"),
        Sample::new("Which size?", vec!["small".into(), "large".into(), "medium".into()], "large"),
    ];
    let path = dir.join("triangle.jsonl");
    Dataset::new(samples).save(&path).unwrap();
    path
}

// ── Full run ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_evaluate_writes_results_and_reports() {
    let dir = tempdir().unwrap();
    let data_path = write_task(dir.path());
    let mut args = EvaluateArgs::new(&data_path);
    args.image_dir = dir.path().to_path_buf();
    args.output_dir = dir.path().join("outputs_debate");

    let client = Arc::new(OptionAClient::default());
    let summary = evaluate(&args, &config(), client.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.samples, 2);
    assert!((summary.accuracy - 0.5).abs() < 1e-9);
    assert_eq!(summary.blank, 0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 12);
    // Only the first sample carries an image: 3 agents × 2 rounds.
    assert_eq!(client.with_image.load(Ordering::SeqCst), 6);

    assert!(summary
        .output_path
        .ends_with("outputs_debate/triangle/stub/cot_multi_extract.jsonl"));
    let results = Dataset::load(&summary.output_path).unwrap();
    assert_eq!(results.samples[0].pred, "3");
    assert_eq!(results.samples[1].pred, "small");
    for sample in &results.samples {
        assert_eq!(sample.raw_output.matches("agent answer: ").count(), 3);
        assert!(sample.image_data.is_none());
    }
    let persisted = std::fs::read_to_string(&summary.output_path).unwrap();
    assert!(!persisted.contains("base64"));

    let report = ScoreReport::from_paths(&[summary.output_path.clone()], &ExactScorer).unwrap();
    assert_eq!(report.score("triangle", "stub"), Some(50.0));
    assert!(report.to_string().contains("numbers"));
}

// ── Limit and failure handling ────────────────────────────────────

#[tokio::test]
async fn test_limit_truncates_dataset() {
    let dir = tempdir().unwrap();
    let data_path = write_task(dir.path());
    let mut args = EvaluateArgs::new(&data_path);
    args.image_dir = dir.path().to_path_buf();
    args.output_dir = dir.path().join("out");
    args.limit = Some(1);

    let summary = evaluate(
        &args,
        &config(),
        Arc::new(OptionAClient::default()),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(summary.samples, 1);
    assert_eq!(Dataset::load(&summary.output_path).unwrap().samples.len(), 1);
}

#[tokio::test]
async fn test_missing_image_aborts_before_any_call() {
    let dir = tempdir().unwrap();
    let data_path = write_task(dir.path());
    let mut args = EvaluateArgs::new(&data_path);
    args.image_dir = dir.path().join("elsewhere");
    args.output_dir = dir.path().join("out");

    let client = Arc::new(OptionAClient::default());
    let err = evaluate(&args, &config(), client.clone(), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("0.png"));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_prompt_rejected() {
    let dir = tempdir().unwrap();
    let data_path = write_task(dir.path());
    let mut args = EvaluateArgs::new(&data_path);
    args.prompt_name = "telepathy".to_string();

    let err = evaluate(
        &args,
        &config(),
        Arc::new(OptionAClient::default()),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("telepathy"));
}
