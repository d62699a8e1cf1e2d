//! Score tables over finished result files.
//!
//! Each result file lives at `<output>/<task>/<model>/<prompt>.jsonl`; the
//! report collects one score per (task, model) and prints three tables:
//! individual tasks, single-concept groups, and dual-concept groups.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::scorer::Scorer;
use crate::dataset::{Dataset, DatasetError};

/// Score given to runs that contain any blank prediction.
pub const INVALID_RUN_SCORE: f64 = -1.0;

/// Label of the average row in grouped tables.
pub const AVERAGE_LABEL: &str = "~avg.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("result path {0} must look like <task>/<model>/<prompt>.jsonl")]
    BadPath(PathBuf),

    #[error("result file {0} contains no samples")]
    Empty(PathBuf),
}

/// Concept(s) a puzzle task exercises. Dual concepts are joined by `-`.
pub fn concept_for(task: &str) -> &'static str {
    match task {
        "triangle" | "grid_number" => "numbers",
        "color_grid" | "color_hexagon" => "colors",
        "shape_reflect" | "shape_morph" => "shapes",
        "size_cycle" | "size_grid" => "size",
        "color_number_hexagon" | "grid_number_color" => "colors-numbers",
        "venn" | "polygon_sides_number" => "numbers-shapes",
        "circle_size_number" | "rectangle_height_number" => "numbers-size",
        "polygon_sides_color" | "color_overlap_squares" => "colors-shapes",
        "rectangle_height_color" | "color_size_circle" => "colors-size",
        "shape_size_hexagon" | "shape_size_grid" => "size-shapes",
        _ => "unknown",
    }
}

/// Chance accuracy in percent.
pub fn random_baseline(num_options: usize) -> f64 {
    if num_options == 4 {
        25.0
    } else {
        100.0 / 3.0
    }
}

/// Mean score × 100, or [`INVALID_RUN_SCORE`] if any prediction is blank.
pub fn run_score(dataset: &Dataset, scorer: &dyn Scorer) -> Option<f64> {
    if dataset.samples.is_empty() {
        return None;
    }
    if dataset.samples.iter().any(|s| !s.has_prediction()) {
        return Some(INVALID_RUN_SCORE);
    }
    let total: f64 = dataset.samples.iter().map(|s| scorer.score(s)).sum();
    Some(total / dataset.samples.len() as f64 * 100.0)
}

/// Task, model and prompt recovered from a result path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunKey {
    pub task: String,
    pub model: String,
    pub prompt: String,
}

impl RunKey {
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let bad = || ReportError::BadPath(path.to_path_buf());
        let prompt = path.file_stem().ok_or_else(bad)?;
        let model_dir = path.parent().ok_or_else(bad)?;
        let model = model_dir.file_name().ok_or_else(bad)?;
        let task = model_dir
            .parent()
            .and_then(Path::file_name)
            .ok_or_else(bad)?;
        Ok(Self {
            task: task.to_string_lossy().into_owned(),
            model: model.to_string_lossy().into_owned(),
            prompt: prompt.to_string_lossy().into_owned(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskEntry {
    task: String,
    concepts: String,
    random_baseline: f64,
    scores: BTreeMap<String, f64>,
}

/// Scores of every (task, model) pair seen so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreReport {
    models: Vec<String>,
    tasks: Vec<TaskEntry>,
}

impl ScoreReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and score every result file.
    pub fn from_paths<P: AsRef<Path>>(
        paths: &[P],
        scorer: &dyn Scorer,
    ) -> Result<Self, ReportError> {
        let mut report = Self::new();
        for path in paths {
            let path = path.as_ref();
            let key = RunKey::from_path(path)?;
            let dataset = Dataset::load(path)?;
            report.add_run(&key, &dataset, scorer).map_err(|e| match e {
                ReportError::Empty(_) => ReportError::Empty(path.to_path_buf()),
                other => other,
            })?;
        }
        Ok(report)
    }

    /// Score one run. A later run for the same (task, model) replaces the earlier one.
    pub fn add_run(
        &mut self,
        key: &RunKey,
        dataset: &Dataset,
        scorer: &dyn Scorer,
    ) -> Result<(), ReportError> {
        let score = run_score(dataset, scorer)
            .ok_or_else(|| ReportError::Empty(PathBuf::from(&key.task)))?;
        if score == INVALID_RUN_SCORE {
            warn!(task = %key.task, model = %key.model, "Run has blank predictions");
        }
        debug!(task = %key.task, model = %key.model, prompt = %key.prompt, score, "Scored run");

        if !self.models.contains(&key.model) {
            self.models.push(key.model.clone());
        }
        let num_options = dataset.samples.first().map_or(0, |s| s.options.len());
        let idx = match self.tasks.iter().position(|t| t.task == key.task) {
            Some(idx) => idx,
            None => {
                self.tasks.push(TaskEntry {
                    task: key.task.clone(),
                    concepts: concept_for(&key.task).to_string(),
                    random_baseline: random_baseline(num_options),
                    scores: BTreeMap::new(),
                });
                self.tasks.len() - 1
            }
        };
        let entry = &mut self.tasks[idx];
        entry.random_baseline = random_baseline(num_options);
        entry.scores.insert(key.model.clone(), score);
        Ok(())
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn score(&self, task: &str, model: &str) -> Option<f64> {
        self.tasks
            .iter()
            .find(|t| t.task == task)
            .and_then(|t| t.scores.get(model).copied())
    }

    fn value_columns(&self) -> Vec<String> {
        std::iter::once("random_baseline".to_string())
            .chain(self.models.iter().cloned())
            .collect()
    }

    fn values(&self, entry: &TaskEntry) -> Vec<Option<f64>> {
        std::iter::once(Some(entry.random_baseline))
            .chain(self.models.iter().map(|m| entry.scores.get(m).copied()))
            .collect()
    }

    /// One row per task sorted by concept-name length, plus a mean row.
    pub fn individual(&self) -> ScoreTable {
        let mut entries: Vec<&TaskEntry> = self.tasks.iter().collect();
        entries.sort_by_key(|t| t.concepts.len());

        let mut rows: Vec<TableRow> = entries
            .iter()
            .map(|t| TableRow {
                labels: vec![t.concepts.clone(), t.task.clone()],
                values: self.values(t),
            })
            .collect();
        if !rows.is_empty() {
            let means = column_means(&rows);
            rows.push(TableRow {
                labels: vec![String::new(), String::new()],
                values: means,
            });
        }

        ScoreTable {
            title: "Individual task results".to_string(),
            label_columns: vec!["concepts".to_string(), "task".to_string()],
            value_columns: self.value_columns(),
            rows,
        }
    }

    /// Single-concept tasks averaged per concept.
    pub fn single_concept(&self) -> ScoreTable {
        self.grouped("Single-concept results", |c| !c.contains('-'))
    }

    /// Dual-concept tasks averaged per concept pair.
    pub fn dual_concept(&self) -> ScoreTable {
        self.grouped("Dual-concept results", |c| c.contains('-'))
    }

    /// Tasks scored by every model, filtered by concept, then grouped. The
    /// average row is taken over tasks, not over groups.
    fn grouped(&self, title: &str, keep: impl Fn(&str) -> bool) -> ScoreTable {
        let complete: Vec<&TaskEntry> = self
            .tasks
            .iter()
            .filter(|t| keep(&t.concepts))
            .filter(|t| self.models.iter().all(|m| t.scores.contains_key(m)))
            .collect();

        let mut groups: BTreeMap<String, Vec<TableRow>> = BTreeMap::new();
        for t in &complete {
            groups.entry(t.concepts.clone()).or_default().push(TableRow {
                labels: vec![t.concepts.clone()],
                values: self.values(t),
            });
        }
        if !complete.is_empty() {
            let all: Vec<TableRow> = groups.values().flatten().cloned().collect();
            let average = TableRow {
                labels: vec![AVERAGE_LABEL.to_string()],
                values: column_means(&all),
            };
            groups.insert(AVERAGE_LABEL.to_string(), vec![average]);
        }

        let rows = groups
            .into_iter()
            .map(|(concept, members)| TableRow {
                labels: vec![concept],
                values: column_means(&members),
            })
            .collect();

        ScoreTable {
            title: title.to_string(),
            label_columns: vec!["concepts".to_string()],
            value_columns: self.value_columns(),
            rows,
        }
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.individual())?;
        writeln!(f, "{}", self.single_concept())?;
        write!(f, "{}", self.dual_concept())
    }
}

/// Mean of each value column, ignoring missing cells.
fn column_means(rows: &[TableRow]) -> Vec<Option<f64>> {
    let width = rows.first().map_or(0, |r| r.values.len());
    (0..width)
        .map(|col| {
            let present: Vec<f64> = rows.iter().filter_map(|r| r.values[col]).collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

/// Plain-text table, values rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub title: String,
    pub label_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ScoreTable {
    /// Row with the given first label.
    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.rows
            .iter()
            .find(|r| r.labels.first().map(String::as_str) == Some(label))
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                r.labels
                    .iter()
                    .cloned()
                    .chain(r.values.iter().map(|v| match v {
                        Some(v) => format!("{:.1}", v),
                        None => "-".to_string(),
                    }))
                    .collect()
            })
            .collect();
        let header: Vec<&String> = self
            .label_columns
            .iter()
            .chain(self.value_columns.iter())
            .collect();
        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i).map(String::len))
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let labels = self.label_columns.len();

        writeln!(f, "{}", self.title)?;
        let head: Vec<String> = header
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (h, w))| {
                if i < labels {
                    format!("{:<w$}", h, w = *w)
                } else {
                    format!("{:>w$}", h, w = *w)
                }
            })
            .collect();
        writeln!(f, "{}", head.join("  ").trim_end())?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (c, w))| {
                    if i < labels {
                        format!("{:<w$}", c, w = *w)
                    } else {
                        format!("{:>w$}", c, w = *w)
                    }
                })
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}
