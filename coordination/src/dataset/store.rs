//! Line-delimited JSON sample files.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::sample::Sample;

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize sample: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An ordered collection of samples for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Parse JSONL text. Blank lines are skipped; `path` is used for errors only.
    pub fn parse(text: &str, path: &Path) -> DatasetResult<Self> {
        let mut samples = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let sample = serde_json::from_str(line).map_err(|source| DatasetError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
            samples.push(sample);
        }
        Ok(Self { samples })
    }

    /// Load samples from a JSONL file.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data = Self::parse(&text, path)?;
        debug!(path = %path.display(), samples = data.samples.len(), "Loaded dataset");
        Ok(data)
    }

    /// Render every sample as one JSON line.
    pub fn to_jsonl(&self) -> DatasetResult<String> {
        let mut out = String::new();
        for sample in &self.samples {
            out.push_str(&serde_json::to_string(sample)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Rewrite the whole collection to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> DatasetResult<()> {
        let io_err = |source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let body = self.to_jsonl()?;
        let tmp = path.with_extension("jsonl.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// `<output_dir>/<data stem>/<model>/<prompt_name>.jsonl`
pub fn output_path(output_dir: &Path, data_path: &Path, model: &str, prompt_name: &str) -> PathBuf {
    let task = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    output_dir
        .join(task)
        .join(model)
        .join(format!("{}.jsonl", prompt_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_skips_blank_lines() {
        let text = r#"{"question":"q1","options":["a","b"],"answer":"a"}

{"question":"q2","options":["a","b","c"],"answer":"c"}
"#;
        let data = Dataset::parse(text, Path::new("mem.jsonl")).unwrap();
        assert_eq!(data.samples.len(), 2);
        assert_eq!(data.samples[1].answer, "c");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "{\"question\":\"q\",\"options\":[],\"answer\":\"a\"}\nnot json\n";
        let err = Dataset::parse(text, Path::new("bad.jsonl")).unwrap_err();
        match err {
            DatasetError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_then_load_preserves_outputs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");

        let mut sample = Sample::new("q", vec!["1".into(), "2".into()], "2")
            .with_image_data("data:image/png;base64,SECRET");
        sample.pred = "2".into();
        sample.log_agent_answer("it is 2");
        Dataset::new(vec![sample]).save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("SECRET"));
        assert!(!path.with_extension("jsonl.tmp").exists());

        let loaded = Dataset::load(&path).unwrap();
        assert_eq!(loaded.samples[0].pred, "2");
        assert!(loaded.samples[0].raw_output.contains("agent answer: it is 2"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Dataset::load(Path::new("/definitely/not/here.jsonl")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_output_path_layout() {
        let path = output_path(
            Path::new("outputs_debate"),
            Path::new("data/triangle.jsonl"),
            "gpt-4o",
            "cot_multi_extract",
        );
        assert_eq!(
            path,
            PathBuf::from("outputs_debate/triangle/gpt-4o/cot_multi_extract.jsonl")
        );
    }
}
