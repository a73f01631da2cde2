use crate::error::{Result, RuntimeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Units run on the calling thread in enumeration order.
    Sequential,
    /// Units are pulled from a weighted queue by a pool of workers.
    Concurrent,
}

/// What a task's weight is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMetric {
    Blocks,
    Instructions,
}

impl WeightMetric {
    /// Unit name used when printing task sizes.
    pub fn unit(&self) -> &'static str {
        match self {
            WeightMetric::Blocks => "BBs",
            WeightMetric::Instructions => "instructions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: ExecutionMode,
    /// Worker count for concurrent mode; 0 means one per logical CPU.
    pub threads: usize,
    pub collect_stats: bool,
    pub weight: WeightMetric,
    /// Repetitions per function when recording a timing table.
    pub runs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Concurrent,
            threads: DEFAULT_THREADS,
            collect_stats: false,
            weight: WeightMetric::Blocks,
            runs: 1,
        }
    }
}

impl AnalysisConfig {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            ..Self::default()
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RuntimeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// The number of workers that will actually be spawned.
    pub fn worker_count(&self) -> usize {
        match self.threads {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mode": "sequential", "weight": "instructions" }}"#).unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert_eq!(config.weight, WeightMetric::Instructions);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.runs, 1);
    }

    #[test]
    fn test_zero_threads_uses_every_cpu() {
        let config = AnalysisConfig {
            threads: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.worker_count(), num_cpus::get().max(1));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mode": "eventually" }}"#).unwrap();

        assert!(matches!(
            AnalysisConfig::from_file(file.path()),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/cfaslice.json"),
            Err(RuntimeError::ConfigIo { .. })
        ));
    }
}
