//! Per-function timing table.

use crate::error::Result;
use cfaslice_core::{FunctionId, Module, PointsToAnalysis};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

pub const TIMING_HEADER: [&str; 4] = ["name", "size", "inum", "time(us)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTiming {
    pub name: String,
    /// Block count.
    pub size: usize,
    /// Instruction count.
    pub inum: usize,
    #[serde(rename = "time(us)")]
    pub time_us: u64,
}

impl FunctionTiming {
    pub fn new(module: &Module, function: FunctionId, mean: Duration) -> Self {
        let f = module.function(function);
        Self {
            name: f.name.clone(),
            size: f.block_count(),
            inum: module.instruction_count(function),
            time_us: mean.as_micros() as u64,
        }
    }
}

/// Analyzes `function` `runs` times, clearing all state between runs, and
/// returns the last run's analysis together with the mean run time.
pub fn timed_runs<'m>(
    module: &'m Module,
    function: FunctionId,
    runs: usize,
) -> (PointsToAnalysis<'m>, Duration) {
    let runs = runs.max(1);
    let mut analysis = PointsToAnalysis::new(module);
    let mut total = Duration::ZERO;
    for _ in 0..runs {
        analysis.reset();
        let start = Instant::now();
        analysis.analyze_function(function);
        total += start.elapsed();
    }
    (analysis, mean(total, runs))
}

fn mean(total: Duration, runs: usize) -> Duration {
    total.div_f64(runs as f64)
}

pub fn write_timings(path: impl AsRef<Path>, rows: &[FunctionTiming]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    writer.write_record(TIMING_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    tracing::debug!(path = %path.as_ref().display(), rows = rows.len(), "wrote timing table");
    Ok(())
}
