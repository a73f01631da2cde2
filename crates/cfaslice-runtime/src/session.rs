//! Whole-module analysis sessions.
//!
//! A session turns a module into tasks, runs them through the [`Scheduler`]
//! and folds the per-unit results back together in enumeration order, so the
//! outcome does not depend on which worker finished first.

use crate::config::{AnalysisConfig, ExecutionMode};
use crate::error::Result;
use crate::scheduler::{Scheduler, Task};
use crate::stats::WorkerStats;
use crate::tasks::{points_to_tasks, points_to_tasks_for, slice_tasks, SliceSeed};
use crate::timing::{timed_runs, FunctionTiming};
use cfaslice_core::{
    analysis::{backward_slice, seed_kind, slice_seed},
    CallTargetMap, FunctionId, Module, SliceSet, ValueId,
};
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct PointsToReport {
    pub mode: ExecutionMode,
    pub workers: usize,
    /// Number of functions analyzed.
    pub units: usize,
    pub call_targets: CallTargetMap,
    pub stats: Vec<WorkerStats>,
    /// Filled in sequential mode only.
    pub timings: Vec<FunctionTiming>,
    pub elapsed: Duration,
}

struct UnitOutcome {
    function: FunctionId,
    call_targets: CallTargetMap,
    mean_time: Duration,
}

/// Resolves the calls of every function with a body.
pub fn run_points_to(module: &Module, config: &AnalysisConfig) -> PointsToReport {
    let tasks = points_to_tasks(module, config.weight);
    points_to_session(module, config, tasks)
}

/// Like [`run_points_to`], restricted to the named function.
pub fn run_points_to_entry(
    module: &Module,
    entry: &str,
    config: &AnalysisConfig,
) -> Result<PointsToReport> {
    let function = module.require_function(entry)?.id;
    let tasks = points_to_tasks_for(module, &[function], config.weight);
    Ok(points_to_session(module, config, tasks))
}

fn points_to_session(
    module: &Module,
    config: &AnalysisConfig,
    tasks: Vec<Task<FunctionId>>,
) -> PointsToReport {
    let units = tasks.len();
    let workers = match config.mode {
        ExecutionMode::Sequential => 1,
        ExecutionMode::Concurrent => config.worker_count(),
    };
    let runs = match config.mode {
        ExecutionMode::Sequential => config.run_count(),
        ExecutionMode::Concurrent => 1,
    };
    info!(units, workers, mode = ?config.mode, "points-to session");

    let outcome = Scheduler::with_tasks(workers, tasks).execute(
        config.mode,
        |&function| {
            let (analysis, mean_time) = timed_runs(module, function, runs);
            UnitOutcome {
                function,
                call_targets: analysis.into_call_targets(),
                mean_time,
            }
        },
        |task, _| task.weight,
    );

    let stats = outcome.stats.clone();
    let elapsed = outcome.elapsed;
    let mut call_targets = CallTargetMap::new();
    let mut timings = Vec::new();
    for unit in outcome.values() {
        if config.mode == ExecutionMode::Sequential {
            timings.push(FunctionTiming::new(module, unit.function, unit.mean_time));
        }
        call_targets.merge(unit.call_targets);
    }
    info!(calls = call_targets.len(), elapsed_us = elapsed.as_micros() as u64, "points-to done");

    PointsToReport {
        mode: config.mode,
        workers,
        units,
        call_targets,
        stats,
        timings,
        elapsed,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSlice {
    pub seed: SliceSeed,
    pub slice: SliceSet,
}

#[derive(Debug)]
pub struct SliceReport {
    pub mode: ExecutionMode,
    pub workers: usize,
    /// One slice per seed, in enumeration order.
    pub slices: Vec<SeedSlice>,
    pub stats: Vec<WorkerStats>,
    pub elapsed: Duration,
}

impl SliceReport {
    pub fn total_size(&self) -> usize {
        self.slices.iter().map(|s| s.slice.len()).sum()
    }
}

/// Slices every seed of every function with a body. Statistics record the
/// size of each slice rather than the task weight.
pub fn run_slicing(module: &Module, config: &AnalysisConfig) -> SliceReport {
    let tasks = slice_tasks(module, config.weight);
    let workers = match config.mode {
        ExecutionMode::Sequential => 1,
        ExecutionMode::Concurrent => config.worker_count(),
    };
    info!(seeds = tasks.len(), workers, mode = ?config.mode, "slicing session");

    let outcome = Scheduler::with_tasks(workers, tasks).execute(
        config.mode,
        |seed: &SliceSeed| SeedSlice {
            seed: *seed,
            slice: slice_seed(module, seed.value, seed.kind),
        },
        |_, done| done.slice.len(),
    );

    let stats = outcome.stats.clone();
    let elapsed = outcome.elapsed;
    let slices: Vec<_> = outcome.values().collect();
    info!(seeds = slices.len(), elapsed_us = elapsed.as_micros() as u64, "slicing done");

    SliceReport {
        mode: config.mode,
        workers,
        slices,
        stats,
        elapsed,
    }
}

/// Slices one program point. Seeds follow their usual policy; any other value
/// gets a backward slice. Without a seed name the first return of the
/// function is used.
pub fn slice_point(
    module: &Module,
    function: &str,
    seed: Option<&str>,
) -> Result<(ValueId, SliceSet)> {
    let function = module.require_function(function)?.id;
    let value = match seed {
        Some(name) => module.require_value(function, name)?,
        None => module
            .return_instructions(function)
            .first()
            .copied()
            .ok_or_else(|| {
                cfaslice_core::IrError::ValueNotFound(format!(
                    "return instruction in @{}",
                    module.function(function).name
                ))
            })?,
    };
    let slice = match seed_kind(module, value) {
        Some(kind) => slice_seed(module, value, kind),
        None => backward_slice(module, value),
    };
    Ok((value, slice))
}
