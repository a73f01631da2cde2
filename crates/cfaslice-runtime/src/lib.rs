/*! Scheduling and sessions for the cfaslice engines.
 *
 * The engines in `cfaslice-core` analyze one function or one seed at a time with private state.
 * This crate enumerates those units for a whole module, weighs them, runs them on a bounded
 * worker pool and collects results and per-worker statistics.
 */

pub mod config;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod tasks;
pub mod timing;

pub use config::{AnalysisConfig, ExecutionMode, WeightMetric};
pub use error::{Result, RuntimeError};
pub use scheduler::{ScheduleOutcome, Scheduler, Task, TaskResult};
pub use session::{
    run_points_to, run_points_to_entry, run_slicing, slice_point, PointsToReport, SeedSlice,
    SliceReport,
};
pub use stats::{Moments, WorkerStats};
pub use tasks::{function_weight, points_to_tasks, slice_tasks, SliceSeed};
pub use timing::{write_timings, FunctionTiming};
