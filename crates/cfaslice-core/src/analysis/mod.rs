/*! Resolve indirect calls and slice programs.
 *
 * Both engines keep their state in a value owned by a single unit of work, so independent
 * functions or seeds can be processed on different threads without locking inside the engines.
 */

pub mod points_to;
pub mod slice;

pub use points_to::{analyze_function, CallTargetMap, PointsToAnalysis, PointsToSet};
pub use slice::{
    backward_slice, forward_slice, function_seeds, seed_kind, slice_function, slice_seed,
    SeedKind, SliceSet,
};
