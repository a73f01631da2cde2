/*! Unified interface for indirect call resolution and program slicing.
 *
 * Single import for everything you need: building or loading a program image, running the
 * points-to and slicing engines on it, and scheduling them over a whole module.
 */

pub use cfaslice_core as core;
pub use cfaslice_runtime as runtime;

pub use cfaslice_core::{
    analysis::{analyze_function, backward_slice, forward_slice, slice_function},
    block::{BasicBlock, BlockId},
    function::{Function, FunctionId},
    instructions::Instruction,
    types::Type,
    values::{ValueId, ValueKind},
    load_module, save_module, CallTargetMap, IrError, Module, ModuleBuilder, PointsToAnalysis,
    PointsToSet, SeedKind, SliceSet,
};

pub use cfaslice_runtime::{
    run_points_to, run_slicing, AnalysisConfig, ExecutionMode, RuntimeError, Scheduler,
};
