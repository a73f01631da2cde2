/*! Core IR model and analysis engines.
 *
 * Resolving indirect calls and slicing programs both need the same view of a program: values
 * with stable identities, def-use edges and control-flow edges. This crate provides that model,
 * a builder and a JSON program image for it, and the two engines that run over it: a
 * flow-insensitive points-to analysis and an instruction-level slicer.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod ir_persist;
pub mod module;
pub mod types;
pub mod values;

pub use analysis::{
    backward_slice, forward_slice, CallTargetMap, PointsToAnalysis, PointsToSet, SeedKind,
    SliceSet,
};
pub use block::{BasicBlock, BlockId};
pub use builder::{BlockBuilder, FunctionBuilder, ModuleBuilder};
pub use function::{Function, FunctionId};
pub use instructions::Instruction;
pub use ir_persist::{load_module, save_module};
pub use module::Module;
pub use types::Type;
pub use values::{Constant, ValueId, ValueKind};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed program image: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid module: {0}")]
    InvalidModule(String),
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Value not found: {0}")]
    ValueNotFound(String),
    #[error("Builder error: {0}")]
    BuilderError(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
