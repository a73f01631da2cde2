//! Enumeration of analysis units.

use crate::config::WeightMetric;
use crate::scheduler::Task;
use cfaslice_core::{analysis::function_seeds, FunctionId, Module, SeedKind, ValueId};
use serde::{Deserialize, Serialize};

pub fn function_weight(module: &Module, function: FunctionId, metric: WeightMetric) -> usize {
    match metric {
        WeightMetric::Blocks => module.function(function).block_count(),
        WeightMetric::Instructions => module.instruction_count(function),
    }
}

/// One task per function with a body, indexed by the function's position in
/// the module.
pub fn points_to_tasks(module: &Module, metric: WeightMetric) -> Vec<Task<FunctionId>> {
    module
        .functions()
        .filter(|f| !f.is_declaration())
        .map(|f| Task {
            index: f.id.index(),
            weight: function_weight(module, f.id, metric),
            payload: f.id,
        })
        .collect()
}

/// Restricts [`points_to_tasks`] to the given functions.
pub fn points_to_tasks_for(
    module: &Module,
    functions: &[FunctionId],
    metric: WeightMetric,
) -> Vec<Task<FunctionId>> {
    points_to_tasks(module, metric)
        .into_iter()
        .filter(|task| functions.contains(&task.payload))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSeed {
    pub function: FunctionId,
    pub value: ValueId,
    pub kind: SeedKind,
}

/// One task per seed of every function with a body. Seeds inherit the
/// weight of their function and are indexed in enumeration order.
pub fn slice_tasks(module: &Module, metric: WeightMetric) -> Vec<Task<SliceSeed>> {
    module
        .functions()
        .filter(|f| !f.is_declaration())
        .flat_map(|f| {
            let weight = function_weight(module, f.id, metric);
            function_seeds(module, f.id)
                .into_iter()
                .map(move |(value, kind)| (weight, f.id, value, kind))
        })
        .enumerate()
        .map(|(index, (weight, function, value, kind))| Task {
            index,
            weight,
            payload: SliceSeed {
                function,
                value,
                kind,
            },
        })
        .collect()
}
