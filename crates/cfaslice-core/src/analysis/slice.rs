//! Instruction-level backward and forward slicing.
//!
//! Both directions are breadth-first closures over a worklist. A value enters
//! the slice at most once, which bounds the work by the number of values and
//! makes cyclic def-use graphs terminate.

use crate::{
    function::FunctionId,
    instructions::Instruction,
    module::Module,
    values::{ValueId, ValueKind},
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliceSet {
    values: IndexSet<ValueId>,
}

impl SliceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: ValueId) -> bool {
        self.values.insert(value)
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.values.contains(&value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Members in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.values.iter().copied()
    }

    pub fn extend_from(&mut self, other: &SliceSet) {
        self.values.extend(other.values.iter().copied());
    }
}

/// How a seed is sliced when a whole function is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedKind {
    /// Backward and forward: how an address is derived and where it goes.
    Composite,
    /// Forward only: what happens to a slot or a parameter.
    Forward,
}

struct Worklist {
    slice: SliceSet,
    queue: VecDeque<ValueId>,
}

impl Worklist {
    fn seeded(seed: ValueId) -> Self {
        let mut slice = SliceSet::new();
        slice.insert(seed);
        Self {
            slice,
            queue: VecDeque::from([seed]),
        }
    }

    fn add(&mut self, value: ValueId) {
        if self.slice.insert(value) {
            self.queue.push_back(value);
        }
    }

    fn add_instruction(&mut self, module: &Module, value: ValueId) {
        if module.is_instruction(value) {
            self.add(value);
        }
    }

    fn pop(&mut self) -> Option<ValueId> {
        self.queue.pop_front()
    }
}

/// Everything `seed` depends on through operands, phi edges, control
/// dependence on predecessor terminators, and a coarse step into the bodies
/// of directly called functions.
pub fn backward_slice(module: &Module, seed: ValueId) -> SliceSet {
    let mut work = Worklist::seeded(seed);

    while let Some(value) = work.pop() {
        let (Some(inst), Some(block)) = (module.instruction(value), module.block_of(value)) else {
            continue;
        };

        match inst {
            Instruction::Phi { incoming } => {
                for &(incoming_value, pred) in incoming {
                    work.add_instruction(module, incoming_value);
                    if let Some(term) = module.terminator(pred) {
                        work.add(term);
                    }
                }
                continue;
            }
            Instruction::Select {
                true_value,
                false_value,
                ..
            } => {
                work.add_instruction(module, *true_value);
                work.add_instruction(module, *false_value);
            }
            Instruction::Cast { value: src, .. } => work.add_instruction(module, *src),
            Instruction::Call { args, .. } => match module.defined_callee(value) {
                Some(callee) => {
                    let callee = module.function(callee);
                    for param in callee.params.iter().take(args.len()) {
                        work.add(*param);
                    }
                    if !callee.returns_void() {
                        for ret in module.return_instructions(callee.id) {
                            work.add(ret);
                        }
                    }
                }
                None => {
                    for op in inst.operands() {
                        work.add_instruction(module, op);
                    }
                }
            },
            _ => {
                for op in inst.operands() {
                    work.add_instruction(module, op);
                }
            }
        }

        for &pred in module.predecessors(block) {
            if let Some(term) = module.terminator(pred) {
                work.add(term);
            }
        }
    }

    work.slice
}

/// Every value reachable from `seed` through users.
pub fn forward_slice(module: &Module, seed: ValueId) -> SliceSet {
    let mut work = Worklist::seeded(seed);
    while let Some(value) = work.pop() {
        for &user in module.users(value) {
            work.add(user);
        }
    }
    work.slice
}

/// The seeding policy for whole-function slicing.
pub fn seed_kind(module: &Module, value: ValueId) -> Option<SeedKind> {
    if matches!(module.kind(value), ValueKind::Argument { .. }) {
        return Some(SeedKind::Forward);
    }
    match module.instruction(value)? {
        Instruction::GetElementPtr { .. } => Some(SeedKind::Composite),
        Instruction::Alloca { .. } => Some(SeedKind::Forward),
        _ => None,
    }
}

/// Seeds of `function`: address computations and slots in layout order,
/// followed by the formal parameters.
pub fn function_seeds(module: &Module, function: FunctionId) -> Vec<(ValueId, SeedKind)> {
    module
        .instructions(function)
        .filter_map(|inst| seed_kind(module, inst).map(|kind| (inst, kind)))
        .chain(
            module
                .function(function)
                .params
                .iter()
                .map(|param| (*param, SeedKind::Forward)),
        )
        .collect()
}

pub fn slice_seed(module: &Module, seed: ValueId, kind: SeedKind) -> SliceSet {
    match kind {
        SeedKind::Composite => {
            let mut slice = backward_slice(module, seed);
            slice.extend_from(&forward_slice(module, seed));
            slice
        }
        SeedKind::Forward => forward_slice(module, seed),
    }
}

/// Slices every seed of `function`, each with its own slice set.
pub fn slice_function(module: &Module, function: FunctionId) -> Vec<(ValueId, SliceSet)> {
    function_seeds(module, function)
        .into_iter()
        .map(|(seed, kind)| (seed, slice_seed(module, seed, kind)))
        .collect()
}
