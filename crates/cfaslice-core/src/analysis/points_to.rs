//! Intraprocedural, flow-insensitive points-to analysis (0-CFA) used to
//! resolve the targets of indirect calls.
//!
//! A value's points-to set holds the "origin" values it may refer to at run
//! time. Atomic values (functions, arguments, constants, unhandled
//! instructions) originate themselves; derived values inherit and merge the
//! sets of the values they are computed from. Loads additionally pick up
//! whatever was stored through the same pointer in the same function, which is
//! how a function pointer parked in a local slot is recovered.

use crate::{
    function::FunctionId,
    instructions::Instruction,
    module::Module,
    values::{ValueId, ValueKind},
};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointsToSet {
    origins: IndexSet<ValueId>,
}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(value: ValueId) -> Self {
        let mut set = Self::new();
        set.insert(value);
        set
    }

    pub fn insert(&mut self, value: ValueId) -> bool {
        self.origins.insert(value)
    }

    /// Unions `other` into `self`, returning whether anything was added.
    pub fn union_with(&mut self, other: &PointsToSet) -> bool {
        let before = self.origins.len();
        self.origins.extend(other.origins.iter().copied());
        self.origins.len() != before
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.origins.contains(&value)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.origins.iter().copied()
    }

    pub fn is_subset(&self, other: &PointsToSet) -> bool {
        self.origins.is_subset(&other.origins)
    }
}

impl FromIterator<ValueId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = ValueId>>(iter: I) -> Self {
        Self {
            origins: iter.into_iter().collect(),
        }
    }
}

/// Resolved callee sets keyed by call instruction, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallTargetMap {
    targets: IndexMap<ValueId, PointsToSet>,
}

impl CallTargetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: ValueId, targets: PointsToSet) {
        self.targets.insert(call, targets);
    }

    pub fn get(&self, call: ValueId) -> Option<&PointsToSet> {
        self.targets.get(&call)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &PointsToSet)> + '_ {
        self.targets.iter().map(|(call, set)| (*call, set))
    }

    /// Folds another unit's results in. Entries for the same call are
    /// unioned, so merging never loses targets.
    pub fn merge(&mut self, other: CallTargetMap) {
        for (call, set) in other.targets {
            self.targets.entry(call).or_default().union_with(&set);
        }
    }

    /// Calls that are not direct calls to a function with a body.
    pub fn indirect<'a>(
        &'a self,
        module: &'a Module,
    ) -> impl Iterator<Item = (ValueId, &'a PointsToSet)> + 'a {
        self.iter()
            .filter(move |(call, _)| module.defined_callee(*call).is_none())
    }

    /// Orders entries by call handle so that maps built in different orders
    /// compare and print identically.
    pub fn sort(&mut self) {
        self.targets.sort_keys();
    }
}

/// One pending step of the traversal: `value` waits for `deps[next..]`.
struct Frame {
    value: ValueId,
    deps: Vec<ValueId>,
    next: usize,
}

/// Run-scoped state of one analysis unit. Build one per function (or per
/// worker and [`reset`](PointsToAnalysis::reset) between units); nothing is
/// shared between instances.
pub struct PointsToAnalysis<'m> {
    module: &'m Module,
    points_to: HashMap<ValueId, PointsToSet>,
    visited: HashSet<ValueId>,
    call_targets: CallTargetMap,
}

impl<'m> PointsToAnalysis<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            points_to: HashMap::new(),
            visited: HashSet::new(),
            call_targets: CallTargetMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.points_to.clear();
        self.visited.clear();
        self.call_targets = CallTargetMap::new();
    }

    /// Resolves the callee of every call in `function`, in layout order.
    pub fn analyze_function(&mut self, function: FunctionId) {
        let module = self.module;
        for inst in module.instructions(function) {
            let Some(Instruction::Call { callee, .. }) = module.instruction(inst) else {
                continue;
            };
            let targets = match module.defined_callee(inst) {
                Some(target) => PointsToSet::singleton(module.function(target).value),
                None => self.resolve(*callee).clone(),
            };
            trace!(call = %inst, targets = targets.len(), "resolved call");
            self.call_targets.insert(inst, targets);
        }
    }

    pub fn call_targets(&self) -> &CallTargetMap {
        &self.call_targets
    }

    pub fn into_call_targets(self) -> CallTargetMap {
        self.call_targets
    }

    /// The set computed for `value` so far, if it has been reached.
    pub fn points_to(&self, value: ValueId) -> Option<&PointsToSet> {
        self.points_to.get(&value)
    }

    pub fn resolved_count(&self) -> usize {
        self.points_to.len()
    }

    /// Computes the points-to set of `value` and everything it depends on.
    ///
    /// Values are marked visited before their dependencies are explored, so a
    /// dependency that is still in progress (a loop-carried phi) contributes
    /// whatever its set holds at that moment instead of being re-entered.
    /// Once the traversal is done, every value it finished is re-absorbed
    /// until nothing changes, so members of a cycle end up with the same
    /// origins whichever edge was explored first.
    pub fn resolve(&mut self, value: ValueId) -> &PointsToSet {
        if !self.visited.contains(&value) {
            let mut finished = Vec::new();
            let mut stack = vec![self.enter(value)];
            loop {
                let Some(frame) = stack.last_mut() else {
                    break;
                };
                if let Some(&dep) = frame.deps.get(frame.next) {
                    if self.visited.contains(&dep) {
                        let target = frame.value;
                        frame.next += 1;
                        self.absorb(target, dep);
                    } else {
                        let child = self.enter(dep);
                        stack.push(child);
                    }
                    continue;
                }

                let Some(done) = stack.pop() else {
                    break;
                };
                if let Some(parent) = stack.last_mut() {
                    parent.next += 1;
                    let target = parent.value;
                    self.absorb(target, done.value);
                }
                finished.push(done);
            }
            self.settle(&finished);
        }

        self.points_to.entry(value).or_default()
    }

    fn enter(&mut self, value: ValueId) -> Frame {
        self.visited.insert(value);
        let module = self.module;

        let (origin_is_self, deps) = match module.kind(value) {
            ValueKind::Function(_) | ValueKind::Argument { .. } => (true, Vec::new()),
            ValueKind::Instruction { inst, .. } => match inst {
                Instruction::Cast { value: src, .. } => (false, vec![*src]),
                Instruction::Phi { incoming } => {
                    (false, incoming.iter().map(|(v, _)| *v).collect())
                }
                Instruction::Select {
                    true_value,
                    false_value,
                    ..
                } => (false, vec![*true_value, *false_value]),
                Instruction::Load { ptr } => {
                    let mut deps = vec![*ptr];
                    let scope = module.function_of(value);
                    deps.extend(self.stored_through(*ptr, |store| {
                        module.function_of(store) == scope
                    }));
                    (false, deps)
                }
                Instruction::GetElementPtr { base, .. } => (false, vec![*base]),
                _ => (true, Vec::new()),
            },
            ValueKind::Global(global) => {
                let mut deps: Vec<ValueId> = global.initializer.into_iter().collect();
                deps.extend(self.stored_through(value, |_| true));
                (true, deps)
            }
            ValueKind::Constant(_) => (true, Vec::new()),
        };

        let seed = if origin_is_self {
            PointsToSet::singleton(value)
        } else {
            PointsToSet::new()
        };
        self.points_to.insert(value, seed);

        Frame {
            value,
            deps,
            next: 0,
        }
    }

    /// Values written by stores whose pointer operand is exactly `ptr`.
    fn stored_through(&self, ptr: ValueId, in_scope: impl Fn(ValueId) -> bool) -> Vec<ValueId> {
        self.module
            .users(ptr)
            .iter()
            .filter_map(|&user| match self.module.instruction(user) {
                Some(Instruction::Store { value, ptr: dest }) if *dest == ptr && in_scope(user) => {
                    Some(*value)
                }
                _ => None,
            })
            .collect()
    }

    fn absorb(&mut self, target: ValueId, source: ValueId) -> bool {
        if target == source {
            return false;
        }
        let Some(incoming) = self.points_to.get(&source).cloned() else {
            return false;
        };
        self.points_to.entry(target).or_default().union_with(&incoming)
    }

    /// Re-absorbs dependencies of `finished` until no set grows.
    fn propagate(&mut self, finished: &[Frame]) {
        let mut changed = true;
        while changed {
            changed = false;
            for frame in finished {
                for &dep in &frame.deps {
                    changed |= self.absorb(frame.value, dep);
                }
            }
        }
    }

    /// Brings the values of one traversal to a fixpoint. A value that is
    /// still empty afterwards only depends on itself through a cycle; it falls
    /// back to itself, in completion order, and the fixpoint is redone so
    /// that its dependents pick the origin up instead of inventing their own.
    fn settle(&mut self, finished: &[Frame]) {
        self.propagate(finished);
        for frame in finished {
            let set = self.points_to.entry(frame.value).or_default();
            if set.is_empty() {
                set.insert(frame.value);
                self.propagate(finished);
            }
            trace!(
                value = %frame.value,
                origins = self.points_to.get(&frame.value).map_or(0, PointsToSet::len),
                "points-to set complete"
            );
        }
    }
}

/// Resolves every call in `function` with fresh run state.
pub fn analyze_function(module: &Module, function: FunctionId) -> CallTargetMap {
    let mut analysis = PointsToAnalysis::new(module);
    analysis.analyze_function(function);
    analysis.into_call_targets()
}
