use crate::block::{BasicBlock, BlockId};
use crate::function::{Function, FunctionId};
use crate::instructions::Instruction;
use crate::types::Type;
use crate::values::{ValueData, ValueId, ValueKind};
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};

/// An in-memory program image.
///
/// Values, blocks and functions live in arenas addressed by [`ValueId`],
/// [`BlockId`] and [`FunctionId`]. The def-use relation (users) and the
/// control-flow relation (predecessors) are derived from the arenas by
/// [`Module::link`] and are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    values: Vec<ValueData>,
    blocks: Vec<BasicBlock>,
    functions: Vec<Function>,
    globals: Vec<ValueId>,
    #[serde(skip)]
    relations: Relations,
}

#[derive(Debug, Clone, Default)]
struct Relations {
    users: Vec<Vec<ValueId>>,
    predecessors: Vec<Vec<BlockId>>,
}

impl Module {
    pub(crate) fn from_parts(
        name: String,
        values: Vec<ValueData>,
        blocks: Vec<BasicBlock>,
        functions: Vec<Function>,
        globals: Vec<ValueId>,
    ) -> Result<Self> {
        let mut module = Self {
            name,
            values,
            blocks,
            functions,
            globals,
            relations: Relations::default(),
        };
        module.link()?;
        Ok(module)
    }

    /// Checks that every handle stored in the arenas is in range, then
    /// recomputes users and predecessors.
    pub fn link(&mut self) -> Result<()> {
        self.validate()?;

        let mut users: Vec<Vec<ValueId>> = vec![Vec::new(); self.values.len()];
        for (idx, data) in self.values.iter().enumerate() {
            let user = ValueId(idx as u32);
            match &data.kind {
                ValueKind::Instruction { inst, .. } => {
                    for op in inst.operands() {
                        let list = &mut users[op.index()];
                        if list.last() != Some(&user) {
                            list.push(user);
                        }
                    }
                }
                ValueKind::Global(global) => {
                    if let Some(init) = global.initializer {
                        users[init.index()].push(user);
                    }
                }
                _ => {}
            }
        }

        let mut predecessors: Vec<Vec<BlockId>> = vec![Vec::new(); self.blocks.len()];
        for block in &self.blocks {
            if let Some(term) = self.terminator(block.id) {
                if let Some(inst) = self.instruction(term) {
                    for succ in inst.successors() {
                        let list = &mut predecessors[succ.index()];
                        if !list.contains(&block.id) {
                            list.push(block.id);
                        }
                    }
                }
            }
        }

        self.relations = Relations {
            users,
            predecessors,
        };
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let value_ok = |v: ValueId| v.index() < self.values.len();
        let block_ok = |b: BlockId| b.index() < self.blocks.len();
        let function_ok = |f: FunctionId| f.index() < self.functions.len();

        for (idx, data) in self.values.iter().enumerate() {
            let ok = match &data.kind {
                ValueKind::Function(f) => function_ok(*f),
                ValueKind::Argument { function, .. } => function_ok(*function),
                ValueKind::Global(global) => global.initializer.map_or(true, value_ok),
                ValueKind::Constant(_) => true,
                ValueKind::Instruction { block, inst } => {
                    let phi_blocks_ok = match inst {
                        Instruction::Phi { incoming } => {
                            incoming.iter().all(|(_, pred)| block_ok(*pred))
                        }
                        _ => true,
                    };
                    block_ok(*block)
                        && phi_blocks_ok
                        && inst.operands().into_iter().all(value_ok)
                        && inst.successors().into_iter().all(block_ok)
                }
            };
            if !ok {
                return Err(IrError::InvalidModule(format!(
                    "value v{} refers to a missing entity",
                    idx
                )));
            }
        }

        for (idx, block) in self.blocks.iter().enumerate() {
            if block.id.index() != idx || !function_ok(block.function) {
                return Err(IrError::InvalidModule(format!(
                    "block bb{} is misnumbered or has no owner",
                    idx
                )));
            }
            for &inst in &block.instructions {
                let owned = value_ok(inst)
                    && matches!(
                        &self.values[inst.index()].kind,
                        ValueKind::Instruction { block: owner, .. } if *owner == block.id
                    );
                if !owned {
                    return Err(IrError::InvalidModule(format!(
                        "block bb{} lists {} which it does not own",
                        idx, inst
                    )));
                }
            }
        }

        for (idx, function) in self.functions.iter().enumerate() {
            let ok = function.id.index() == idx
                && value_ok(function.value)
                && function.params.iter().copied().all(value_ok)
                && function.blocks.iter().copied().all(block_ok);
            if !ok {
                return Err(IrError::InvalidModule(format!(
                    "function @{} refers to a missing entity",
                    function.name
                )));
            }
        }

        if let Some(bad) = self.globals.iter().find(|g| !value_ok(**g)) {
            return Err(IrError::InvalidModule(format!(
                "global {} is out of range",
                bad
            )));
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> {
        (0..self.values.len() as u32).map(ValueId)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this module.
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub fn get_value(&self, id: ValueId) -> Option<&ValueData> {
        self.values.get(id.index())
    }

    pub fn kind(&self, id: ValueId) -> &ValueKind {
        &self.value(id).kind
    }

    pub fn ty(&self, id: ValueId) -> &Type {
        &self.value(id).ty
    }

    pub fn value_name(&self, id: ValueId) -> Option<&str> {
        self.value(id).name.as_deref()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn require_function(&self, name: &str) -> Result<&Function> {
        self.function_by_name(name)
            .ok_or_else(|| IrError::FunctionNotFound(name.to_string()))
    }

    pub fn globals(&self) -> &[ValueId] {
        &self.globals
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_instruction(&self, id: ValueId) -> bool {
        self.kind(id).is_instruction()
    }

    pub fn instruction(&self, id: ValueId) -> Option<&Instruction> {
        self.kind(id).as_instruction()
    }

    pub fn block_of(&self, id: ValueId) -> Option<BlockId> {
        match self.kind(id) {
            ValueKind::Instruction { block, .. } => Some(*block),
            _ => None,
        }
    }

    /// The function an instruction or argument belongs to.
    pub fn function_of(&self, id: ValueId) -> Option<FunctionId> {
        match self.kind(id) {
            ValueKind::Instruction { block, .. } => Some(self.block(*block).function),
            ValueKind::Argument { function, .. } => Some(*function),
            _ => None,
        }
    }

    pub fn users(&self, id: ValueId) -> &[ValueId] {
        self.relations
            .users
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        self.relations
            .predecessors
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The block's last instruction, when it is a terminator.
    pub fn terminator(&self, id: BlockId) -> Option<ValueId> {
        let last = *self.block(id).instructions.last()?;
        self.instruction(last)
            .filter(|inst| inst.is_terminator())
            .map(|_| last)
    }

    /// The statically named callee of a call instruction, if any.
    pub fn direct_callee(&self, call: ValueId) -> Option<FunctionId> {
        match self.instruction(call)? {
            Instruction::Call { callee, .. } => self.kind(*callee).as_function(),
            _ => None,
        }
    }

    /// Like [`Module::direct_callee`], restricted to callees with a body.
    pub fn defined_callee(&self, call: ValueId) -> Option<FunctionId> {
        self.direct_callee(call)
            .filter(|f| !self.function(*f).is_declaration())
    }

    pub fn instructions(&self, function: FunctionId) -> impl Iterator<Item = ValueId> + '_ {
        self.function(function)
            .blocks
            .iter()
            .flat_map(move |b| self.block(*b).instructions.iter().copied())
    }

    pub fn instruction_count(&self, function: FunctionId) -> usize {
        self.function(function)
            .blocks
            .iter()
            .map(|b| self.block(*b).len())
            .sum()
    }

    pub fn return_instructions(&self, function: FunctionId) -> Vec<ValueId> {
        self.instructions(function)
            .filter(|v| matches!(self.instruction(*v), Some(Instruction::Return { .. })))
            .collect()
    }

    /// Looks a parameter or instruction of `function` up by name.
    pub fn find_value(&self, function: FunctionId, name: &str) -> Option<ValueId> {
        let name = name.trim_start_matches('%');
        self.function(function)
            .params
            .iter()
            .copied()
            .chain(self.instructions(function))
            .find(|v| self.value_name(*v) == Some(name))
    }

    pub fn require_value(&self, function: FunctionId, name: &str) -> Result<ValueId> {
        self.find_value(function, name).ok_or_else(|| {
            IrError::ValueNotFound(format!("%{} in @{}", name, self.function(function).name))
        })
    }
}
