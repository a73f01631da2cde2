use super::ModuleBuilder;
use crate::{
    block::BlockId,
    instructions::{BinaryOp, CastOp, ComparePredicate, Instruction},
    types::Type,
    values::{ValueId, ValueKind},
};

/// Appends instructions to the end of one block.
pub struct BlockBuilder<'a> {
    module: &'a mut ModuleBuilder,
    block: BlockId,
}

impl<'a> BlockBuilder<'a> {
    pub(crate) fn new(module: &'a mut ModuleBuilder, block: BlockId) -> Self {
        Self { module, block }
    }

    pub fn block_id(&self) -> BlockId {
        self.block
    }

    fn push_instruction(&mut self, ty: Type, inst: Instruction) -> ValueId {
        let block = self.block;
        let id = self
            .module
            .push_value(None, ty, ValueKind::Instruction { block, inst });
        self.module.blocks[block.index()].instructions.push(id);
        id
    }

    fn type_of(&self, value: ValueId) -> Type {
        self.module.value_type(value).cloned().unwrap_or(Type::Ptr)
    }

    pub fn named(&mut self, value: ValueId, name: &str) -> ValueId {
        self.module.set_name(value, name);
        value
    }

    pub fn cast(&mut self, op: CastOp, value: ValueId, ty: Type) -> ValueId {
        self.push_instruction(ty, Instruction::Cast { op, value })
    }

    pub fn bitcast(&mut self, value: ValueId) -> ValueId {
        self.cast(CastOp::Bitcast, value, Type::Ptr)
    }

    pub fn phi(&mut self, ty: Type, incoming: Vec<(ValueId, BlockId)>) -> ValueId {
        self.push_instruction(ty, Instruction::Phi { incoming })
    }

    pub fn select(&mut self, condition: ValueId, true_value: ValueId, false_value: ValueId) -> ValueId {
        let ty = self.type_of(true_value);
        self.push_instruction(
            ty,
            Instruction::Select {
                condition,
                true_value,
                false_value,
            },
        )
    }

    pub fn load(&mut self, ty: Type, ptr: ValueId) -> ValueId {
        self.push_instruction(ty, Instruction::Load { ptr })
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) -> ValueId {
        self.push_instruction(Type::Void, Instruction::Store { value, ptr })
    }

    /// Direct callees contribute their declared return type; anything else
    /// is assumed to return a pointer.
    pub fn call(&mut self, callee: ValueId, args: Vec<ValueId>) -> ValueId {
        let ty = self.module.callee_return_type(callee).unwrap_or(Type::Ptr);
        self.call_typed(ty, callee, args)
    }

    pub fn call_typed(&mut self, ret: Type, callee: ValueId, args: Vec<ValueId>) -> ValueId {
        self.push_instruction(ret, Instruction::Call { callee, args })
    }

    pub fn gep(&mut self, base: ValueId, indices: Vec<ValueId>) -> ValueId {
        self.push_instruction(Type::Ptr, Instruction::GetElementPtr { base, indices })
    }

    pub fn alloca(&mut self, allocated: Type) -> ValueId {
        self.push_instruction(Type::Ptr, Instruction::Alloca { allocated })
    }

    pub fn binary(&mut self, op: BinaryOp, left: ValueId, right: ValueId) -> ValueId {
        let ty = self.type_of(left);
        self.push_instruction(ty, Instruction::Binary { op, left, right })
    }

    pub fn add(&mut self, left: ValueId, right: ValueId) -> ValueId {
        self.binary(BinaryOp::Add, left, right)
    }

    pub fn compare(&mut self, predicate: ComparePredicate, left: ValueId, right: ValueId) -> ValueId {
        self.push_instruction(
            Type::Int(1),
            Instruction::Compare {
                predicate,
                left,
                right,
            },
        )
    }

    pub fn jump(&mut self, target: BlockId) -> ValueId {
        self.push_instruction(Type::Void, Instruction::Jump { target })
    }

    pub fn branch(&mut self, condition: ValueId, then_block: BlockId, else_block: BlockId) -> ValueId {
        self.push_instruction(
            Type::Void,
            Instruction::Branch {
                condition,
                then_block,
                else_block,
            },
        )
    }

    pub fn ret(&mut self, value: ValueId) -> ValueId {
        self.push_instruction(Type::Void, Instruction::Return { value: Some(value) })
    }

    pub fn ret_void(&mut self) -> ValueId {
        self.push_instruction(Type::Void, Instruction::Return { value: None })
    }

    pub fn unreachable(&mut self) -> ValueId {
        self.push_instruction(Type::Void, Instruction::Unreachable)
    }
}
