use super::{BlockBuilder, ModuleBuilder};
use crate::{
    block::{BasicBlock, BlockId},
    function::FunctionId,
    instructions::Instruction,
    types::Type,
    values::{ValueId, ValueKind},
    IrError, Result,
};

pub struct FunctionBuilder<'a> {
    module: &'a mut ModuleBuilder,
    function: FunctionId,
}

impl<'a> FunctionBuilder<'a> {
    pub(crate) fn new(module: &'a mut ModuleBuilder, function: FunctionId) -> Self {
        Self { module, function }
    }

    pub fn id(&self) -> FunctionId {
        self.function
    }

    pub fn value(&self) -> ValueId {
        self.module.function_value(self.function)
    }

    pub fn param(&self, index: usize) -> ValueId {
        self.module.param(self.function, index)
    }

    pub fn name_param(&mut self, index: usize, name: &str) -> ValueId {
        let param = self.param(index);
        self.module.set_name(param, name);
        param
    }

    /// Appends a new block to the function's layout.
    pub fn block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.module.blocks.len() as u32);
        self.module
            .blocks
            .push(BasicBlock::new(id, self.function).with_name(name));
        self.module.functions[self.function.index()].blocks.push(id);
        id
    }

    pub fn at(&mut self, block: BlockId) -> BlockBuilder<'_> {
        BlockBuilder::new(self.module, block)
    }

    pub fn module(&mut self) -> &mut ModuleBuilder {
        self.module
    }

    pub fn const_null(&mut self) -> ValueId {
        self.module.const_null()
    }

    pub fn const_int(&mut self, value: i64, bits: u16) -> ValueId {
        self.module.const_int(value, bits)
    }

    pub fn undef(&mut self, ty: Type) -> ValueId {
        self.module.undef(ty)
    }

    pub fn set_name(&mut self, value: ValueId, name: &str) {
        self.module.set_name(value, name);
    }

    /// Adds an edge to a phi created before its incoming value existed,
    /// which is how loop-carried values are wired.
    pub fn add_incoming(&mut self, phi: ValueId, value: ValueId, block: BlockId) -> Result<()> {
        match self.module.values.get_mut(phi.index()).map(|data| &mut data.kind) {
            Some(ValueKind::Instruction {
                inst: Instruction::Phi { incoming },
                ..
            }) => {
                incoming.push((value, block));
                Ok(())
            }
            _ => Err(IrError::BuilderError(format!("{} is not a phi", phi))),
        }
    }

    pub fn finish(self) -> FunctionId {
        self.function
    }
}
