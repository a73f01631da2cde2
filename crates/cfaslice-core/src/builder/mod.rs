/*! Fluent API for constructing modules programmatically.
 *
 * Front ends and tests describe a program through these builders instead of wiring arenas by
 * hand. Handles are allocated in creation order, and the def-use and control-flow relations are
 * derived once when the module is finished.
 */

pub mod block_builder;
pub mod function_builder;

pub use block_builder::BlockBuilder;
pub use function_builder::FunctionBuilder;

use crate::{
    block::BasicBlock,
    function::{Function, FunctionId},
    module::Module,
    types::Type,
    values::{Constant, GlobalVariable, ValueData, ValueId, ValueKind},
    IrError, Result,
};
use std::collections::HashSet;

pub struct ModuleBuilder {
    name: String,
    values: Vec<ValueData>,
    blocks: Vec<BasicBlock>,
    functions: Vec<Function>,
    globals: Vec<ValueId>,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
            blocks: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub(crate) fn push_value(&mut self, name: Option<String>, ty: Type, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData { name, ty, kind });
        id
    }

    /// Adds a function without a body. Call [`ModuleBuilder::define`] later to
    /// give it one, which allows forward references between functions.
    pub fn declare_function(&mut self, name: &str, params: Vec<Type>, ret: Type) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        let value = self.push_value(Some(name.to_string()), Type::Ptr, ValueKind::Function(id));
        let mut function = Function::new(id, name, value, ret);
        for (index, ty) in params.into_iter().enumerate() {
            let arg = self.push_value(
                None,
                ty,
                ValueKind::Argument {
                    function: id,
                    index: index as u32,
                },
            );
            function.params.push(arg);
        }
        self.functions.push(function);
        id
    }

    pub fn function(&mut self, name: &str, params: Vec<Type>, ret: Type) -> FunctionBuilder<'_> {
        let id = self.declare_function(name, params, ret);
        self.define(id)
    }

    pub fn define(&mut self, id: FunctionId) -> FunctionBuilder<'_> {
        FunctionBuilder::new(self, id)
    }

    pub fn function_value(&self, id: FunctionId) -> ValueId {
        self.functions[id.index()].value
    }

    pub fn param(&self, function: FunctionId, index: usize) -> ValueId {
        self.functions[function.index()].params[index]
    }

    pub fn global(&mut self, name: &str, initializer: Option<ValueId>) -> ValueId {
        let id = self.push_value(
            Some(name.to_string()),
            Type::Ptr,
            ValueKind::Global(GlobalVariable {
                initializer,
                is_constant: false,
            }),
        );
        self.globals.push(id);
        id
    }

    pub fn const_null(&mut self) -> ValueId {
        self.push_value(None, Type::Ptr, ValueKind::Constant(Constant::Null))
    }

    pub fn const_int(&mut self, value: i64, bits: u16) -> ValueId {
        self.push_value(None, Type::Int(bits), ValueKind::Constant(Constant::Int(value)))
    }

    pub fn undef(&mut self, ty: Type) -> ValueId {
        self.push_value(None, ty, ValueKind::Constant(Constant::Undef))
    }

    pub fn set_name(&mut self, value: ValueId, name: &str) {
        self.values[value.index()].name = Some(name.to_string());
    }

    pub(crate) fn value_type(&self, value: ValueId) -> Option<&Type> {
        self.values.get(value.index()).map(|data| &data.ty)
    }

    pub(crate) fn callee_return_type(&self, callee: ValueId) -> Option<Type> {
        match self.values.get(callee.index()).map(|data| &data.kind) {
            Some(ValueKind::Function(id)) => Some(self.functions[id.index()].return_type.clone()),
            _ => None,
        }
    }

    pub fn build(self) -> Result<Module> {
        let mut seen = HashSet::new();
        for function in &self.functions {
            if !seen.insert(function.name.as_str()) {
                return Err(IrError::BuilderError(format!(
                    "Function @{} already exists",
                    function.name
                )));
            }

            for &block in &function.blocks {
                let block = &self.blocks[block.index()];
                let is_terminator = |v: &ValueId| match &self.values[v.index()].kind {
                    ValueKind::Instruction { inst, .. } => inst.is_terminator(),
                    _ => false,
                };
                let Some((last, body)) = block.instructions.split_last() else {
                    return Err(IrError::BuilderError(format!(
                        "Block {} in @{} is empty",
                        block.label(),
                        function.name
                    )));
                };
                if !is_terminator(last) || body.iter().any(is_terminator) {
                    return Err(IrError::BuilderError(format!(
                        "Block {} in @{} must end with exactly one terminator",
                        block.label(),
                        function.name
                    )));
                }
            }
        }

        Module::from_parts(
            self.name,
            self.values,
            self.blocks,
            self.functions,
            self.globals,
        )
    }
}
