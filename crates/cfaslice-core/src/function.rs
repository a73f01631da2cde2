use crate::block::BlockId;
use crate::types::Type;
use crate::values::ValueId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u32);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    /// The function as an operand, e.g. the callee of a direct call.
    pub value: ValueId,
    pub params: Vec<ValueId>,
    pub return_type: Type,
    /// Blocks in layout order; the first one is the entry block.
    pub blocks: Vec<BlockId>,
}

impl Function {
    pub fn new(id: FunctionId, name: impl Into<String>, value: ValueId, return_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            value,
            params: Vec::new(),
            return_type,
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A function without a body is external to the module.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }
}
