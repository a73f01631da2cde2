use crate::block::BlockId;
use crate::function::FunctionId;
use crate::instructions::Instruction;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Handle to an entry of a module's value arena. Two handles denote the same
/// value exactly when they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueData {
    pub name: Option<String>,
    pub ty: Type,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueKind {
    Function(FunctionId),
    Argument {
        function: FunctionId,
        index: u32,
    },
    Global(GlobalVariable),
    Constant(Constant),
    Instruction {
        block: BlockId,
        inst: Instruction,
    },
}

impl ValueKind {
    pub fn is_instruction(&self) -> bool {
        matches!(self, ValueKind::Instruction { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ValueKind::Constant(_))
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            ValueKind::Instruction { inst, .. } => Some(inst),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FunctionId> {
        match self {
            ValueKind::Function(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&GlobalVariable> {
        match self {
            ValueKind::Global(global) => Some(global),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub initializer: Option<ValueId>,
    pub is_constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Undef,
    Int(i64),
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Undef => write!(f, "undef"),
            Constant::Int(value) => write!(f, "{}", value),
        }
    }
}
