use crate::block::BlockId;
use crate::types::Type;
use crate::values::ValueId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Cast {
        op: CastOp,
        value: ValueId,
    },
    Phi {
        incoming: Vec<(ValueId, BlockId)>,
    },
    Select {
        condition: ValueId,
        true_value: ValueId,
        false_value: ValueId,
    },
    Load {
        ptr: ValueId,
    },
    Store {
        value: ValueId,
        ptr: ValueId,
    },
    Call {
        callee: ValueId,
        args: Vec<ValueId>,
    },
    GetElementPtr {
        base: ValueId,
        indices: Vec<ValueId>,
    },
    Alloca {
        allocated: Type,
    },
    Binary {
        op: BinaryOp,
        left: ValueId,
        right: ValueId,
    },
    Compare {
        predicate: ComparePredicate,
        left: ValueId,
        right: ValueId,
    },

    Jump {
        target: BlockId,
    },
    Branch {
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return {
        value: Option<ValueId>,
    },
    Unreachable,
}

impl Instruction {
    /// Value operands in source order. Phi operands are the incoming values;
    /// block references are not values and never appear here.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Instruction::Cast { value, .. } => vec![*value],
            Instruction::Phi { incoming } => incoming.iter().map(|(value, _)| *value).collect(),
            Instruction::Select {
                condition,
                true_value,
                false_value,
            } => vec![*condition, *true_value, *false_value],
            Instruction::Load { ptr } => vec![*ptr],
            Instruction::Store { value, ptr } => vec![*value, *ptr],
            Instruction::Call { callee, args } => {
                let mut ops = Vec::with_capacity(args.len() + 1);
                ops.extend(args.iter().copied());
                ops.push(*callee);
                ops
            }
            Instruction::GetElementPtr { base, indices } => {
                let mut ops = Vec::with_capacity(indices.len() + 1);
                ops.push(*base);
                ops.extend(indices.iter().copied());
                ops
            }
            Instruction::Binary { left, right, .. } | Instruction::Compare { left, right, .. } => {
                vec![*left, *right]
            }
            Instruction::Branch { condition, .. } => vec![*condition],
            Instruction::Return { value } => value.iter().copied().collect(),
            Instruction::Alloca { .. } | Instruction::Jump { .. } | Instruction::Unreachable => {
                Vec::new()
            }
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. }
                | Instruction::Branch { .. }
                | Instruction::Return { .. }
                | Instruction::Unreachable
        )
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Jump { target } => vec![*target],
            Instruction::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Instruction::Call { .. })
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Instruction::Store { .. })
    }

    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::Cast { op, .. } => op.mnemonic(),
            Instruction::Phi { .. } => "phi",
            Instruction::Select { .. } => "select",
            Instruction::Load { .. } => "load",
            Instruction::Store { .. } => "store",
            Instruction::Call { .. } => "call",
            Instruction::GetElementPtr { .. } => "getelementptr",
            Instruction::Alloca { .. } => "alloca",
            Instruction::Binary { op, .. } => op.mnemonic(),
            Instruction::Compare { .. } => "icmp",
            Instruction::Jump { .. } | Instruction::Branch { .. } => "br",
            Instruction::Return { .. } => "ret",
            Instruction::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastOp {
    Bitcast,
    PtrToInt,
    IntToPtr,
    Trunc,
    ZExt,
    SExt,
    AddrSpaceCast,
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::Bitcast => "bitcast",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::IntToPtr => "inttoptr",
            CastOp::Trunc => "trunc",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::AddrSpaceCast => "addrspacecast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "sdiv",
            BinaryOp::Rem => "srem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "ashr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparePredicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparePredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ComparePredicate::Eq => "eq",
            ComparePredicate::Ne => "ne",
            ComparePredicate::Lt => "slt",
            ComparePredicate::Le => "sle",
            ComparePredicate::Gt => "sgt",
            ComparePredicate::Ge => "sge",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_operands_put_callee_last() {
        let call = Instruction::Call {
            callee: ValueId(9),
            args: vec![ValueId(1), ValueId(2)],
        };
        assert_eq!(call.operands(), vec![ValueId(1), ValueId(2), ValueId(9)]);
    }

    #[test]
    fn test_phi_operands_exclude_blocks() {
        let phi = Instruction::Phi {
            incoming: vec![(ValueId(3), BlockId(0)), (ValueId(4), BlockId(1))],
        };
        assert_eq!(phi.operands(), vec![ValueId(3), ValueId(4)]);
        assert!(!phi.is_terminator());
    }

    #[test]
    fn test_terminator_successors() {
        let br = Instruction::Branch {
            condition: ValueId(0),
            then_block: BlockId(1),
            else_block: BlockId(2),
        };
        assert!(br.is_terminator());
        assert_eq!(br.successors(), vec![BlockId(1), BlockId(2)]);
        assert!(Instruction::Return { value: None }.successors().is_empty());
    }
}
