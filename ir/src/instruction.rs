use {
    crate::{arena::Ref, block::Block, function::Function, types::Type, value::Value},
    core::fmt::{self, Display, Formatter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperationKind {
    Add,
    Sub,
    Multiply,
    And,
    Or,
    Xor,
    CompareEqual,
    CompareNotEqual,
    CompareLessThan,
    CompareGreaterThan,
}

impl BinaryOperationKind {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::CompareEqual
                | Self::CompareNotEqual
                | Self::CompareLessThan
                | Self::CompareGreaterThan
        )
    }
}

/// Instructions with no special meaning to the analyses over this IR
///
/// Their operands still take part in def-use tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Opcode {
    /// Allocates a stack slot, result is its address
    Alloca,
    /// `[lhs, rhs]`
    Binary(BinaryOperationKind),
    /// `[target]`
    Jump,
    /// `[condition, true_target, false_target]`
    Branch,
    /// `[]` or `[value]`
    Return,
    /// `[value]`, an observable side effect
    Emit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InstructionKind {
    /// `[value, address]`
    Store,
    /// `[address]`
    Load,
    /// Operands are the call arguments, in order
    Call { target: Ref<Function> },
    Other(Opcode),
}

impl Display for InstructionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Load => write!(f, "load"),
            Self::Call { .. } => write!(f, "call"),
            Self::Other(Opcode::Alloca) => write!(f, "alloca"),
            Self::Other(Opcode::Binary(kind)) => {
                write!(f, "{}", format!("{kind:?}").to_lowercase())
            }
            Self::Other(Opcode::Jump) => write!(f, "jump"),
            Self::Other(Opcode::Branch) => write!(f, "branch"),
            Self::Other(Opcode::Return) => write!(f, "return"),
            Self::Other(Opcode::Emit) => write!(f, "emit"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Instruction {
    kind: InstructionKind,
    operands: Vec<Value>,
    /// Type of the result, `None` if the instruction produces no value
    typ: Option<Type>,
    block: Ref<Block>,
}

impl Instruction {
    pub(crate) fn new(
        kind: InstructionKind,
        operands: Vec<Value>,
        typ: Option<Type>,
        block: Ref<Block>,
    ) -> Self {
        Self {
            kind,
            operands,
            typ,
            block,
        }
    }

    pub fn kind(&self) -> InstructionKind {
        self.kind
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    pub fn operand(&self, index: usize) -> Option<Value> {
        self.operands.get(index).copied()
    }

    pub(crate) fn operands_mut(&mut self) -> &mut Vec<Value> {
        &mut self.operands
    }

    pub fn typ(&self) -> Option<Type> {
        self.typ.clone()
    }

    pub fn has_result(&self) -> bool {
        self.typ.is_some()
    }

    /// Block the instruction was inserted into
    pub fn block(&self) -> Ref<Block> {
        self.block
    }

    pub(crate) fn set_block(&mut self, block: Ref<Block>) {
        self.block = block;
    }

    pub fn is_store(&self) -> bool {
        matches!(self.kind, InstructionKind::Store)
    }

    pub fn is_load(&self) -> bool {
        matches!(self.kind, InstructionKind::Load)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::Other(Opcode::Jump | Opcode::Branch | Opcode::Return)
        )
    }

    /// Value written by a store
    pub fn stored_value(&self) -> Option<Value> {
        self.is_store().then(|| self.operand(0)).flatten()
    }

    /// Destination address of a store
    pub fn store_address(&self) -> Option<Value> {
        self.is_store().then(|| self.operand(1)).flatten()
    }

    /// Source address of a load
    pub fn load_address(&self) -> Option<Value> {
        self.is_load().then(|| self.operand(0)).flatten()
    }

    pub fn call_target(&self) -> Option<Ref<Function>> {
        match self.kind {
            InstructionKind::Call { target } => Some(target),
            _ => None,
        }
    }

    /// Rewrites every operand equal to `use_of` to `with`, returning the number
    /// of operands changed
    pub fn replace_use(&mut self, use_of: Value, with: Value) -> usize {
        let mut count = 0;
        for operand in self.operands.iter_mut().filter(|o| **o == use_of) {
            *operand = with;
            count += 1;
        }
        count
    }
}
