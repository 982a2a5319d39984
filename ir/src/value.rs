use crate::{
    arena::Ref, block::Block, constant_value::ConstantValue, function::Function,
    function::Parameter, instruction::Instruction, intern::InternedString,
};

/// Anything usable as an instruction operand
///
/// Values are handles, an instruction referencing a value never owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Parameter(Ref<Parameter>),
    /// Result of an instruction
    Instruction(Ref<Instruction>),
    Block(Ref<Block>),
    /// Address of a function, as opposed to the target of a call
    Function(Ref<Function>),
    /// Externally defined storage
    Global(InternedString),
    Constant(ConstantValue),
}

impl Value {
    pub fn signed(value: i64) -> Self {
        Self::Constant(ConstantValue::SignedInteger(value))
    }

    pub fn unsigned(value: u64) -> Self {
        Self::Constant(ConstantValue::UnsignedInteger(value))
    }

    pub fn global<S: Into<InternedString>>(name: S) -> Self {
        Self::Global(name.into())
    }

    pub fn as_instruction(&self) -> Option<Ref<Instruction>> {
        match self {
            Self::Instruction(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<Ref<Block>> {
        match self {
            Self::Block(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the value is owned by a function body (and so must be remapped
    /// when that body is cloned)
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Parameter(_) | Self::Instruction(_) | Self::Block(_)
        )
    }
}

impl From<Ref<Parameter>> for Value {
    fn from(p: Ref<Parameter>) -> Self {
        Self::Parameter(p)
    }
}

impl From<Ref<Instruction>> for Value {
    fn from(i: Ref<Instruction>) -> Self {
        Self::Instruction(i)
    }
}

impl From<Ref<Block>> for Value {
    fn from(b: Ref<Block>) -> Self {
        Self::Block(b)
    }
}

impl From<ConstantValue> for Value {
    fn from(c: ConstantValue) -> Self {
        Self::Constant(c)
    }
}
