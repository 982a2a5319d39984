use ir::{intern::InternedString, module::EraseError};

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// Cloned instruction in {function} still refers to {operand} of another function
    UnresolvedOperand {
        function: InternedString,
        operand: String,
    },
    /// Call to {callee} passes {found} arguments but the callee takes {expected}
    ArityMismatch {
        callee: InternedString,
        expected: usize,
        found: usize,
    },
    /// Function {0} has no body
    NoBody(InternedString),
    /// Function {0} was already replaced
    AlreadyReplaced(InternedString),
    /// Failed to erase superseded entity: {0}
    Erase(EraseError),
    /// Module failed validation: {0:?}
    Validation(Vec<String>),
}

impl From<EraseError> for Error {
    fn from(value: EraseError) -> Self {
        Self::Erase(value)
    }
}
