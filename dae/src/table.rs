//! Bookkeeping shared between the per-function and whole-module phases

use {
    crate::Error,
    ir::{
        arena::Ref, function::Function, instruction::Instruction, module::Module, Entry, HashMap,
    },
    log::trace,
};

/// Function created to stand in for an original
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub function: Ref<Function>,
    /// Positional indices of the parameters removed from the original,
    /// ascending
    pub dropped: Vec<usize>,
}

/// Original to replacement mapping, filled while functions are rewritten
#[derive(Debug, Default)]
pub struct ReplacementTable {
    entries: HashMap<Ref<Function>, Replacement>,
    order: Vec<Ref<Function>>,
}

impl ReplacementTable {
    pub fn insert(
        &mut self,
        module: &Module,
        original: Ref<Function>,
        replacement: Replacement,
    ) -> Result<(), Error> {
        match self.entries.entry(original) {
            Entry::Occupied(_) => Err(Error::AlreadyReplaced(module.function(original).name())),
            Entry::Vacant(v) => {
                v.insert(replacement);
                self.order.push(original);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ends the filling phase, the returned mapping can no longer be modified
    pub fn finalize(self) -> Replacements {
        Replacements {
            entries: self.entries,
            order: self.order,
        }
    }
}

/// Read-only original to replacement mapping
#[derive(Debug)]
pub struct Replacements {
    entries: HashMap<Ref<Function>, Replacement>,
    order: Vec<Ref<Function>>,
}

impl Replacements {
    pub fn get(&self, original: Ref<Function>) -> Option<&Replacement> {
        self.entries.get(&original)
    }

    /// Originals in the order they were replaced
    pub fn originals(&self) -> &[Ref<Function>] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ref<Function>, &Replacement)> {
        self.order.iter().map(|f| (*f, &self.entries[f]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Entities superseded during the transformation, erased only once nothing
/// refers to them anymore
#[derive(Debug, Default)]
pub struct RemovalQueue {
    instructions: Vec<Ref<Instruction>>,
    functions: Vec<Ref<Function>>,
}

impl RemovalQueue {
    pub fn schedule_instruction(&mut self, i: Ref<Instruction>) {
        self.instructions.push(i);
    }

    pub fn schedule_function(&mut self, f: Ref<Function>) {
        self.functions.push(f);
    }

    pub fn pending_instructions(&self) -> &[Ref<Instruction>] {
        &self.instructions
    }

    pub fn pending_functions(&self) -> &[Ref<Function>] {
        &self.functions
    }

    /// Erases all pending instructions, then all pending functions, returning
    /// how many of each were erased
    ///
    /// Instructions already destroyed along with an erased function are not
    /// revisited, the order above guarantees no call to a pending function
    /// outlives it.
    pub fn drain(self, module: &mut Module) -> Result<(usize, usize), Error> {
        for i in &self.instructions {
            trace!("erasing instruction {i:?}");
            module.erase_instruction(*i)?;
        }

        for f in &self.functions {
            trace!("erasing function {}", module.function(*f).name());
            module.erase_function(*f)?;
        }

        Ok((self.instructions.len(), self.functions.len()))
    }
}
