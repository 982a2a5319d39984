use crate::{arena::Ref, function::Function, instruction::Instruction, intern::InternedString};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Block {
    name: InternedString,
    function: Ref<Function>,
    instructions: Vec<Ref<Instruction>>,
}

impl Block {
    pub(crate) fn new(name: InternedString, function: Ref<Function>) -> Self {
        Self {
            name,
            function,
            instructions: Vec::new(),
        }
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    /// Function owning this block
    pub fn function(&self) -> Ref<Function> {
        self.function
    }

    pub fn instructions(&self) -> &[Ref<Instruction>] {
        self.instructions.as_slice()
    }

    pub fn terminator(&self) -> Option<Ref<Instruction>> {
        self.instructions.last().copied()
    }

    pub fn index_of_instruction(&self, reference: Ref<Instruction>) -> Option<usize> {
        self.instructions
            .iter()
            .position(|candidate| *candidate == reference)
    }

    /// Inserts `new` before `reference`, returning false if `reference` is not
    /// in this block
    pub(crate) fn insert_instruction_before(
        &mut self,
        reference: Ref<Instruction>,
        new: Ref<Instruction>,
    ) -> bool {
        match self.index_of_instruction(reference) {
            Some(index) => {
                self.instructions.insert(index, new);
                true
            }
            None => false,
        }
    }

    pub(crate) fn append_instruction(&mut self, new: Ref<Instruction>) {
        self.instructions.push(new);
    }

    pub(crate) fn kill_instruction(&mut self, instruction: Ref<Instruction>) {
        if let Some(index) = self.index_of_instruction(instruction) {
            self.instructions.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
