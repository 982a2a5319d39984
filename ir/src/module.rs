use {
    crate::{
        arena::{Arena, Ref},
        block::Block,
        function::{Function, Parameter, Signature},
        instruction::{Instruction, InstructionKind},
        intern::InternedString,
        types::{maybe_type_to_string, Type},
        value::Value,
    },
    core::fmt::{self, Display, Formatter},
    itertools::Itertools,
    log::trace,
};

/// Where a new instruction is placed within a block
#[derive(Debug, Clone, Copy)]
pub enum Location {
    End,
    Before(Ref<Instruction>),
}

#[derive(Debug, thiserror::Error, displaydoc::Display, PartialEq, Eq)]
pub enum EraseError {
    /// Instruction {0:?} was already erased
    InstructionErased(Ref<Instruction>),
    /// Function {0:?} was already erased
    FunctionErased(Ref<Function>),
    /// Result of instruction {instruction:?} is still used by {users:?}
    InstructionInUse {
        instruction: Ref<Instruction>,
        users: Vec<Ref<Instruction>>,
    },
    /// Function {function} is still referenced by {users:?}
    FunctionInUse {
        function: InternedString,
        users: Vec<Ref<Instruction>>,
    },
    /// Instruction {0:?} is not in block {1:?}
    NotInBlock(Ref<Instruction>, Ref<Block>),
}

/// The whole program under transformation
///
/// Owns every function, parameter, block and instruction. Functions are kept
/// in insertion order and identified by their `Ref`, never by name.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Module {
    functions: Arena<Function>,
    parameters: Arena<Parameter>,
    blocks: Arena<Block>,
    instructions: Arena<Instruction>,
    function_order: Vec<Ref<Function>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new function without a body
    pub fn add_function<S: Into<InternedString>>(
        &mut self,
        name: S,
        signature: Signature,
    ) -> Ref<Function> {
        let Signature {
            return_type,
            parameters,
            linkage,
            variadic,
        } = signature;

        let f = self.functions.insert(Function::new(
            name.into(),
            return_type,
            linkage,
            variadic,
        ));

        for (index, (name, typ)) in parameters.into_iter().enumerate() {
            let p = self.parameters.insert(Parameter::new(name, typ, f, index));
            f.get_mut(&mut self.functions).push_parameter(p);
        }

        self.function_order.push(f);
        f
    }

    /// Live functions in insertion order
    pub fn functions(&self) -> &[Ref<Function>] {
        &self.function_order
    }

    pub fn function(&self, f: Ref<Function>) -> &Function {
        f.get(&self.functions)
    }

    pub fn contains_function(&self, f: Ref<Function>) -> bool {
        self.functions.contains(f)
    }

    /// First live function with the supplied name
    pub fn function_by_name<S: Into<InternedString>>(&self, name: S) -> Option<Ref<Function>> {
        let name = name.into();
        self.function_order
            .iter()
            .copied()
            .find(|f| self.function(*f).name() == name)
    }

    pub fn parameter(&self, p: Ref<Parameter>) -> &Parameter {
        p.get(&self.parameters)
    }

    pub fn block(&self, b: Ref<Block>) -> &Block {
        b.get(&self.blocks)
    }

    pub fn instruction(&self, i: Ref<Instruction>) -> &Instruction {
        i.get(&self.instructions)
    }

    pub fn contains_instruction(&self, i: Ref<Instruction>) -> bool {
        self.instructions.contains(i)
    }

    /// Every live instruction of a function, in block order
    pub fn instructions_of(&self, f: Ref<Function>) -> Vec<Ref<Instruction>> {
        self.function(f)
            .blocks()
            .iter()
            .flat_map(|b| self.block(*b).instructions().iter().copied())
            .collect()
    }

    /// Function owning the entity behind `value`, `None` for values not owned
    /// by a function body
    pub fn owning_function(&self, value: Value) -> Option<Ref<Function>> {
        match value {
            Value::Parameter(p) => self.parameters.get(p).map(Parameter::function),
            Value::Block(b) => self.blocks.get(b).map(Block::function),
            Value::Instruction(i) => self
                .instructions
                .get(i)
                .and_then(|i| self.blocks.get(i.block()))
                .map(Block::function),
            Value::Function(_) | Value::Global(_) | Value::Constant(_) => None,
        }
    }

    /// Whether the entity a value refers to has not been erased
    pub fn is_live(&self, value: Value) -> bool {
        match value {
            Value::Parameter(p) => self.parameters.contains(p),
            Value::Instruction(i) => self.instructions.contains(i),
            Value::Block(b) => self.blocks.contains(b),
            Value::Function(f) => self.functions.contains(f),
            Value::Global(_) | Value::Constant(_) => true,
        }
    }

    pub fn value_type(&self, value: Value) -> Option<Type> {
        match value {
            Value::Parameter(p) => Some(self.parameter(p).typ()),
            Value::Instruction(i) => self.instruction(i).typ(),
            Value::Block(_) => None,
            Value::Function(_) | Value::Global(_) => Some(Type::Pointer),
            Value::Constant(_) => Some(Type::s64()),
        }
    }

    /// Appends a new, empty block to the end of a function
    pub fn append_block<S: Into<InternedString>>(
        &mut self,
        f: Ref<Function>,
        name: S,
    ) -> Ref<Block> {
        let b = self.blocks.insert(Block::new(name.into(), f));
        f.get_mut(&mut self.functions).push_block(b);
        b
    }

    /// Creates a new instruction and inserts it at the supplied location
    pub fn build_at(
        &mut self,
        block: Ref<Block>,
        kind: InstructionKind,
        operands: Vec<Value>,
        typ: Option<Type>,
        location: Location,
    ) -> Result<Ref<Instruction>, EraseError> {
        self.insert_instruction(block, Instruction::new(kind, operands, typ, block), location)
    }

    /// Creates a new instruction and pushes it to the end of the block
    pub fn build(
        &mut self,
        block: Ref<Block>,
        kind: InstructionKind,
        operands: Vec<Value>,
        typ: Option<Type>,
    ) -> Ref<Instruction> {
        let i = self
            .instructions
            .insert(Instruction::new(kind, operands, typ, block));
        block.get_mut(&mut self.blocks).append_instruction(i);
        i
    }

    /// Independent copy of an instruction, operands still refer to the same
    /// values as the original
    pub fn clone_instruction(&self, i: Ref<Instruction>) -> Instruction {
        self.instruction(i).clone()
    }

    /// Inserts a detached instruction into `block`
    pub fn insert_instruction(
        &mut self,
        block: Ref<Block>,
        mut instruction: Instruction,
        location: Location,
    ) -> Result<Ref<Instruction>, EraseError> {
        if let Location::Before(before) = location {
            if self.block(block).index_of_instruction(before).is_none() {
                return Err(EraseError::NotInBlock(before, block));
            }
        }

        instruction.set_block(block);
        let i = self.instructions.insert(instruction);

        let block = block.get_mut(&mut self.blocks);
        match location {
            Location::End => block.append_instruction(i),
            Location::Before(before) => {
                block.insert_instruction_before(before, i);
            }
        }

        Ok(i)
    }

    pub fn set_operand(&mut self, i: Ref<Instruction>, index: usize, value: Value) {
        i.get_mut(&mut self.instructions).operands_mut()[index] = value;
    }

    /// Every live instruction with `value` as an operand
    pub fn users_of(&self, value: Value) -> Vec<Ref<Instruction>> {
        self.instructions
            .iter()
            .filter(|(_, i)| i.operands().contains(&value))
            .map(|(r, _)| r)
            .collect()
    }

    /// Redirects every use of `old` to `new`, returning the number of operands
    /// rewritten
    pub fn replace_all_uses(&mut self, old: Value, new: Value) -> usize {
        let mut count = 0;
        for user in self.users_of(old) {
            count += user.get_mut(&mut self.instructions).replace_use(old, new);
        }
        trace!("replaced {count} uses of {old:?} with {new:?}");
        count
    }

    /// Removes an instruction from its block and destroys it
    ///
    /// Fails if the result of the instruction is still used by any live
    /// instruction other than itself.
    pub fn erase_instruction(&mut self, i: Ref<Instruction>) -> Result<Instruction, EraseError> {
        if !self.instructions.contains(i) {
            return Err(EraseError::InstructionErased(i));
        }

        let users = self
            .users_of(Value::Instruction(i))
            .into_iter()
            .filter(|u| *u != i)
            .collect::<Vec<_>>();
        if !users.is_empty() {
            return Err(EraseError::InstructionInUse {
                instruction: i,
                users,
            });
        }

        let block = self.instruction(i).block();
        if let Some(block) = self.blocks.get_mut(block) {
            block.kill_instruction(i);
        }

        self.instructions
            .remove(i)
            .ok_or(EraseError::InstructionErased(i))
    }

    /// Removes a function along with its parameters, blocks and instructions
    ///
    /// Fails if any instruction outside the function still calls it or takes
    /// its address.
    pub fn erase_function(&mut self, f: Ref<Function>) -> Result<Function, EraseError> {
        if !self.functions.contains(f) {
            return Err(EraseError::FunctionErased(f));
        }

        let users = self
            .instructions
            .iter()
            .filter(|(_, i)| {
                i.call_target() == Some(f) || i.operands().contains(&Value::Function(f))
            })
            .map(|(r, _)| r)
            .filter(|r| self.owning_function(Value::Instruction(*r)) != Some(f))
            .collect::<Vec<_>>();
        if !users.is_empty() {
            return Err(EraseError::FunctionInUse {
                function: self.function(f).name(),
                users,
            });
        }

        let function = self
            .functions
            .remove(f)
            .ok_or(EraseError::FunctionErased(f))?;

        for b in function.blocks() {
            if let Some(block) = self.blocks.remove(*b) {
                for i in block.instructions() {
                    self.instructions.remove(*i);
                }
            }
        }
        for p in function.parameters() {
            self.parameters.remove(*p);
        }

        self.function_order.retain(|candidate| *candidate != f);

        Ok(function)
    }

    /// Renders a value the way it appears in the textual form of the module
    pub fn display_value(&self, value: Value) -> String {
        match value {
            Value::Parameter(p) => match self.parameters.get(p) {
                Some(p) => format!("%{}", p.name()),
                None => format!("<erased {p:?}>"),
            },
            Value::Instruction(i) => format!("%{}", i.index()),
            Value::Block(b) => match self.blocks.get(b) {
                Some(b) => format!("{}", b.name()),
                None => format!("<erased {b:?}>"),
            },
            Value::Function(f) => match self.functions.get(f) {
                Some(f) => format!("@{}", f.name()),
                None => format!("<erased {f:?}>"),
            },
            Value::Global(name) => format!("${name}"),
            Value::Constant(c) => format!("{c}"),
        }
    }

    fn display_instruction(&self, i: Ref<Instruction>) -> String {
        let instruction = self.instruction(i);
        let operands = instruction
            .operands()
            .iter()
            .map(|v| self.display_value(*v))
            .join(", ");

        let op = match instruction.call_target() {
            Some(target) => format!("call {}", self.display_value(Value::Function(target))),
            None => instruction.kind().to_string(),
        };

        let body = if operands.is_empty() {
            op
        } else {
            format!("{op} {operands}")
        };

        match instruction.typ() {
            Some(typ) => format!("%{} = {body} : {typ}", i.index()),
            None => body,
        }
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for func in &self.function_order {
            let function = self.function(*func);
            let parameters = function
                .parameters()
                .iter()
                .map(|p| self.parameter(*p).to_string())
                .chain(function.is_variadic().then(|| "...".to_owned()))
                .join(", ");

            let header = format!(
                "fn @{}({}) -> {}",
                function.name(),
                parameters,
                maybe_type_to_string(function.return_type().as_ref())
            );

            if function.is_declaration() {
                writeln!(f, "declare {header}")?;
                continue;
            }

            writeln!(f, "{header} {{")?;
            for b in function.blocks() {
                writeln!(f, "  {}:", self.block(*b).name())?;
                for i in self.block(*b).instructions() {
                    writeln!(f, "    {}", self.display_instruction(*i))?;
                }
            }
            writeln!(f, "}}")?;
        }

        Ok(())
    }
}
