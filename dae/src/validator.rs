use {
    ir::{
        arena::Ref,
        block::Block,
        function::Function,
        instruction::Instruction,
        module::Module,
        value::Value,
        HashSet,
    },
    std::fmt::Display,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

pub enum Scope<'m> {
    FunctionLevel(&'m Function),
    BlockLevel(&'m Function, &'m Block),
    InstructionLevel(&'m Function, &'m Block, Ref<Instruction>),
}

pub struct ValidationMessage<'m>(Severity, Scope<'m>, String);

impl<'m> Display for ValidationMessage<'m> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.0 {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };

        let scope = match &self.1 {
            Scope::FunctionLevel(f) => format!("{}", f.name()),
            Scope::BlockLevel(f, b) => format!("{} {}", f.name(), b.name()),
            Scope::InstructionLevel(f, b, i) => format!("{} {} %{}", f.name(), b.name(), i.index()),
        };

        write!(f, "{severity}: {scope}: {}", self.2)
    }
}

impl<'m> ValidationMessage<'m> {
    pub fn severity(&self) -> Severity {
        self.0
    }

    pub fn is_error(&self) -> bool {
        self.0 == Severity::Error
    }

    fn instruction_err<T: ToString>(
        f: &'m Function,
        b: &'m Block,
        i: Ref<Instruction>,
        m: T,
    ) -> Self {
        Self(Severity::Error, Scope::InstructionLevel(f, b, i), m.to_string())
    }

    fn block_err<T: ToString>(f: &'m Function, b: &'m Block, m: T) -> Self {
        Self(Severity::Error, Scope::BlockLevel(f, b), m.to_string())
    }

    fn function_note<T: ToString>(f: &'m Function, m: T) -> Self {
        Self(Severity::Note, Scope::FunctionLevel(f), m.to_string())
    }
}

pub fn validate(module: &Module) -> Vec<ValidationMessage> {
    let messages = [
        check_structure(module),
        check_operands(module),
        check_calls(module),
        check_uncalled(module),
    ];

    messages.into_iter().flatten().collect()
}

/// Blocks and instructions are owned by the function listing them, and every
/// block ends in a terminator
fn check_structure(module: &Module) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();

    for r in module.functions() {
        let f = module.function(*r);
        for b in f.blocks() {
            let block = module.block(*b);
            if block.function() != *r {
                messages.push(ValidationMessage::block_err(
                    f,
                    block,
                    "block is owned by another function",
                ));
            }

            for i in block.instructions() {
                if !module.contains_instruction(*i) {
                    messages.push(ValidationMessage::block_err(
                        f,
                        block,
                        format!("block lists erased instruction {i:?}"),
                    ));
                } else if module.instruction(*i).block() != *b {
                    messages.push(ValidationMessage::instruction_err(
                        f,
                        block,
                        *i,
                        "instruction is owned by another block",
                    ));
                }
            }

            let terminated = block.terminator().is_some_and(|t| {
                module.contains_instruction(t) && module.instruction(t).is_terminator()
            });
            if !terminated {
                messages.push(ValidationMessage::block_err(
                    f,
                    block,
                    "block does not end in a terminator",
                ));
            }
        }
    }

    messages
}

/// Every operand refers to a live entity, and function-local operands to an
/// entity of the same function
fn check_operands(module: &Module) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();

    for_each_instruction(module, |f_ref, f, block, i| {
        for (index, operand) in module.instruction(i).operands().iter().enumerate() {
            if !module.is_live(*operand) {
                messages.push(ValidationMessage::instruction_err(
                    f,
                    block,
                    i,
                    format!("operand {index} refers to erased {operand:?}"),
                ));
            } else if operand.is_local() && module.owning_function(*operand) != Some(f_ref) {
                messages.push(ValidationMessage::instruction_err(
                    f,
                    block,
                    i,
                    format!(
                        "operand {index} refers to {} of another function",
                        module.display_value(*operand)
                    ),
                ));
            }
        }
    });

    messages
}

/// Call targets are live and receive as many arguments as they declare
fn check_calls(module: &Module) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();

    for_each_instruction(module, |_, f, block, i| {
        let instruction = module.instruction(i);
        let Some(target) = instruction.call_target() else {
            return;
        };

        if !module.contains_function(target) {
            messages.push(ValidationMessage::instruction_err(
                f,
                block,
                i,
                format!("call to erased function {target:?}"),
            ));
            return;
        }

        let callee = module.function(target);
        let found = instruction.operands().len();
        let mismatch = if callee.is_variadic() {
            found < callee.arity()
        } else {
            found != callee.arity()
        };

        if mismatch {
            messages.push(ValidationMessage::instruction_err(
                f,
                block,
                i,
                format!(
                    "call to {} passes {found} arguments, expected {}",
                    callee.name(),
                    callee.arity()
                ),
            ));
        }
    });

    messages
}

fn check_uncalled(module: &Module) -> Vec<ValidationMessage> {
    let mut referenced = HashSet::default();
    for_each_instruction(module, |_, _, _, i| {
        let instruction = module.instruction(i);
        referenced.extend(instruction.call_target());
        referenced.extend(instruction.operands().iter().filter_map(|v| match v {
            Value::Function(f) => Some(*f),
            _ => None,
        }));
    });

    module
        .functions()
        .iter()
        .filter(|f| !referenced.contains(*f))
        .map(|f| {
            ValidationMessage::function_note(module.function(*f), "function is never referenced")
        })
        .collect()
}

fn for_each_instruction<'m, F>(module: &'m Module, mut visit: F)
where
    F: FnMut(Ref<Function>, &'m Function, &'m Block, Ref<Instruction>),
{
    for r in module.functions() {
        let f = module.function(*r);
        for b in f.blocks() {
            let block = module.block(*b);
            for i in block.instructions() {
                if module.contains_instruction(*i) {
                    visit(*r, f, block, *i);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{validate, Severity},
        crate::testing::{call_from, spilled_function},
        ir::{builder::Builder, function::Signature, module::Module, value::Value},
        pretty_assertions::assert_eq,
    };

    #[test]
    fn well_formed_module_has_no_errors() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a", "b"], &["a"]);
        call_from(&mut m, "main", f, vec![Value::signed(1), Value::signed(2)]);

        let messages = validate(&m);
        assert!(messages.iter().all(|m| !m.is_error()));
        // main is never called
        assert_eq!(
            messages
                .iter()
                .filter(|m| m.severity() == Severity::Note)
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["NOTE: main: function is never referenced".to_owned()]
        );
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a", "b"], &["a"]);
        call_from(&mut m, "main", f, vec![Value::signed(1)]);

        let errors = validate(&m)
            .into_iter()
            .filter(|m| m.is_error())
            .map(|m| m.to_string())
            .collect::<Vec<_>>();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("passes 1 arguments, expected 2"));
    }

    #[test]
    fn foreign_operand_is_an_error() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a"], &["a"]);
        let a = Value::Parameter(m.function(f).parameters()[0]);
        let (_, call) = call_from(&mut m, "main", f, vec![Value::signed(1)]);
        m.set_operand(call, 0, a);

        let errors = validate(&m)
            .into_iter()
            .filter(|m| m.is_error())
            .map(|m| m.to_string())
            .collect::<Vec<_>>();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("of another function"));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let mut m = Module::new();
        let f = m.add_function("f", Signature::new(None));
        let entry = m.append_block(f, "entry");
        Builder::new(&mut m, entry).emit(Value::signed(1));

        let errors = validate(&m)
            .into_iter()
            .filter(|m| m.is_error())
            .map(|m| m.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            errors,
            vec!["ERROR: f entry: block does not end in a terminator".to_owned()]
        );
    }
}
