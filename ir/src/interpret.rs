//! Reference interpreter
//!
//! Executes functions directly on the IR. Integers are 64-bit and wrap,
//! addresses are either stack slots or named globals.

use {
    crate::{
        arena::Ref,
        block::Block,
        function::{Function, Parameter},
        instruction::{BinaryOperationKind, Instruction, InstructionKind, Opcode},
        intern::InternedString,
        module::Module,
        value::Value,
        HashMap,
    },
    log::trace,
};

const DEFAULT_STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, thiserror::Error, displaydoc::Display, PartialEq, Eq)]
pub enum InterpretError {
    /// Function {function} expects {expected} arguments but {found} were supplied
    ArityMismatch {
        function: InternedString,
        expected: usize,
        found: usize,
    },
    /// Function {0} has no body
    Declaration(InternedString),
    /// Value {0} has not been defined
    UndefinedValue(String),
    /// Expected an address but found {0}
    NotAnAddress(String),
    /// Expected an integer but found {0}
    NotAnInteger(String),
    /// Use of a value loaded from uninitialized storage
    Uninitialized,
    /// Block {0} has no terminator
    MissingTerminator(InternedString),
    /// Malformed {0} instruction
    Malformed(String),
    /// Execution exceeded {0} steps
    StepLimit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Slot(usize),
    Global(InternedString),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeValue {
    Integer(i64),
    Address(Address),
    /// Result of loading from storage that was never written
    Undefined,
}

impl RuntimeValue {
    fn integer(self) -> Result<i64, InterpretError> {
        match self {
            Self::Integer(i) => Ok(i),
            Self::Address(a) => Err(InterpretError::NotAnInteger(format!("{a:?}"))),
            Self::Undefined => Err(InterpretError::Uninitialized),
        }
    }

    fn address(self) -> Result<Address, InterpretError> {
        match self {
            Self::Address(a) => Ok(a),
            Self::Integer(i) => Err(InterpretError::NotAnAddress(i.to_string())),
            Self::Undefined => Err(InterpretError::Uninitialized),
        }
    }
}

#[derive(Default)]
struct Frame {
    parameters: HashMap<Ref<Parameter>, RuntimeValue>,
    results: HashMap<Ref<Instruction>, RuntimeValue>,
}

pub struct Interpreter<'m> {
    module: &'m Module,
    slots: Vec<Option<RuntimeValue>>,
    globals: HashMap<InternedString, RuntimeValue>,
    output: Vec<i64>,
    steps: usize,
    step_limit: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            slots: Vec::new(),
            globals: HashMap::default(),
            output: Vec::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn set_global<S: Into<InternedString>>(&mut self, name: S, value: i64) {
        self.globals
            .insert(name.into(), RuntimeValue::Integer(value));
    }

    pub fn global<S: Into<InternedString>>(&self, name: S) -> Option<i64> {
        match self.globals.get(&name.into()) {
            Some(RuntimeValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Values passed to `emit` instructions, in execution order
    pub fn output(&self) -> &[i64] {
        &self.output
    }

    /// Calls `f` with integer arguments, returning its result if it has one
    pub fn call(&mut self, f: Ref<Function>, args: &[i64]) -> Result<Option<i64>, InterpretError> {
        let args = args
            .iter()
            .copied()
            .map(RuntimeValue::Integer)
            .collect::<Vec<_>>();

        self.invoke(f, &args)?
            .map(RuntimeValue::integer)
            .transpose()
    }

    fn invoke(
        &mut self,
        f: Ref<Function>,
        args: &[RuntimeValue],
    ) -> Result<Option<RuntimeValue>, InterpretError> {
        let module = self.module;
        let function = module.function(f);
        trace!("invoking {}", function.name());

        let arity = function.arity();
        if args.len() < arity || (args.len() > arity && !function.is_variadic()) {
            return Err(InterpretError::ArityMismatch {
                function: function.name(),
                expected: arity,
                found: args.len(),
            });
        }

        let Some(mut block) = function.entry_block() else {
            return Err(InterpretError::Declaration(function.name()));
        };

        let mut frame = Frame::default();
        for (p, arg) in function.parameters().iter().zip(args) {
            frame.parameters.insert(*p, *arg);
        }

        'blocks: loop {
            for i in module.block(block).instructions() {
                self.steps += 1;
                if self.steps > self.step_limit {
                    return Err(InterpretError::StepLimit(self.step_limit));
                }

                match self.step(&mut frame, *i)? {
                    Control::Continue => {}
                    Control::Jump(target) => {
                        block = target;
                        continue 'blocks;
                    }
                    Control::Return(value) => return Ok(value),
                }
            }

            return Err(InterpretError::MissingTerminator(module.block(block).name()));
        }
    }

    fn eval(&self, frame: &Frame, value: Value) -> Result<RuntimeValue, InterpretError> {
        let undefined = || InterpretError::UndefinedValue(self.module.display_value(value));

        match value {
            Value::Parameter(p) => frame.parameters.get(&p).copied().ok_or_else(undefined),
            Value::Instruction(i) => frame.results.get(&i).copied().ok_or_else(undefined),
            Value::Global(name) => Ok(RuntimeValue::Address(Address::Global(name))),
            Value::Constant(c) => Ok(RuntimeValue::Integer(c.as_i64())),
            Value::Block(_) | Value::Function(_) => Err(undefined()),
        }
    }

    fn block_operand(&self, i: &Instruction, index: usize) -> Result<Ref<Block>, InterpretError> {
        i.operand(index)
            .and_then(|v| v.as_block())
            .ok_or_else(|| InterpretError::Malformed(i.kind().to_string()))
    }

    fn operand(
        &self,
        frame: &Frame,
        i: &Instruction,
        index: usize,
    ) -> Result<RuntimeValue, InterpretError> {
        let value = i
            .operand(index)
            .ok_or_else(|| InterpretError::Malformed(i.kind().to_string()))?;
        self.eval(frame, value)
    }

    fn step(&mut self, frame: &mut Frame, r: Ref<Instruction>) -> Result<Control, InterpretError> {
        let module = self.module;
        let i = module.instruction(r);

        let result = match i.kind() {
            InstructionKind::Store => {
                let value = self.operand(frame, i, 0)?;
                match self.operand(frame, i, 1)?.address()? {
                    Address::Slot(slot) => self.slots[slot] = Some(value),
                    Address::Global(name) => {
                        self.globals.insert(name, value);
                    }
                }
                None
            }
            InstructionKind::Load => {
                let address = self.operand(frame, i, 0)?.address()?;
                let loaded = match address {
                    Address::Slot(slot) => self.slots.get(slot).copied().flatten(),
                    Address::Global(name) => self.globals.get(&name).copied(),
                };
                Some(loaded.unwrap_or(RuntimeValue::Undefined))
            }
            InstructionKind::Call { target } => {
                let args = (0..i.operands().len())
                    .map(|index| self.operand(frame, i, index))
                    .collect::<Result<Vec<_>, _>>()?;
                self.invoke(target, &args)?
            }
            InstructionKind::Other(Opcode::Alloca) => {
                self.slots.push(None);
                Some(RuntimeValue::Address(Address::Slot(self.slots.len() - 1)))
            }
            InstructionKind::Other(Opcode::Binary(kind)) => {
                let lhs = self.operand(frame, i, 0)?.integer()?;
                let rhs = self.operand(frame, i, 1)?.integer()?;
                Some(RuntimeValue::Integer(binary(kind, lhs, rhs)))
            }
            InstructionKind::Other(Opcode::Emit) => {
                let value = self.operand(frame, i, 0)?.integer()?;
                self.output.push(value);
                None
            }
            InstructionKind::Other(Opcode::Jump) => {
                return Ok(Control::Jump(self.block_operand(i, 0)?));
            }
            InstructionKind::Other(Opcode::Branch) => {
                let condition = self.operand(frame, i, 0)?.integer()?;
                let target = if condition != 0 {
                    self.block_operand(i, 1)?
                } else {
                    self.block_operand(i, 2)?
                };
                return Ok(Control::Jump(target));
            }
            InstructionKind::Other(Opcode::Return) => {
                let value = match i.operand(0) {
                    Some(value) => Some(self.eval(frame, value)?),
                    None => None,
                };
                return Ok(Control::Return(value));
            }
        };

        if let (true, Some(result)) = (i.has_result(), result) {
            frame.results.insert(r, result);
        }

        Ok(Control::Continue)
    }
}

enum Control {
    Continue,
    Jump(Ref<Block>),
    Return(Option<RuntimeValue>),
}

fn binary(kind: BinaryOperationKind, lhs: i64, rhs: i64) -> i64 {
    match kind {
        BinaryOperationKind::Add => lhs.wrapping_add(rhs),
        BinaryOperationKind::Sub => lhs.wrapping_sub(rhs),
        BinaryOperationKind::Multiply => lhs.wrapping_mul(rhs),
        BinaryOperationKind::And => lhs & rhs,
        BinaryOperationKind::Or => lhs | rhs,
        BinaryOperationKind::Xor => lhs ^ rhs,
        BinaryOperationKind::CompareEqual => i64::from(lhs == rhs),
        BinaryOperationKind::CompareNotEqual => i64::from(lhs != rhs),
        BinaryOperationKind::CompareLessThan => i64::from(lhs < rhs),
        BinaryOperationKind::CompareGreaterThan => i64::from(lhs > rhs),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{InterpretError, Interpreter},
        crate::{
            builder::Builder,
            function::Signature,
            instruction::BinaryOperationKind,
            module::Module,
            types::Type,
            value::Value,
        },
        pretty_assertions::assert_eq,
    };

    #[test]
    fn arithmetic_through_stack_slots() {
        let mut m = Module::new();
        let f = m.add_function(
            "sum",
            Signature::new(Some(Type::s64()))
                .parameter("a", Type::s64())
                .parameter("b", Type::s64()),
        );
        let [a, b] = [0, 1].map(|i| Value::Parameter(m.function(f).parameters()[i]));
        let entry = m.append_block(f, "entry");

        let mut builder = Builder::new(&mut m, entry);
        let a_slot = builder.alloca();
        let b_slot = builder.alloca();
        builder.store(a, a_slot);
        builder.store(b, b_slot);
        let a = builder.load(a_slot, Type::s64());
        let b = builder.load(b_slot, Type::s64());
        let sum = builder.binary(BinaryOperationKind::Add, a, b);
        builder.emit(sum);
        builder.ret(Some(sum));

        let mut interpreter = Interpreter::new(&m);
        assert_eq!(interpreter.call(f, &[2, 40]), Ok(Some(42)));
        assert_eq!(interpreter.output(), &[42]);
    }

    #[test]
    fn branches_and_globals() {
        let mut m = Module::new();
        let f = m.add_function("max", Signature::new(None).parameter("a", Type::s64()));
        let a = Value::Parameter(m.function(f).parameters()[0]);
        let entry = m.append_block(f, "entry");
        let big = m.append_block(f, "big");
        let small = m.append_block(f, "small");

        let mut builder = Builder::new(&mut m, entry);
        let cond = builder.binary(BinaryOperationKind::CompareGreaterThan, a, Value::signed(10));
        builder.branch(cond, big, small);
        builder.position_at_end(big);
        builder.store(Value::signed(1), Value::global("out"));
        builder.ret(None);
        builder.position_at_end(small);
        builder.store(Value::signed(0), Value::global("out"));
        builder.ret(None);

        let mut interpreter = Interpreter::new(&m);
        interpreter.call(f, &[11]).unwrap();
        assert_eq!(interpreter.global("out"), Some(1));
        interpreter.call(f, &[3]).unwrap();
        assert_eq!(interpreter.global("out"), Some(0));
    }

    #[test]
    fn wrong_arity_and_declarations() {
        let mut m = Module::new();
        let decl = m.add_function("ext", Signature::new(None).parameter("a", Type::s64()));

        let mut interpreter = Interpreter::new(&m);
        assert_eq!(
            interpreter.call(decl, &[]),
            Err(InterpretError::ArityMismatch {
                function: "ext".into(),
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            interpreter.call(decl, &[1]),
            Err(InterpretError::Declaration("ext".into()))
        );
    }

    #[test]
    fn undefined_only_fails_when_used() {
        let mut m = Module::new();
        let f = m.add_function("f", Signature::new(Some(Type::s64())));
        let entry = m.append_block(f, "entry");

        let mut builder = Builder::new(&mut m, entry);
        let slot = builder.alloca();
        let loaded = builder.load(slot, Type::s64());
        builder.ret(Some(Value::signed(7)));

        let mut interpreter = Interpreter::new(&m);
        assert_eq!(interpreter.call(f, &[]), Ok(Some(7)));

        let mut builder = Builder::new(&mut m, entry);
        let ret = builder.module().block(entry).terminator().unwrap();
        builder.module().erase_instruction(ret).unwrap();
        builder.emit(loaded);
        builder.ret(None);

        let mut interpreter = Interpreter::new(&m);
        assert_eq!(interpreter.call(f, &[]), Err(InterpretError::Uninitialized));
    }

    #[test]
    fn infinite_loop_hits_step_limit() {
        let mut m = Module::new();
        let f = m.add_function("spin", Signature::new(None));
        let entry = m.append_block(f, "entry");
        Builder::new(&mut m, entry).jump(entry);

        let mut interpreter = Interpreter::new(&m).with_step_limit(100);
        assert_eq!(interpreter.call(f, &[]), Err(InterpretError::StepLimit(100)));
    }

    #[test]
    fn globals_are_visible_to_loads() {
        let mut m = Module::new();
        let f = m.add_function("read", Signature::new(Some(Type::s64())));
        let entry = m.append_block(f, "entry");

        let mut builder = Builder::new(&mut m, entry);
        let loaded = builder.load(Value::global("counter"), Type::s64());
        let next = builder.binary(BinaryOperationKind::Add, loaded, Value::signed(1));
        builder.store(next, Value::global("counter"));
        builder.ret(Some(next));

        let mut interpreter = Interpreter::new(&m);
        interpreter.set_global("counter", 41);
        assert_eq!(interpreter.call(f, &[]), Ok(Some(42)));
        assert_eq!(interpreter.global("counter"), Some(42));
    }
}
