//! Convenience layer over [`Module::build`] for constructing function bodies

use crate::{
    arena::Ref,
    block::Block,
    function::Function,
    instruction::{BinaryOperationKind, Instruction, InstructionKind, Opcode},
    module::Module,
    types::Type,
    value::Value,
};

/// Appends instructions to the end of the current block
pub struct Builder<'m> {
    module: &'m mut Module,
    block: Ref<Block>,
}

impl<'m> Builder<'m> {
    pub fn new(module: &'m mut Module, block: Ref<Block>) -> Self {
        Self { module, block }
    }

    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    pub fn block(&self) -> Ref<Block> {
        self.block
    }

    pub fn position_at_end(&mut self, block: Ref<Block>) {
        self.block = block;
    }

    fn build(
        &mut self,
        kind: InstructionKind,
        operands: Vec<Value>,
        typ: Option<Type>,
    ) -> Ref<Instruction> {
        self.module.build(self.block, kind, operands, typ)
    }

    /// Allocates a stack slot, returning its address
    pub fn alloca(&mut self) -> Value {
        self.build(InstructionKind::Other(Opcode::Alloca), vec![], Some(Type::Pointer))
            .into()
    }

    pub fn store<V: Into<Value>>(&mut self, value: V, address: Value) -> Ref<Instruction> {
        self.build(InstructionKind::Store, vec![value.into(), address], None)
    }

    pub fn load(&mut self, address: Value, typ: Type) -> Value {
        self.build(InstructionKind::Load, vec![address], Some(typ))
            .into()
    }

    pub fn binary(&mut self, kind: BinaryOperationKind, lhs: Value, rhs: Value) -> Value {
        let typ = if kind.is_comparison() {
            Type::u1()
        } else {
            self.module.value_type(lhs).unwrap_or_else(Type::s64)
        };

        self.build(InstructionKind::Other(Opcode::Binary(kind)), vec![lhs, rhs], Some(typ))
            .into()
    }

    /// Calls `target`, the call produces a result iff the target has a return
    /// type
    pub fn call(&mut self, target: Ref<Function>, args: Vec<Value>) -> Ref<Instruction> {
        let typ = self.module.function(target).return_type();
        self.build(InstructionKind::Call { target }, args, typ)
    }

    pub fn emit(&mut self, value: Value) -> Ref<Instruction> {
        self.build(InstructionKind::Other(Opcode::Emit), vec![value], None)
    }

    pub fn ret(&mut self, value: Option<Value>) -> Ref<Instruction> {
        self.build(
            InstructionKind::Other(Opcode::Return),
            value.into_iter().collect(),
            None,
        )
    }

    pub fn jump(&mut self, target: Ref<Block>) -> Ref<Instruction> {
        self.build(InstructionKind::Other(Opcode::Jump), vec![target.into()], None)
    }

    pub fn branch(
        &mut self,
        condition: Value,
        true_target: Ref<Block>,
        false_target: Ref<Block>,
    ) -> Ref<Instruction> {
        self.build(
            InstructionKind::Other(Opcode::Branch),
            vec![condition, true_target.into(), false_target.into()],
            None,
        )
    }
}
