//! Dead parameter analysis
//!
//! Recognises one narrow pattern: a parameter spilled to a stack slot in the
//! entry block whose slot is never loaded back into a used value. Anything
//! else about a parameter (stored outside the entry block, stored twice, used
//! directly, slot address escaping) keeps it live.

use {
    ir::{
        arena::Ref,
        function::{Function, Parameter},
        instruction::{InstructionKind, Opcode},
        module::Module,
        value::Value,
        HashMap, HashSet,
    },
    log::trace,
    std::collections::BTreeSet,
};

pub struct DeadParameterAnalysis {
    /// Stack slot address to the parameter spilled into it in the entry block
    stored_parameters: HashMap<Value, Ref<Parameter>>,
    /// Loaded value to the address it was loaded from
    loads: HashMap<Value, Value>,
    /// Parameters whose value can be observed by the body
    live: HashSet<Ref<Parameter>>,
    dead: BTreeSet<usize>,
}

struct DeadParameterAnalysisBuilder<'m> {
    module: &'m Module,
    f: Ref<Function>,
    inner: DeadParameterAnalysis,
}

impl<'m> DeadParameterAnalysisBuilder<'m> {
    fn analyse(&mut self) {
        self.map_stores();
        self.map_loads();
        self.propagate_liveness();
        self.collect_dead();
    }

    fn parameters(&self) -> &'m [Ref<Parameter>] {
        self.module.function(self.f).parameters()
    }

    fn is_local_slot(&self, address: Value) -> bool {
        address.as_instruction().is_some_and(|i| {
            self.module.instruction(i).kind() == InstructionKind::Other(Opcode::Alloca)
                && self.module.owning_function(address) == Some(self.f)
        })
    }

    /// Records `address -> parameter` for every parameter stored to a stack
    /// slot in the entry block
    fn map_stores(&mut self) {
        let Some(entry) = self.module.function(self.f).entry_block() else {
            return;
        };

        for i in self.module.block(entry).instructions() {
            let instruction = self.module.instruction(*i);

            let (Some(Value::Parameter(p)), Some(address)) =
                (instruction.stored_value(), instruction.store_address())
            else {
                continue;
            };

            if self.module.parameter(p).function() != self.f {
                continue;
            }

            if !self.is_local_slot(address) {
                trace!("{p:?} stored to non-local {address:?}, treating as live");
                self.inner.live.insert(p);
                continue;
            }

            if let Some(previous) = self.inner.stored_parameters.insert(address, p) {
                // two parameters spilled into one slot, the first is clobbered
                // but the slot may still be read, keep both
                self.inner.live.insert(previous);
                self.inner.live.insert(p);
            }
        }
    }

    /// Records `loaded value -> source address` for every load in the function
    fn map_loads(&mut self) {
        for i in self.module.instructions_of(self.f) {
            if let Some(address) = self.module.instruction(i).load_address() {
                self.inner.loads.insert(Value::Instruction(i), address);
            }
        }
    }

    /// Marks every parameter whose spill slot is read back through a load
    /// whose result is used, along with parameters whose use cannot be
    /// accounted for by the spill pattern
    fn propagate_liveness(&mut self) {
        let mut spills = HashMap::<Ref<Parameter>, usize>::default();

        for i in self.module.instructions_of(self.f) {
            let instruction = self.module.instruction(i);

            for (index, operand) in instruction.operands().iter().enumerate() {
                if let Some(address) = self.inner.loads.get(operand) {
                    if let Some(p) = self.inner.stored_parameters.get(address) {
                        trace!("{p:?} read through {operand:?}");
                        self.inner.live.insert(*p);
                    }
                }

                match (instruction.kind(), index, *operand) {
                    // the spill itself
                    (InstructionKind::Store, 0, Value::Parameter(p))
                        if instruction
                            .store_address()
                            .is_some_and(|a| self.inner.stored_parameters.get(&a) == Some(&p)) =>
                    {
                        *spills.entry(p).or_default() += 1;
                    }

                    // any other direct use of a parameter
                    (_, _, Value::Parameter(p)) => {
                        self.inner.live.insert(p);
                    }

                    // slot addresses may only be written to or loaded from
                    (InstructionKind::Store, 1, _) | (InstructionKind::Load, 0, _) => {}
                    (_, _, address) => {
                        if let Some(p) = self.inner.stored_parameters.get(&address) {
                            trace!("address of {p:?}'s slot escapes into {i:?}");
                            self.inner.live.insert(*p);
                        }
                    }
                }
            }
        }

        // a parameter spilled more than once (in a loop back to the entry
        // block, or to two slots) is outside the recognised pattern
        for (p, count) in spills {
            if count != 1 {
                self.inner.live.insert(p);
            }
        }
    }

    fn collect_dead(&mut self) {
        let spilled = self
            .inner
            .stored_parameters
            .values()
            .copied()
            .collect::<HashSet<_>>();

        self.inner.dead = self
            .parameters()
            .iter()
            .filter(|p| spilled.contains(*p) && !self.inner.live.contains(*p))
            .map(|p| self.module.parameter(*p).index())
            .collect();
    }
}

impl DeadParameterAnalysis {
    /// Runs the analysis over the body of `f`, declarations have no dead
    /// parameters
    pub fn new(module: &Module, f: Ref<Function>) -> Self {
        let mut builder = DeadParameterAnalysisBuilder {
            module,
            f,
            inner: Self {
                stored_parameters: HashMap::default(),
                loads: HashMap::default(),
                live: HashSet::default(),
                dead: BTreeSet::new(),
            },
        };

        builder.analyse();
        builder.inner
    }

    /// Positional indices of the dead parameters, ascending
    pub fn dead_indices(&self) -> &BTreeSet<usize> {
        &self.dead
    }

    pub fn is_dead(&self, index: usize) -> bool {
        self.dead.contains(&index)
    }

    pub fn has_dead_parameters(&self) -> bool {
        !self.dead.is_empty()
    }

    /// Slot the parameter was spilled into in the entry block, if any
    pub fn spill_slot(&self, p: Ref<Parameter>) -> Option<Value> {
        self.stored_parameters
            .iter()
            .find(|(_, candidate)| **candidate == p)
            .map(|(address, _)| *address)
    }
}
