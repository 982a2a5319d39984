//! Clones a function with a reduced parameter list

use {
    crate::{table::Replacement, Error},
    ir::{
        arena::Ref,
        function::{Function, Signature},
        instruction::Instruction,
        module::{Location, Module},
        value::Value,
        HashMap,
    },
    log::{debug, trace},
    std::collections::BTreeSet,
};

/// Creates a copy of `f` without the parameters at the `dead` indices
///
/// Stores spilling a dead parameter are omitted from the copy, everything else
/// is cloned and then relinked to the copy's own parameters, blocks and
/// instructions. `f` itself is left untouched.
pub fn clone_without_parameters(
    module: &mut Module,
    f: Ref<Function>,
    dead: &BTreeSet<usize>,
    suffix: &str,
) -> Result<Replacement, Error> {
    let function = module.function(f).clone();
    if function.is_declaration() {
        return Err(Error::NoBody(function.name()));
    }

    // build new signature, skipping dead parameters
    let mut signature = Signature::new(function.return_type()).linkage(function.linkage());
    signature.variadic = function.is_variadic();
    let mut dropped = Vec::new();
    for (index, p) in function.parameters().iter().enumerate() {
        if dead.contains(&index) {
            dropped.push(index);
        } else {
            let p = module.parameter(*p);
            signature = signature.parameter(p.name(), p.typ());
        }
    }

    let name = format!("{}{suffix}", function.name());
    let new_function = module.add_function(name.as_str(), signature);

    debug!(
        "cloning {} as {name}, dropping parameters {dropped:?}",
        function.name()
    );

    let dead_parameters = dropped
        .iter()
        .map(|index| Value::Parameter(function.parameters()[*index]))
        .collect::<Vec<_>>();

    // old value -> new value, dead parameters have no counterpart
    let mut mapping = HashMap::<Value, Value>::default();
    let retained = function
        .parameters()
        .iter()
        .enumerate()
        .filter(|(index, _)| !dead.contains(index))
        .map(|(_, p)| *p);
    for (old, new) in retained.zip(module.function(new_function).parameters().to_vec()) {
        mapping.insert(Value::Parameter(old), Value::Parameter(new));
    }

    let mut cloned = Vec::<Ref<Instruction>>::new();
    for old_block in function.blocks() {
        let new_block = module.append_block(new_function, module.block(*old_block).name());
        mapping.insert(Value::Block(*old_block), Value::Block(new_block));

        for i in module.block(*old_block).instructions().to_vec() {
            let instruction = module.instruction(i);
            if instruction
                .stored_value()
                .is_some_and(|v| dead_parameters.contains(&v))
            {
                trace!("omitting spill of dead parameter in {i:?}");
                continue;
            }

            let clone = module.clone_instruction(i);
            let new = module.insert_instruction(new_block, clone, Location::End)?;
            mapping.insert(Value::Instruction(i), Value::Instruction(new));
            cloned.push(new);
        }
    }

    // operands of the clones still point into `f`, relink them now every
    // clone exists
    for i in &cloned {
        let operands = module.instruction(*i).operands().to_vec();
        for (index, operand) in operands.into_iter().enumerate() {
            if let Some(new) = mapping.get(&operand) {
                trace!("relinking operand {index} of {i:?}: {operand:?} -> {new:?}");
                module.set_operand(*i, index, *new);
            }
        }
    }

    check_self_contained(module, new_function, &cloned)?;

    Ok(Replacement {
        function: new_function,
        dropped,
    })
}

/// Every function-local operand of the clones must belong to the clone
fn check_self_contained(
    module: &Module,
    f: Ref<Function>,
    cloned: &[Ref<Instruction>],
) -> Result<(), Error> {
    for i in cloned {
        for operand in module.instruction(*i).operands() {
            if operand.is_local() && module.owning_function(*operand) != Some(f) {
                return Err(Error::UnresolvedOperand {
                    function: module.function(f).name(),
                    operand: module.display_value(*operand),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::clone_without_parameters,
        crate::{
            testing::{param, spilled_function},
            Error,
        },
        ir::{
            builder::Builder,
            function::{Linkage, Signature},
            instruction::{BinaryOperationKind, InstructionKind},
            interpret::Interpreter,
            module::Module,
            types::Type,
            value::Value,
        },
        pretty_assertions::assert_eq,
        std::collections::BTreeSet,
    };

    fn indices(i: &[usize]) -> BTreeSet<usize> {
        i.iter().copied().collect()
    }

    fn parameter_names(m: &Module, f: ir::arena::Ref<ir::function::Function>) -> Vec<String> {
        m.function(f)
            .parameters()
            .iter()
            .map(|p| m.parameter(*p).name().to_string())
            .collect()
    }

    #[test]
    fn signature_keeps_relative_order() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a", "b", "c", "d"], &["b", "d"]);

        let replacement = clone_without_parameters(&mut m, f, &indices(&[2, 0]), "_new").unwrap();

        assert_eq!(replacement.dropped, vec![0, 2]);
        assert_eq!(parameter_names(&m, replacement.function), vec!["b", "d"]);
        assert_eq!(m.function(replacement.function).name().as_ref(), "f_new");
        assert_eq!(
            m.function(replacement.function).arity(),
            m.function(f).arity() - 2
        );
        assert_eq!(
            m.function(replacement.function).return_type(),
            m.function(f).return_type()
        );
    }

    #[test]
    fn dead_spills_are_omitted() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a", "b"], &["b"]);
        let a = param(&m, f, 0);

        let replacement = clone_without_parameters(&mut m, f, &indices(&[0]), "_new").unwrap();

        let original = m.instructions_of(f);
        let clone = m.instructions_of(replacement.function);
        assert_eq!(clone.len(), original.len() - 1);

        let stores = clone
            .iter()
            .filter(|i| m.instruction(**i).kind() == InstructionKind::Store)
            .count();
        assert_eq!(stores, 1);

        // original untouched
        assert_eq!(m.users_of(a).len(), 1);
    }

    #[test]
    fn clone_is_self_contained() {
        let mut m = Module::new();
        let f = spilled_function(&mut m, "f", &["a", "b"], &["b"]);

        let replacement = clone_without_parameters(&mut m, f, &indices(&[0]), "_new").unwrap();

        for i in m.instructions_of(replacement.function) {
            for operand in m.instruction(i).operands() {
                if operand.is_local() {
                    assert_eq!(m.owning_function(*operand), Some(replacement.function));
                }
            }
        }
        assert_eq!(
            m.block(m.function(replacement.function).entry_block().unwrap())
                .name()
                .as_ref(),
            "entry"
        );
    }

    #[test]
    fn forward_block_references_are_relinked() {
        let mut m = Module::new();
        let f = m.add_function(
            "f",
            Signature::new(Some(Type::s64()))
                .parameter("a", Type::s64())
                .parameter("b", Type::s64())
                .linkage(Linkage::Internal),
        );
        let [a, b] = [0, 1].map(|i| param(&m, f, i));
        let entry = m.append_block(f, "entry");
        let positive = m.append_block(f, "positive");
        let negative = m.append_block(f, "negative");

        let mut builder = Builder::new(&mut m, entry);
        let a_slot = builder.alloca();
        let b_slot = builder.alloca();
        builder.store(a, a_slot);
        builder.store(b, b_slot);
        let loaded = builder.load(b_slot, Type::s64());
        let cond = builder.binary(
            BinaryOperationKind::CompareGreaterThan,
            loaded,
            Value::signed(0),
        );
        builder.branch(cond, positive, negative);
        builder.position_at_end(positive);
        builder.ret(Some(Value::signed(1)));
        builder.position_at_end(negative);
        let reloaded = builder.load(b_slot, Type::s64());
        builder.ret(Some(reloaded));

        let replacement = clone_without_parameters(&mut m, f, &indices(&[0]), ".pruned").unwrap();
        let g = replacement.function;
        assert_eq!(m.function(g).name().as_ref(), "f.pruned");
        assert_eq!(m.function(g).linkage(), Linkage::Internal);

        let mut interpreter = Interpreter::new(&m);
        for b in [-3, 0, 9] {
            assert_eq!(
                interpreter.call(f, &[1234, b]).unwrap(),
                interpreter.call(g, &[b]).unwrap()
            );
        }
    }

    #[test]
    fn declarations_are_rejected() {
        let mut m = Module::new();
        let f = m.add_function("ext", Signature::new(None).parameter("a", Type::s64()));

        assert!(matches!(
            clone_without_parameters(&mut m, f, &indices(&[0]), "_new"),
            Err(Error::NoBody(_))
        ));
        assert_eq!(m.functions(), &[f]);
    }

    #[test]
    fn direct_use_of_dropped_parameter_is_unresolved() {
        let mut m = Module::new();
        let f = m.add_function("f", Signature::new(None).parameter("a", Type::s64()));
        let a = param(&m, f, 0);
        let entry = m.append_block(f, "entry");
        let mut builder = Builder::new(&mut m, entry);
        builder.emit(a);
        builder.ret(None);

        // the analysis would never report `a` dead, force it
        assert!(matches!(
            clone_without_parameters(&mut m, f, &indices(&[0]), "_new"),
            Err(Error::UnresolvedOperand { .. })
        ));
    }
}
