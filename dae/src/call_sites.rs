//! Redirects calls of replaced functions to their replacements

use {
    crate::{
        table::{RemovalQueue, Replacements},
        Error,
    },
    ir::{
        instruction::InstructionKind,
        module::{Location, Module},
        value::Value,
    },
    log::{debug, trace},
};

/// Rewrites every call to an original function in `replacements` into a call
/// to its replacement with the dropped arguments pruned
///
/// New calls are inserted directly before the calls they supersede, which are
/// scheduled for removal rather than erased. Calls to variadic functions are
/// left untouched. Returns the number of calls rewritten.
pub fn rewrite_call_sites(
    module: &mut Module,
    replacements: &Replacements,
    queue: &mut RemovalQueue,
) -> Result<usize, Error> {
    let mut rewritten = 0;

    for f in module.functions().to_vec() {
        for old_call in module.instructions_of(f) {
            let instruction = module.instruction(old_call);
            let Some(target) = instruction.call_target() else {
                continue;
            };
            let Some(replacement) = replacements.get(target) else {
                continue;
            };

            let callee = module.function(target);
            if callee.is_variadic() {
                debug!(
                    "not rewriting call to variadic {} in {}",
                    callee.name(),
                    module.function(f).name()
                );
                continue;
            }

            let args = instruction.operands();
            if args.len() != callee.arity() {
                return Err(Error::ArityMismatch {
                    callee: callee.name(),
                    expected: callee.arity(),
                    found: args.len(),
                });
            }

            let pruned = prune(args, &replacement.dropped);
            let block = instruction.block();
            let typ = module.function(replacement.function).return_type();

            let new_call = module.build_at(
                block,
                InstructionKind::Call {
                    target: replacement.function,
                },
                pruned,
                typ,
                Location::Before(old_call),
            )?;

            trace!(
                "rewrote call {old_call:?} to {} as {new_call:?}",
                module.function(replacement.function).name()
            );

            module.replace_all_uses(Value::Instruction(old_call), Value::Instruction(new_call));
            queue.schedule_instruction(old_call);
            rewritten += 1;
        }
    }

    Ok(rewritten)
}

/// Drops the arguments at `dropped` (ascending) from `args`
fn prune(args: &[Value], dropped: &[usize]) -> Vec<Value> {
    let mut dropped = dropped.iter().peekable();

    args.iter()
        .enumerate()
        .filter_map(|(index, arg)| {
            if dropped.next_if_eq(&&index).is_some() {
                None
            } else {
                Some(*arg)
            }
        })
        .collect()
}
