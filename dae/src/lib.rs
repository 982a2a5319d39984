//! Dead argument elimination
//!
//! Finds parameters that are spilled to a stack slot on entry and never read
//! back, clones each affected function without them, and redirects every call
//! to the clone with the matching arguments pruned. Originals and superseded
//! calls are erased once nothing refers to them.

use {
    crate::{
        analysis::DeadParameterAnalysis,
        table::{RemovalQueue, ReplacementTable},
    },
    ir::{arena::Ref, function::Function, module::Module, value::Value, HashSet},
    itertools::Itertools,
    log::{debug, info, trace},
};

pub use crate::{
    config::{Config, ConfigLoadError},
    error::Error,
};

pub mod analysis;
pub mod call_sites;
pub mod config;
pub mod error;
pub mod rewrite;
pub mod table;
pub mod validator;

#[cfg(test)]
mod testing;

/// Runs dead argument elimination over the whole module
///
/// The transformation either completes or leaves `module` untouched. Returns
/// whether the module was changed.
pub fn run(module: &mut Module, config: &Config) -> Result<bool, Error> {
    let mut working = module.clone();

    if !eliminate(&mut working, config)? {
        return Ok(false);
    }

    if config.validate {
        let messages = validator::validate(&working);
        let errors = messages
            .iter()
            .filter(|m| m.is_error())
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        if !messages.is_empty() {
            debug!("validation:\n{}", messages.iter().join("\n"));
        }

        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
    }

    *module = working;
    Ok(true)
}

fn eliminate(module: &mut Module, config: &Config) -> Result<bool, Error> {
    let address_taken = address_taken_functions(module);

    let mut table = ReplacementTable::default();
    let mut queue = RemovalQueue::default();

    for f in module.functions().to_vec() {
        if !is_candidate(module, f, config, &address_taken) {
            continue;
        }

        let analysis = DeadParameterAnalysis::new(module, f);
        if !analysis.has_dead_parameters() {
            trace!("no dead parameters in {}", module.function(f).name());
            continue;
        }

        debug!(
            "dead parameters in {}: {:?}",
            module.function(f).name(),
            analysis.dead_indices()
        );

        let replacement =
            rewrite::clone_without_parameters(module, f, analysis.dead_indices(), &config.suffix)?;
        table.insert(module, f, replacement)?;
        queue.schedule_function(f);
    }

    if table.is_empty() {
        return Ok(false);
    }

    let replacements = table.finalize();
    for (original, replacement) in replacements.iter() {
        debug!(
            "{} -> {}, dropping {:?}",
            module.function(original).name(),
            module.function(replacement.function).name(),
            replacement.dropped
        );
    }

    let calls = call_sites::rewrite_call_sites(module, &replacements, &mut queue)?;
    let (instructions, functions) = queue.drain(module)?;

    info!(
        "replaced {} functions, rewrote {calls} calls, erased {instructions} calls and \
         {functions} functions",
        replacements.len()
    );

    Ok(true)
}

fn is_candidate(
    module: &Module,
    f: Ref<Function>,
    config: &Config,
    address_taken: &HashSet<Ref<Function>>,
) -> bool {
    let function = module.function(f);

    let reason = if function.is_declaration() {
        "declaration"
    } else if function.name().as_ref() == config.entry_point {
        "entry point"
    } else if function.is_variadic() {
        "variadic"
    } else if address_taken.contains(&f) {
        "address taken"
    } else {
        return true;
    };

    trace!("skipping {} ({reason})", function.name());
    false
}

/// Functions used as a value rather than as a call target
fn address_taken_functions(module: &Module) -> HashSet<Ref<Function>> {
    module
        .functions()
        .iter()
        .flat_map(|f| module.instructions_of(*f))
        .flat_map(|i| module.instruction(i).operands().to_vec())
        .filter_map(|v| match v {
            Value::Function(f) => Some(f),
            _ => None,
        })
        .collect()
}
