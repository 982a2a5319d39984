//! Module fixtures shared by the unit tests

use ir::{
    arena::Ref,
    builder::Builder,
    function::{Function, Signature},
    instruction::{BinaryOperationKind, Instruction},
    module::Module,
    types::Type,
    value::Value,
};

/// Installs a logger for the test binary, ignoring repeated initialisation
pub fn init_logger() {
    let _ = pretty_env_logger::formatted_builder()
        .is_test(true)
        .parse_filters("dae=trace")
        .try_init();
}

pub fn param(m: &Module, f: Ref<Function>, index: usize) -> Value {
    Value::Parameter(m.function(f).parameters()[index])
}

/// `fn name(params...) -> i64` spilling every parameter to a stack slot in the
/// entry block, then loading the `used` ones back, emitting and returning
/// their sum
pub fn spilled_function(
    m: &mut Module,
    name: &str,
    params: &[&str],
    used: &[&str],
) -> Ref<Function> {
    let signature = params
        .iter()
        .fold(Signature::new(Some(Type::s64())), |s, p| s.parameter(*p, Type::s64()));
    let f = m.add_function(name, signature);
    let parameters = (0..params.len()).map(|i| param(m, f, i)).collect::<Vec<_>>();
    let entry = m.append_block(f, "entry");

    let mut builder = Builder::new(m, entry);
    let slots = parameters
        .iter()
        .map(|p| {
            let slot = builder.alloca();
            builder.store(*p, slot);
            slot
        })
        .collect::<Vec<_>>();

    let mut sum = Value::signed(0);
    for name in used {
        let index = params
            .iter()
            .position(|p| p == name)
            .unwrap_or_else(|| panic!("{name} is not a parameter"));
        let loaded = builder.load(slots[index], Type::s64());
        sum = builder.binary(BinaryOperationKind::Add, sum, loaded);
    }
    builder.emit(sum);
    builder.ret(Some(sum));

    f
}

/// `fn name() -> ?` calling `callee` with `args` and returning its result
pub fn call_from(
    m: &mut Module,
    name: &str,
    callee: Ref<Function>,
    args: Vec<Value>,
) -> (Ref<Function>, Ref<Instruction>) {
    let return_type = m.function(callee).return_type();
    let f = m.add_function(name, Signature::new(return_type.clone()));
    let entry = m.append_block(f, "entry");

    let mut builder = Builder::new(m, entry);
    let call = builder.call(callee, args);
    builder.ret(return_type.map(|_| Value::Instruction(call)));

    (f, call)
}
