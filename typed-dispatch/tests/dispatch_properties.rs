//! Guarded calls and overload tables accept exactly what `check_types` accepts.

use proptest::prelude::*;
use typed_core::{check_types, Descriptor, Function, PrimitiveKind, Value};
use typed_dispatch::{type_checked, ErrorHook, Overload};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-100i32..100).prop_map(Value::from),
        "[a-z]{0,3}".prop_map(Value::from),
        Just(Value::object()),
        prop::collection::vec((-5i32..5).prop_map(Value::from), 0..3).prop_map(Value::array),
    ]
}

fn arb_descriptor() -> impl Strategy<Value = Descriptor> {
    let leaf = prop_oneof![
        Just(Descriptor::Any),
        Just(Descriptor::Null),
        Just(Descriptor::Undefined),
        prop::sample::select(PrimitiveKind::ALL.to_vec()).prop_map(Descriptor::Kind),
    ];
    leaf.prop_recursive(1, 4, 2, |inner| {
        prop::collection::vec(inner, 1..3).prop_map(Descriptor::either)
    })
}

fn arb_signature() -> impl Strategy<Value = Vec<Descriptor>> {
    prop::collection::vec(arb_descriptor(), 0..3)
}

proptest! {
    #[test]
    fn guard_accepts_iff_check_types(
        signature in arb_signature(),
        args in prop::collection::vec(arb_value(), 0..3),
    ) {
        let guarded = type_checked(signature.clone(), Function::from_args(|_| Ok(Value::from("ran"))));
        let outcome = guarded.call(&args);
        if check_types(&signature, &args) {
            prop_assert_eq!(outcome.unwrap(), Value::from("ran"));
        } else {
            prop_assert!(outcome.unwrap_err().is_type_mismatch());
        }

        guarded.on_error(Some(ErrorHook::new(|_, _, _| Ok(()))));
        let swallowed = guarded.call(&args).unwrap();
        prop_assert_eq!(swallowed.is_undefined(), !check_types(&signature, &args));
    }

    #[test]
    fn overload_runs_first_accepting_clause(
        signatures in prop::collection::vec(arb_signature(), 0..5),
        args in prop::collection::vec(arb_value(), 0..3),
    ) {
        let mut table = Overload::with_value("default");
        for (index, signature) in signatures.iter().enumerate() {
            table = table.when(
                signature.clone(),
                Function::from_args(move |_| Ok(Value::from(index))),
            );
        }

        let expected = signatures
            .iter()
            .position(|signature| check_types(signature, &args))
            .map(Value::from)
            .unwrap_or_else(|| Value::from("default"));
        prop_assert_eq!(table.call(&args).unwrap(), expected);
    }
}
