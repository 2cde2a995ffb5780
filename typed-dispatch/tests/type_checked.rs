//! Guarded calls and their error hook.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use typed_core::{Class, Descriptor, Function, Signature, TypedError, Value};
use typed_dispatch::{type_checked, ErrorHook, TypeChecked};

/// `(String, Number, Custom)`: stores `s.repeat(n)` on the custom instance.
fn typed_fn(custom: &Class) -> TypeChecked {
    type_checked(
        [Descriptor::STRING, Descriptor::NUMBER, Descriptor::from(custom)],
        Function::from_args(|args| {
            let s = args[0].as_str().unwrap_or_default();
            let n = args[1].as_number().unwrap_or(0.0) as usize;
            args[2].set("result", s.repeat(n))?;
            Ok(args[2].clone())
        }),
    )
}

fn custom_class() -> Class {
    Class::new("Custom")
}

fn new_custom(class: &Class) -> Value {
    Value::from(class.instantiate_with([("type", "custo")]))
}

#[test]
fn test_correct_types() {
    let custom = custom_class();
    let f = typed_fn(&custom);
    let result = f
        .call(&[Value::from("ab"), Value::from(3), new_custom(&custom)])
        .unwrap();
    assert_eq!(result.get("type").unwrap(), Value::from("custo"));
    assert_eq!(result.get("result").unwrap(), Value::from("ababab"));
}

#[test]
fn test_raises_by_default() {
    let f = typed_fn(&custom_class());
    let err = f
        .call(&[Value::from("incorrect"), Value::from("types")])
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[derive(Debug)]
struct Reported {
    error: TypedError,
    args: Vec<Value>,
    types: Signature,
}

#[test]
fn test_hook_receives_error_args_and_types() {
    let f = typed_fn(&custom_class());
    let reported: Arc<Mutex<Option<Reported>>> = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&reported);
    f.on_error(Some(ErrorHook::new(move |error, args, types| {
        *sink.lock() = Some(Reported {
            error: error.clone(),
            args: args.to_vec(),
            types: types.clone(),
        });
        Ok(())
    })));

    let swallowed = f
        .call(&[Value::from("incorrect"), Value::from("types")])
        .unwrap();
    assert_eq!(swallowed, Value::Undefined);

    f.call(&[Value::from("a"), Value::from("2")]).unwrap();
    let reported = reported.lock();
    let reported = reported.as_ref().expect("hook was called");
    assert!(reported.error.is_type_mismatch());
    assert_eq!(reported.types.len(), 3);
    assert_eq!(reported.args.len(), 2);
    assert_eq!(reported.args[1], Value::from("2"));
}

#[test]
fn test_resetting_hook_raises_again() {
    let f = typed_fn(&custom_class());
    f.on_error(Some(ErrorHook::new(|_, _, _| Ok(()))));
    assert!(f.call(&[Value::from("incorrect"), Value::from("types")]).is_ok());

    f.on_error(None);
    let err = f
        .call(&[Value::from("incorrect"), Value::from("types")])
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn test_hook_is_not_consulted_on_success() {
    let custom = custom_class();
    let f = typed_fn(&custom);
    f.on_error(Some(ErrorHook::new(|_, _, _| {
        Err(TypedError::handler("hook should not run"))
    })));
    assert!(f
        .call(&[Value::from("x"), Value::from(1), new_custom(&custom)])
        .is_ok());
}

#[test]
fn test_mismatch_message_names_the_argument() {
    let f = typed_fn(&custom_class());
    let err = f
        .call(&[Value::from("a"), Value::from("b"), Value::Null])
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("type mismatch: expected (String, Number, Custom)"), "{}", message);
    assert!(message.contains("argument 1"), "{}", message);
}
