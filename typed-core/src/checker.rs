//! Argument list checking.
//!
//! An argument list matches a descriptor list iff both have the same length
//! and every argument matches the descriptor at its position. This is the
//! only rule guarded calls and overload dispatch use to accept a call.

use crate::descriptor::Descriptor;
use crate::registry::MatcherRegistry;
use crate::value::Value;

/// Why an argument list was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The argument count differs from the descriptor count.
    Arity { expected: usize, found: usize },
    /// The argument at `index` does not match its descriptor.
    Position { index: usize },
}

/// Checks an argument list against the global registry.
pub fn check_types(descriptors: &[Descriptor], values: &[Value]) -> bool {
    check_types_in(MatcherRegistry::global(), descriptors, values)
}

/// Checks an argument list against an explicit registry.
pub fn check_types_in(
    registry: &MatcherRegistry,
    descriptors: &[Descriptor],
    values: &[Value],
) -> bool {
    first_mismatch_in(registry, descriptors, values).is_none()
}

/// Reports the first reason an argument list fails, using the global registry.
pub fn first_mismatch(descriptors: &[Descriptor], values: &[Value]) -> Option<Mismatch> {
    first_mismatch_in(MatcherRegistry::global(), descriptors, values)
}

/// Reports the first reason an argument list fails.
///
/// Arity is checked before any descriptor is evaluated, so a wrong-length
/// list never runs a user predicate.
pub fn first_mismatch_in(
    registry: &MatcherRegistry,
    descriptors: &[Descriptor],
    values: &[Value],
) -> Option<Mismatch> {
    if descriptors.len() != values.len() {
        return Some(Mismatch::Arity {
            expected: descriptors.len(),
            found: values.len(),
        });
    }

    descriptors
        .iter()
        .zip(values)
        .position(|(descriptor, value)| !registry.matches(descriptor, value))
        .map(|index| Mismatch::Position { index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Class;

    #[test]
    fn test_empty_lists_match() {
        assert!(check_types(&[], &[]));
    }

    #[test]
    fn test_arity_checked_first() {
        let descriptors = [Descriptor::Any, Descriptor::Any];
        assert_eq!(
            first_mismatch(&descriptors, &[Value::from(1)]),
            Some(Mismatch::Arity { expected: 2, found: 1 })
        );
        assert_eq!(
            first_mismatch(&[], &[Value::Undefined]),
            Some(Mismatch::Arity { expected: 0, found: 1 })
        );
    }

    #[test]
    fn test_position_reported() {
        let custom = Class::new("Custom");
        let descriptors = [Descriptor::STRING, Descriptor::NUMBER, Descriptor::from(&custom)];

        let ok = [Value::from("ab"), Value::from(3), Value::from(custom.instantiate())];
        assert!(check_types(&descriptors, &ok));

        let bad = [Value::from("ab"), Value::from(3), Value::object()];
        assert_eq!(first_mismatch(&descriptors, &bad), Some(Mismatch::Position { index: 2 }));

        let worse = [Value::from(1), Value::from("x"), Value::object()];
        assert_eq!(first_mismatch(&descriptors, &worse), Some(Mismatch::Position { index: 0 }));
    }

    #[test]
    fn test_wrong_arity_never_runs_predicates() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let ran = Arc::new(AtomicBool::new(false));
        let watch = {
            let ran = Arc::clone(&ran);
            Descriptor::matcher(move |_: &Value| {
                ran.store(true, Ordering::SeqCst);
                true
            })
        };

        assert!(!check_types(&[watch], &[Value::from(1), Value::from(2)]));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
