//! Built-in matching strategies.

use std::sync::Arc;

use super::{MatchStrategy, MatcherRegistry, Predicate};
use crate::descriptor::Descriptor;
use crate::function::Class;
use crate::value::Value;

/// The built-in strategies, in priority order.
pub(super) fn builtins() -> Vec<Arc<dyn MatchStrategy>> {
    vec![
        Arc::new(KindStrategy),
        Arc::new(AnyStrategy),
        Arc::new(EitherStrategy),
        Arc::new(MatcherStrategy),
        Arc::new(TagStrategy),
        Arc::new(ClassStrategy),
        Arc::new(NullStrategy),
        Arc::new(UndefinedStrategy),
    ]
}

/// Primitive kinds: function, boolean, number, array, date, regex, object, string.
pub struct KindStrategy;

impl MatchStrategy for KindStrategy {
    fn name(&self) -> &str {
        "kind"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Kind(_))
    }

    fn build(&self, descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        match descriptor {
            Descriptor::Kind(kind) => {
                let kind = *kind;
                Predicate::new(move |value| kind.test(value))
            }
            _ => Predicate::never(),
        }
    }

    fn test(&self, descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        matches!(descriptor, Descriptor::Kind(kind) if kind.test(value))
    }
}

/// `Any` accepts every value.
pub struct AnyStrategy;

impl MatchStrategy for AnyStrategy {
    fn name(&self) -> &str {
        "any"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Any)
    }

    fn build(&self, _descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        Predicate::always()
    }

    fn test(&self, _descriptor: &Descriptor, _value: &Value, _registry: &MatcherRegistry) -> bool {
        true
    }
}

/// `Either` accepts a value if any member does, checking members in order.
///
/// Members are resolved on every test, so strategies appended after the
/// predicate was built still apply to them.
pub struct EitherStrategy;

impl MatchStrategy for EitherStrategy {
    fn name(&self) -> &str {
        "either"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Either(_))
    }

    fn build(&self, descriptor: &Descriptor, registry: &MatcherRegistry) -> Predicate {
        let Descriptor::Either(members) = descriptor else {
            return Predicate::never();
        };
        let members = Arc::clone(members);
        let registry = registry.clone();
        Predicate::new(move |value| members.iter().any(|m| registry.matches(m, value)))
    }

    fn test(&self, descriptor: &Descriptor, value: &Value, registry: &MatcherRegistry) -> bool {
        match descriptor {
            Descriptor::Either(members) => members.iter().any(|m| registry.matches(m, value)),
            _ => false,
        }
    }
}

/// `Matcher` runs the user predicate; failures were already folded into
/// non-matches when the matcher was built.
pub struct MatcherStrategy;

impl MatchStrategy for MatcherStrategy {
    fn name(&self) -> &str {
        "matcher"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Matcher(_))
    }

    fn build(&self, descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        match descriptor {
            Descriptor::Matcher(matcher) => {
                let matcher = matcher.clone();
                Predicate::new(move |value| matcher.test(value))
            }
            _ => Predicate::never(),
        }
    }

    fn test(&self, descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        matches!(descriptor, Descriptor::Matcher(matcher) if matcher.test(value))
    }
}

/// String tags compare against the value's `typeof` tag.
pub struct TagStrategy;

impl MatchStrategy for TagStrategy {
    fn name(&self) -> &str {
        "tag"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Tag(_))
    }

    fn build(&self, descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        match descriptor {
            Descriptor::Tag(tag) => {
                let tag = Arc::clone(tag);
                Predicate::new(move |value| value.type_tag() == &*tag)
            }
            _ => Predicate::never(),
        }
    }

    fn test(&self, descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        matches!(descriptor, Descriptor::Tag(tag) if value.type_tag() == &**tag)
    }
}

/// Classes use dynamic instance-of, subclasses included.
pub struct ClassStrategy;

impl MatchStrategy for ClassStrategy {
    fn name(&self) -> &str {
        "class"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Class(_))
    }

    fn build(&self, descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        match descriptor {
            Descriptor::Class(class) => {
                let class = class.clone();
                Predicate::new(move |value| instance_of(value, &class))
            }
            _ => Predicate::never(),
        }
    }

    fn test(&self, descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        matches!(descriptor, Descriptor::Class(class) if instance_of(value, class))
    }
}

fn instance_of(value: &Value, class: &Class) -> bool {
    match value {
        Value::Instance(instance) => instance.is_instance_of(class),
        _ => false,
    }
}

/// Exactly `null`. Kept separate from [`UndefinedStrategy`].
pub struct NullStrategy;

impl MatchStrategy for NullStrategy {
    fn name(&self) -> &str {
        "null"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Null)
    }

    fn build(&self, _descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        Predicate::new(Value::is_null)
    }

    fn test(&self, _descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        value.is_null()
    }
}

/// Exactly `undefined`.
pub struct UndefinedStrategy;

impl MatchStrategy for UndefinedStrategy {
    fn name(&self) -> &str {
        "undefined"
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        matches!(descriptor, Descriptor::Undefined)
    }

    fn build(&self, _descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
        Predicate::new(Value::is_undefined)
    }

    fn test(&self, _descriptor: &Descriptor, value: &Value, _registry: &MatcherRegistry) -> bool {
        value.is_undefined()
    }
}
