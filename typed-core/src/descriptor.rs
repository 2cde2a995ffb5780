//! Type descriptors.
//!
//! A [`Descriptor`] describes what an argument must look like. Descriptors
//! are immutable once built; evaluating one never has side effects apart
//! from running a [`Matcher`]'s user predicate.
//!
//! | Descriptor            | Matches                                        |
//! |-----------------------|------------------------------------------------|
//! | `Any`                 | every value, including `null` and `undefined`  |
//! | `Kind(PrimitiveKind)` | values of an intrinsic kind                    |
//! | `Tag("number")`       | values whose `typeof` tag is the string        |
//! | `Class(c)`            | instances of `c` or of any subclass            |
//! | `Null` / `Undefined`  | exactly `null` / exactly `undefined`           |
//! | `Either([..])`        | values matching any member, first success wins |
//! | `Matcher(p)`          | values for which `p` yields a truthy verdict   |
//! | `Extension(e)`        | whatever an appended strategy decides          |

use std::any::Any;
use std::fmt;
use std::ops::Index;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::trace;

use crate::function::Class;
use crate::value::Value;

/// Intrinsic value kinds, independent of how a value was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Function,
    Boolean,
    Number,
    Array,
    Date,
    Regex,
    /// Generic "is an object": also accepts arrays, argument lists, dates,
    /// regexes, functions and classes.
    Object,
    String,
}

impl PrimitiveKind {
    /// All kinds, in the order the registry checks them.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Function,
        PrimitiveKind::Boolean,
        PrimitiveKind::Number,
        PrimitiveKind::Array,
        PrimitiveKind::Date,
        PrimitiveKind::Regex,
        PrimitiveKind::Object,
        PrimitiveKind::String,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Function => "Function",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Number => "Number",
            PrimitiveKind::Array => "Array",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::Regex => "RegExp",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::String => "String",
        }
    }

    /// Tests a value against this kind.
    pub fn test(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::Function => value.is_function(),
            PrimitiveKind::Boolean => value.is_bool(),
            PrimitiveKind::Number => value.is_number(),
            PrimitiveKind::Array => value.is_array(),
            PrimitiveKind::Date => value.is_date(),
            PrimitiveKind::Regex => value.is_regex(),
            PrimitiveKind::Object => value.is_object(),
            PrimitiveKind::String => value.is_string(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reduces a predicate's result to match / no-match.
///
/// `Err` and `None` are non-matches, which is how a failing predicate is
/// swallowed instead of propagated.
pub trait Verdict {
    fn verdict(self) -> bool;
}

impl Verdict for bool {
    fn verdict(self) -> bool {
        self
    }
}

impl Verdict for Value {
    fn verdict(self) -> bool {
        self.is_truthy()
    }
}

impl<T: Verdict> Verdict for Option<T> {
    fn verdict(self) -> bool {
        self.is_some_and(Verdict::verdict)
    }
}

impl<T: Verdict, E> Verdict for Result<T, E> {
    fn verdict(self) -> bool {
        self.is_ok_and(Verdict::verdict)
    }
}

/// A descriptor built from an arbitrary one-argument predicate.
#[derive(Clone)]
pub struct Matcher(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Matcher {
    /// Wraps a predicate. A predicate that panics is a non-match.
    pub fn new<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Verdict,
    {
        Self(Arc::new(move |value| {
            catch_unwind(AssertUnwindSafe(|| predicate(value).verdict())).unwrap_or_else(|_| {
                trace!(?value, "matcher predicate panicked; treating as no match");
                false
            })
        }))
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }

    pub fn ptr_eq(&self, other: &Matcher) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

/// An opaque descriptor payload for appended strategies.
///
/// The registry has no built-in strategy for extensions; an unrecognized
/// extension matches nothing.
#[derive(Clone)]
pub struct Extension {
    label: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Extension {
    pub fn new<T: Any + Send + Sync>(label: impl AsRef<str>, payload: T) -> Self {
        Self {
            label: Arc::from(label.as_ref()),
            payload: Arc::new(payload),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

/// What a single argument must look like.
#[derive(Clone)]
pub enum Descriptor {
    Any,
    Kind(PrimitiveKind),
    /// Matches values whose `typeof` tag equals the string.
    Tag(Arc<str>),
    Class(Class),
    Null,
    Undefined,
    Either(Arc<[Descriptor]>),
    Matcher(Matcher),
    Extension(Extension),
}

impl Descriptor {
    pub const FUNCTION: Descriptor = Descriptor::Kind(PrimitiveKind::Function);
    pub const BOOLEAN: Descriptor = Descriptor::Kind(PrimitiveKind::Boolean);
    pub const NUMBER: Descriptor = Descriptor::Kind(PrimitiveKind::Number);
    pub const ARRAY: Descriptor = Descriptor::Kind(PrimitiveKind::Array);
    pub const DATE: Descriptor = Descriptor::Kind(PrimitiveKind::Date);
    pub const REGEX: Descriptor = Descriptor::Kind(PrimitiveKind::Regex);
    pub const OBJECT: Descriptor = Descriptor::Kind(PrimitiveKind::Object);
    pub const STRING: Descriptor = Descriptor::Kind(PrimitiveKind::String);

    /// Matches if any member matches.
    pub fn either(members: impl IntoIterator<Item = Descriptor>) -> Self {
        Descriptor::Either(members.into_iter().collect())
    }

    /// Matches when the predicate yields a truthy verdict.
    pub fn matcher<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Verdict,
    {
        Descriptor::Matcher(Matcher::new(predicate))
    }

    /// Matches values whose `typeof` tag equals `tag`.
    pub fn tag(tag: impl AsRef<str>) -> Self {
        Descriptor::Tag(Arc::from(tag.as_ref()))
    }

    pub fn extension<T: Any + Send + Sync>(label: impl AsRef<str>, payload: T) -> Self {
        Descriptor::Extension(Extension::new(label, payload))
    }

    pub fn as_extension(&self) -> Option<&Extension> {
        match self {
            Descriptor::Extension(extension) => Some(extension),
            _ => None,
        }
    }
}

impl From<PrimitiveKind> for Descriptor {
    fn from(kind: PrimitiveKind) -> Self {
        Descriptor::Kind(kind)
    }
}

impl From<Class> for Descriptor {
    fn from(class: Class) -> Self {
        Descriptor::Class(class)
    }
}

impl From<&Class> for Descriptor {
    fn from(class: &Class) -> Self {
        Descriptor::Class(class.clone())
    }
}

impl From<Matcher> for Descriptor {
    fn from(matcher: Matcher) -> Self {
        Descriptor::Matcher(matcher)
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Descriptor::Any, Descriptor::Any) => true,
            (Descriptor::Kind(a), Descriptor::Kind(b)) => a == b,
            (Descriptor::Tag(a), Descriptor::Tag(b)) => a == b,
            (Descriptor::Class(a), Descriptor::Class(b)) => a == b,
            (Descriptor::Null, Descriptor::Null) => true,
            (Descriptor::Undefined, Descriptor::Undefined) => true,
            (Descriptor::Either(a), Descriptor::Either(b)) => a == b,
            (Descriptor::Matcher(a), Descriptor::Matcher(b)) => a.ptr_eq(b),
            (Descriptor::Extension(a), Descriptor::Extension(b)) => {
                Arc::ptr_eq(&a.payload, &b.payload)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Any => write!(f, "Any"),
            Descriptor::Kind(kind) => write!(f, "{}", kind),
            Descriptor::Tag(tag) => write!(f, "{:?}", tag),
            Descriptor::Class(class) => write!(f, "{}", class.name()),
            Descriptor::Null => write!(f, "null"),
            Descriptor::Undefined => write!(f, "undefined"),
            Descriptor::Either(members) => {
                write!(f, "Either(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ")")
            }
            Descriptor::Matcher(_) => write!(f, "Matcher"),
            Descriptor::Extension(extension) => write!(f, "{}", extension.label()),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An ordered, shared list of descriptors for an argument list.
#[derive(Clone, Default, PartialEq)]
pub struct Signature(Arc<[Descriptor]>);

impl Signature {
    pub fn new(descriptors: impl IntoIterator<Item = Descriptor>) -> Self {
        Self(descriptors.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Descriptor] {
        &self.0
    }
}

impl Index<usize> for Signature {
    type Output = Descriptor;

    fn index(&self, index: usize) -> &Descriptor {
        &self.0[index]
    }
}

impl From<Vec<Descriptor>> for Signature {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Self(descriptors.into())
    }
}

impl<const N: usize> From<[Descriptor; N]> for Signature {
    fn from(descriptors: [Descriptor; N]) -> Self {
        Self::new(descriptors)
    }
}

impl From<&[Descriptor]> for Signature {
    fn from(descriptors: &[Descriptor]) -> Self {
        Self(descriptors.into())
    }
}

impl FromIterator<Descriptor> for Signature {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, descriptor) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", descriptor)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicking_matcher_is_a_non_match() {
        let matcher = Matcher::new(|value: &Value| {
            let text = value.as_str().unwrap_or_else(|| panic!("not a string"));
            text.len() == 2
        });
        assert!(matcher.test(&Value::from("ab")));
        assert!(!matcher.test(&Value::from("abc")));
        assert!(!matcher.test(&Value::Null));
    }

    #[test]
    fn test_verdicts() {
        assert!(true.verdict());
        assert!(Value::from("x").verdict());
        assert!(!Value::from(0).verdict());
        assert!(!None::<bool>.verdict());
        assert!(Some(true).verdict());
        assert!(!Err::<bool, ()>(()).verdict());
        assert!(Ok::<_, ()>(Value::from(1)).verdict());
    }

    #[test]
    fn test_matcher_swallows_errors() {
        let has_length_two = Matcher::new(|v: &Value| v.get("length").map(|l| l == Value::from(2)));
        assert!(has_length_two.test(&Value::from("12")));
        assert!(!has_length_two.test(&Value::Null));
        assert!(!has_length_two.test(&Value::Undefined));
    }

    #[test]
    fn test_signature_display() {
        let point = Class::new("Point");
        let sig = Signature::from([
            Descriptor::STRING,
            Descriptor::either([Descriptor::NUMBER, Descriptor::Null]),
            Descriptor::from(&point),
            Descriptor::tag("number"),
        ]);
        assert_eq!(sig.len(), 4);
        assert_eq!(sig.to_string(), r#"(String, Either(Number, null), Point, "number")"#);
    }

    #[test]
    fn test_extension_downcast() {
        let d = Descriptor::extension("Range(1..5)", 1..5_i32);
        let ext = d.as_extension().unwrap();
        assert_eq!(ext.label(), "Range(1..5)");
        assert_eq!(ext.downcast_ref::<std::ops::Range<i32>>(), Some(&(1..5)));
        assert!(ext.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_object_kind_is_broad() {
        let object = PrimitiveKind::Object;
        assert!(object.test(&Value::object()));
        assert!(object.test(&Value::array([])));
        assert!(object.test(&Value::arguments([])));
        assert!(object.test(&Value::date(0)));
        assert!(object.test(&Value::regex(".*", "")));
        assert!(!object.test(&Value::Null));
        assert!(!object.test(&Value::from("")));
    }
}
