//! Dynamic values.
//!
//! Arguments flowing through matching and dispatch are modelled as a single
//! tagged [`Value`] type. Reference kinds (arrays, objects, instances,
//! functions, classes, dates, regexes) are shared handles: cloning a value
//! clones the handle, and strict equality compares identity.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{TypedError, TypedResult};
use crate::function::{Class, Function, Instance};

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Undefined,
    /// Explicit empty value, distinct from `Undefined`.
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Array(Array),
    /// An array-like argument list. Not an `Array`.
    Arguments(Arc<[Value]>),
    Date(Arc<Date>),
    Regex(Arc<Regex>),
    /// A plain property map.
    Object(Object),
    Function(Function),
    Class(Class),
    /// An object constructed from a [`Class`].
    Instance(Instance),
}

impl Value {
    /// Creates a new empty array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Array::from_iter(items))
    }

    /// Creates an argument-list value.
    pub fn arguments(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Arguments(items.into_iter().collect())
    }

    /// Creates a date value from milliseconds since the Unix epoch.
    pub fn date(millis: i64) -> Self {
        Value::Date(Arc::new(Date::from_millis(millis)))
    }

    /// Creates a regex value from a pattern source and flags.
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::Regex(Arc::new(Regex::new(source, flags)))
    }

    /// Creates an empty plain object value.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// The host's `typeof` tag for this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Class(_) => "function",
            Value::Null
            | Value::Array(_)
            | Value::Arguments(_)
            | Value::Date(_)
            | Value::Regex(_)
            | Value::Object(_)
            | Value::Instance(_) => "object",
        }
    }

    /// A readable name for the value's kind, used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Arguments(_) => "arguments".to_string(),
            Value::Date(_) => "date".to_string(),
            Value::Regex(_) => "regexp".to_string(),
            Value::Object(_) => "object".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Class(class) => format!("class {}", class.name()),
            Value::Instance(instance) => instance.class().name().to_string(),
        }
    }

    /// Host truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// True for native functions and classes (classes are constructors).
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Class(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Value::Regex(_))
    }

    /// Generic "is an object" check: every reference kind, including
    /// arrays, argument lists, dates, regexes, functions and classes.
    pub fn is_object(&self) -> bool {
        !matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Reads a property.
    ///
    /// Missing properties read as `Undefined`. Reading any property of
    /// `null` or `undefined` fails.
    pub fn get(&self, key: &str) -> TypedResult<Value> {
        let value = match self {
            Value::Undefined | Value::Null => {
                return Err(TypedError::PropertyAccess {
                    property: key.to_string(),
                    target: self.type_tag_or_null(),
                });
            }
            Value::String(s) => match key {
                "length" => Value::from(s.chars().count()),
                _ => index_of(key)
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or_default(),
            },
            Value::Array(array) => match key {
                "length" => Value::from(array.len()),
                _ => index_of(key).and_then(|i| array.get(i)).unwrap_or_default(),
            },
            Value::Arguments(items) => match key {
                "length" => Value::from(items.len()),
                _ => index_of(key)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            },
            Value::Function(function) => match key {
                "length" => Value::from(function.arity()),
                "name" => Value::from(function.name().unwrap_or("")),
                _ => Value::Undefined,
            },
            Value::Class(class) => match key {
                "length" => Value::from(class.arity()),
                "name" => Value::from(class.name()),
                _ => Value::Undefined,
            },
            Value::Regex(regex) => match key {
                "source" => Value::from(regex.source()),
                "flags" => Value::from(regex.flags()),
                _ => Value::Undefined,
            },
            Value::Object(object) => object.get(key).unwrap_or_default(),
            Value::Instance(instance) => instance.fields().get(key).unwrap_or_default(),
            Value::Bool(_) | Value::Number(_) | Value::Date(_) => Value::Undefined,
        };
        Ok(value)
    }

    /// Writes a property on objects and instances.
    ///
    /// Writing to `null` or `undefined` fails; writing to other kinds is
    /// silently ignored, as the host does.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> TypedResult<()> {
        match self {
            Value::Undefined | Value::Null => Err(TypedError::PropertyAccess {
                property: key.into(),
                target: self.type_tag_or_null(),
            }),
            Value::Object(object) => {
                object.set(key, value);
                Ok(())
            }
            Value::Instance(instance) => {
                instance.fields().set(key, value);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Invokes this value as a function with an explicit receiver.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> TypedResult<Value> {
        match self {
            Value::Function(function) => function.call_with(this, args),
            other => Err(TypedError::NotCallable {
                what: other.type_name(),
            }),
        }
    }

    /// Invokes this value as a function with an `undefined` receiver.
    pub fn call(&self, args: &[Value]) -> TypedResult<Value> {
        self.call_with(&Value::Undefined, args)
    }

    /// Looks up a callable property and invokes it with `self` as receiver.
    pub fn call_method(&self, name: &str, args: &[Value]) -> TypedResult<Value> {
        match self.get(name)? {
            Value::Function(function) => function.call_with(self, args),
            _ => Err(TypedError::NotCallable {
                what: format!("{}.{}", self.type_name(), name),
            }),
        }
    }

    fn type_tag_or_null(&self) -> &'static str {
        if self.is_null() {
            "null"
        } else {
            self.type_tag()
        }
    }
}

fn index_of(key: &str) -> Option<usize> {
    key.parse().ok()
}

/// Strict equality: primitives by value, reference kinds by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Arguments(a), Value::Arguments(b)) => Arc::ptr_eq(a, b),
            (Value::Date(a), Value::Date(b)) => Arc::ptr_eq(a, b),
            (Value::Regex(a), Value::Regex(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(array) => write!(f, "{:?}", array),
            Value::Arguments(items) => {
                write!(f, "Arguments")?;
                f.debug_list().entries(items.iter()).finish()
            }
            Value::Date(date) => write!(f, "Date({})", date.millis()),
            Value::Regex(regex) => write!(f, "{}", regex),
            Value::Object(object) => write!(f, "{:?}", object),
            Value::Function(function) => write!(f, "{:?}", function),
            Value::Class(class) => write!(f, "{:?}", class),
            Value::Instance(instance) => write!(f, "{:?}", instance),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from(items))
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

/// A shared, mutable list.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    /// Copies the current elements out.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_shared(Arc::as_ptr(&self.0) as *const (), f, |f| {
            f.debug_list().entries(self.to_vec()).finish()
        })
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// A shared, mutable, insertion-ordered property map.
#[derive(Clone, Default)]
pub struct Object(Arc<RwLock<IndexMap<String, Value>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.write().insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.0))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        Self(Arc::new(RwLock::new(map)))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_shared(Arc::as_ptr(&self.0) as *const (), f, |f| {
            // Snapshot first so a Debug impl re-entering this object can't deadlock.
            let entries: Vec<(String, Value)> = self
                .0
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            f.debug_map().entries(entries).finish()
        })
    }
}

thread_local! {
    /// Shared containers currently being formatted on this thread.
    static FORMATTING: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

struct FormattingGuard;

impl Drop for FormattingGuard {
    fn drop(&mut self) {
        FORMATTING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Formats a shared container, printing `[Circular]` when it is reached
/// again while its own contents are being formatted.
fn fmt_shared(
    address: *const (),
    f: &mut fmt::Formatter<'_>,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let entered = FORMATTING.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&address) {
            false
        } else {
            stack.push(address);
            true
        }
    });
    if !entered {
        return f.write_str("[Circular]");
    }
    let _guard = FormattingGuard;
    body(f)
}

/// Weak counterpart of [`Object`].
#[derive(Clone)]
pub struct WeakObject(Weak<RwLock<IndexMap<String, Value>>>);

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }
}

/// A point in time, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date {
    millis: i64,
}

impl Date {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self { millis }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }
}

/// A regular expression literal. Only its source is kept; values are
/// classified, never executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    source: String,
    flags: String,
}

impl Regex {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}
