//! Native functions, classes and class instances.

use std::fmt;
use std::sync::Arc;

use crate::error::TypedResult;
use crate::value::{Object, Value};

/// The body of a native function: `(this, args) -> result`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> TypedResult<Value> + Send + Sync;

/// A cheaply clonable native callable.
///
/// Carries an optional name and a declared arity, which is what the
/// `length` property of a function value reports.
#[derive(Clone)]
pub struct Function {
    name: Option<Arc<str>>,
    arity: usize,
    body: Arc<NativeFn>,
}

impl Function {
    /// Creates an anonymous function with arity 0.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> TypedResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: None,
            arity: 0,
            body: Arc::new(body),
        }
    }

    /// Creates a function that ignores its receiver.
    pub fn from_args<F>(body: F) -> Self
    where
        F: Fn(&[Value]) -> TypedResult<Value> + Send + Sync + 'static,
    {
        Self::new(move |_this, args| body(args))
    }

    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(Arc::from(name.as_ref()));
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Calls the function with an explicit receiver.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> TypedResult<Value> {
        (self.body)(this, args)
    }

    /// Calls the function with an `undefined` receiver.
    pub fn call(&self, args: &[Value]) -> TypedResult<Value> {
        self.call_with(&Value::Undefined, args)
    }

    /// Identity comparison on the function body.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.body) as *const (),
            Arc::as_ptr(&other.body) as *const (),
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[Function: {}]", name),
            None => write!(f, "[Function (anonymous)]"),
        }
    }
}

struct ClassInner {
    name: String,
    parent: Option<Class>,
    arity: usize,
}

/// A class reference.
///
/// Classes compare by identity: two classes with the same name are still
/// distinct types.
#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

impl Class {
    /// Creates a root class.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(ClassInner {
            name: name.into(),
            parent: None,
            arity: 0,
        }))
    }

    /// Creates a class deriving from `self`.
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(ClassInner {
            name: name.into(),
            parent: Some(self.clone()),
            arity: 0,
        }))
    }

    /// Sets the constructor's declared arity.
    ///
    /// Produces a new class identity; call it while building the class,
    /// before any instance is created.
    pub fn with_arity(self, arity: usize) -> Self {
        Self(Arc::new(ClassInner {
            name: self.0.name.clone(),
            parent: self.0.parent.clone(),
            arity,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    /// True if `self` is `ancestor` or derives from it.
    pub fn is_subclass_of(&self, ancestor: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == ancestor {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Constructs an instance with no fields.
    pub fn instantiate(&self) -> Instance {
        Instance {
            class: self.clone(),
            fields: Object::new(),
        }
    }

    /// Constructs an instance with the given fields.
    pub fn instantiate_with<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Instance
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Instance {
            class: self.clone(),
            fields: fields.into_iter().collect(),
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent() {
            Some(parent) => write!(f, "[class {} extends {}]", self.name(), parent.name()),
            None => write!(f, "[class {}]", self.name()),
        }
    }
}

/// An object constructed from a class.
#[derive(Clone)]
pub struct Instance {
    class: Class,
    fields: Object,
}

impl Instance {
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn fields(&self) -> &Object {
        &self.fields
    }

    /// Dynamic instance-of: true for the instance's class and every ancestor.
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.fields.ptr_eq(&other.fields)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.class.name(), self.fields)
    }
}
