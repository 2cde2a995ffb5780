//! Overload tables.
//!
//! An [`Overload`] holds an ordered list of clauses, each a signature plus a
//! handler, and a default. A call runs the first clause whose signature
//! accepts the arguments. When none does, the default runs with the
//! original receiver and arguments.
//!
//! Every table owns a companion object passed as an extra trailing argument
//! to clause handlers. It carries `default` and one proxy per named clause,
//! so handlers can reach sibling clauses directly:
//!
//! ```text
//! table(args)  ──►  clause i handler(args..., companion)
//!                         │
//!                         └─► companion.<name>(more...)  ──►  handler_name(more..., companion)
//! ```
//!
//! Clause order is registration order. Overlapping signatures are legal;
//! the earlier clause wins.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};
use typed_core::{check_types_in, Function, Object, Signature, TypedResult, Value};

use crate::guard::TypeChecked;
use crate::handle::RegistryHandle;

/// What runs when no clause matches.
#[derive(Clone, Debug)]
pub enum Fallback {
    /// Invoked with the caller's receiver and arguments.
    Call(Function),
    /// Returned as is.
    Value(Value),
}

impl Fallback {
    fn as_value(&self) -> Value {
        match self {
            Fallback::Call(function) => Value::Function(function.clone()),
            Fallback::Value(value) => value.clone(),
        }
    }
}

impl From<Function> for Fallback {
    fn from(function: Function) -> Self {
        Fallback::Call(function)
    }
}

impl From<Value> for Fallback {
    fn from(value: Value) -> Self {
        match value {
            Value::Function(function) => Fallback::Call(function),
            other => Fallback::Value(other),
        }
    }
}

#[derive(Clone)]
struct Clause {
    name: Option<Arc<str>>,
    signature: Signature,
    handler: Function,
}

struct Table {
    /// Replaced wholesale on registration; dispatch iterates a snapshot.
    clauses: RwLock<Arc<Vec<Clause>>>,
    fallback: Fallback,
    companion: Object,
    registry: RegistryHandle,
}

/// A callable overload table.
///
/// Clones refer to the same table. A handler that needs to call its own
/// table should capture a [`WeakOverload`] from [`Overload::downgrade`],
/// otherwise the table keeps itself alive.
#[derive(Clone)]
pub struct Overload(Arc<Table>);

/// A non-owning reference to an [`Overload`].
#[derive(Clone)]
pub struct WeakOverload(Weak<Table>);

impl Overload {
    /// A table whose default is invoked when no clause matches.
    pub fn new(default: Function) -> Self {
        Self::with_fallback(RegistryHandle::Global, Fallback::Call(default))
    }

    /// A table that returns `value` when no clause matches.
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self::with_fallback(RegistryHandle::Global, Fallback::from(value.into()))
    }

    /// A table whose default is itself type-checked against `signature`.
    ///
    /// Unmatched calls whose arguments also fail `signature` raise a
    /// Type-Mismatch error.
    pub fn typed(signature: impl Into<Signature>, default: Function) -> Self {
        let guarded = TypeChecked::new(signature, default).into_function();
        Self::with_fallback(RegistryHandle::Global, Fallback::Call(guarded))
    }

    /// A table with no default; unmatched calls yield `undefined`.
    pub fn empty() -> Self {
        Self::with_fallback(RegistryHandle::Global, Fallback::Value(Value::Undefined))
    }

    /// A table checking signatures against an explicit registry.
    pub fn with_fallback(registry: impl Into<RegistryHandle>, fallback: Fallback) -> Self {
        let companion = Object::new();
        companion.set("default", fallback.as_value());
        Self(Arc::new(Table {
            clauses: RwLock::new(Arc::new(Vec::new())),
            fallback,
            companion,
            registry: registry.into(),
        }))
    }

    /// Appends an unnamed clause.
    pub fn when(self, signature: impl Into<Signature>, handler: Function) -> Self {
        self.add_clause(None, signature.into(), handler);
        self
    }

    /// Appends a clause and exposes it on the companion as `name`.
    ///
    /// An empty name registers an unnamed clause. Reusing a name replaces
    /// the companion entry; the earlier clause stays in the dispatch order.
    pub fn when_named(
        self,
        name: impl AsRef<str>,
        signature: impl Into<Signature>,
        handler: Function,
    ) -> Self {
        self.add_clause(Some(name.as_ref()), signature.into(), handler);
        self
    }

    /// Appends a clause through a shared reference.
    pub fn add_clause(&self, name: Option<&str>, signature: Signature, handler: Function) {
        let name: Option<Arc<str>> = name.filter(|name| !name.is_empty()).map(Arc::from);

        if let Some(name) = &name {
            let proxy = self.proxy(name, &handler);
            self.0.companion.set(name.to_string(), proxy);
        }

        debug!(
            name = name.as_deref().unwrap_or("<unnamed>"),
            signature = %signature,
            "registered overload clause"
        );

        let mut clauses = self.0.clauses.write();
        let mut next = Vec::with_capacity(clauses.len() + 1);
        next.extend(clauses.iter().cloned());
        next.push(Clause {
            name,
            signature,
            handler,
        });
        *clauses = Arc::new(next);
    }

    /// Builds the companion entry for a named clause.
    ///
    /// The proxy calls the handler directly, skipping the signature check,
    /// and appends the companion to its arguments.
    fn proxy(&self, name: &str, handler: &Function) -> Function {
        let companion = self.0.companion.downgrade();
        let handler = handler.clone();
        let arity = handler.arity();
        Function::new(move |this, args| {
            let companion = companion
                .upgrade()
                .map(Value::Object)
                .unwrap_or_default();
            handler.call_with(this, &with_trailing(args, companion))
        })
        .with_name(name)
        .with_arity(arity)
    }

    /// Dispatches with an explicit receiver.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> TypedResult<Value> {
        let clauses = self.0.clauses.read().clone();
        let registry = self.0.registry.get();

        for (index, clause) in clauses.iter().enumerate() {
            if check_types_in(registry, clause.signature.as_slice(), args) {
                trace!(
                    index,
                    name = clause.name.as_deref().unwrap_or("<unnamed>"),
                    signature = %clause.signature,
                    "overload clause matched"
                );
                let companion = Value::Object(self.0.companion.clone());
                return clause.handler.call_with(this, &with_trailing(args, companion));
            }
        }

        trace!(clauses = clauses.len(), "no overload clause matched");
        match &self.0.fallback {
            Fallback::Call(function) => function.call_with(this, args),
            Fallback::Value(value) => Ok(value.clone()),
        }
    }

    /// Dispatches with an `undefined` receiver.
    pub fn call(&self, args: &[Value]) -> TypedResult<Value> {
        self.call_with(&Value::Undefined, args)
    }

    /// The companion object handed to clause handlers.
    pub fn companion(&self) -> &Object {
        &self.0.companion
    }

    /// The default as a value: the default function, or the bare value.
    pub fn default_value(&self) -> Value {
        self.0.fallback.as_value()
    }

    pub fn len(&self) -> usize {
        self.0.clauses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.clauses.read().is_empty()
    }

    pub fn downgrade(&self) -> WeakOverload {
        WeakOverload(Arc::downgrade(&self.0))
    }

    /// Exposes the table as a plain function value.
    pub fn into_function(self) -> Function {
        Function::new(move |this, args| self.call_with(this, args))
    }
}

impl WeakOverload {
    pub fn upgrade(&self) -> Option<Overload> {
        self.0.upgrade().map(Overload)
    }

    /// Dispatches through the table, or yields `undefined` once it is gone.
    pub fn call(&self, args: &[Value]) -> TypedResult<Value> {
        match self.upgrade() {
            Some(table) => table.call(args),
            None => Ok(Value::Undefined),
        }
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses = self.0.clauses.read().clone();
        let mut list = f.debug_list();
        for clause in clauses.iter() {
            match &clause.name {
                Some(name) => list.entry(&format_args!("{}{}", name, clause.signature)),
                None => list.entry(&format_args!("{}", clause.signature)),
            };
        }
        list.finish()
    }
}

impl fmt::Debug for WeakOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakOverload")
    }
}

fn with_trailing(args: &[Value], last: Value) -> Vec<Value> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.extend_from_slice(args);
    full.push(last);
    full
}

/// Starts an overload table around `default`.
pub fn overload(default: Function) -> Overload {
    Overload::new(default)
}
