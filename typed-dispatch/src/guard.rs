//! Type-checked calls.
//!
//! A [`TypeChecked`] wrapper runs its function only when the arguments
//! satisfy its signature. On a mismatch it builds a Type-Mismatch error and
//! hands it to the wrapper's error hook. The default hook raises the error;
//! a custom hook may swallow it, in which case the call yields `undefined`.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use typed_core::{
    first_mismatch_in, Function, Signature, TypeMismatch, TypedError, TypedResult, Value,
};

use crate::handle::RegistryHandle;

/// The body of an error hook: `(error, args, signature) -> Ok to swallow`.
pub type ErrorHookFn = dyn Fn(&TypedError, &[Value], &Signature) -> TypedResult<()> + Send + Sync;

/// A replaceable reaction to a rejected call.
#[derive(Clone)]
pub struct ErrorHook(Arc<ErrorHookFn>);

impl ErrorHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&TypedError, &[Value], &Signature) -> TypedResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    fn call(&self, error: &TypedError, args: &[Value], signature: &Signature) -> TypedResult<()> {
        (self.0)(error, args, signature)
    }
}

impl fmt::Debug for ErrorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorHook")
    }
}

/// A function gated by an argument signature.
///
/// Clones share one hook slot: they are the same wrapper. Every call to
/// [`TypeChecked::new`] creates an independent slot.
#[derive(Clone)]
pub struct TypeChecked {
    signature: Signature,
    function: Function,
    /// `None` means the default hook, which raises.
    hook: Arc<RwLock<Option<ErrorHook>>>,
    registry: RegistryHandle,
}

impl TypeChecked {
    /// Wraps `function`, checking arguments against the global registry.
    pub fn new(signature: impl Into<Signature>, function: Function) -> Self {
        Self::new_in(RegistryHandle::Global, signature, function)
    }

    /// Wraps `function`, checking arguments against `registry`.
    pub fn new_in(
        registry: impl Into<RegistryHandle>,
        signature: impl Into<Signature>,
        function: Function,
    ) -> Self {
        Self {
            signature: signature.into(),
            function,
            hook: Arc::new(RwLock::new(None)),
            registry: registry.into(),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Replaces the error hook. `None` restores the default, which raises.
    ///
    /// Returns the same wrapper, so construction can be chained.
    pub fn on_error(&self, hook: Option<ErrorHook>) -> Self {
        *self.hook.write() = hook;
        self.clone()
    }

    /// Calls the wrapped function with an explicit receiver.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> TypedResult<Value> {
        let Some(mismatch) = first_mismatch_in(self.registry.get(), self.signature.as_slice(), args)
        else {
            return self.function.call_with(this, args);
        };

        debug!(expected = %self.signature, ?mismatch, "rejected type-checked call");
        let error = TypedError::from(TypeMismatch::new(
            self.signature.clone(),
            args.to_vec(),
            mismatch,
        ));

        // Clone out of the slot so a hook may replace itself.
        let hook = self.hook.read().clone();
        match hook {
            None => Err(error),
            Some(hook) => {
                hook.call(&error, args, &self.signature)?;
                Ok(Value::Undefined)
            }
        }
    }

    /// Calls the wrapped function with an `undefined` receiver.
    pub fn call(&self, args: &[Value]) -> TypedResult<Value> {
        self.call_with(&Value::Undefined, args)
    }

    /// Exposes the wrapper as a plain function value.
    ///
    /// The function keeps sharing this wrapper's hook slot.
    pub fn into_function(self) -> Function {
        let arity = self.signature.len();
        let name = self.function.name().map(str::to_string);
        let function = Function::new(move |this, args| self.call_with(this, args)).with_arity(arity);
        match name {
            Some(name) => function.with_name(name),
            None => function,
        }
    }
}

impl fmt::Debug for TypeChecked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeChecked")
            .field("signature", &self.signature)
            .field("function", &self.function)
            .field("custom_hook", &self.hook.read().is_some())
            .finish()
    }
}

/// Wraps `function` so it only runs when its arguments match `signature`.
pub fn type_checked(signature: impl Into<Signature>, function: Function) -> TypeChecked {
    TypeChecked::new(signature, function)
}
