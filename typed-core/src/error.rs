//! Error types shared by matching, guarded calls and dispatch.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::checker::Mismatch;
use crate::descriptor::Signature;
use crate::value::Value;

/// Errors raised while evaluating values, guarded calls or handlers.
#[derive(Debug, Clone, Error)]
pub enum TypedError {
    /// Arguments did not satisfy a guarded call's signature.
    #[error("{0}")]
    TypeMismatch(Box<TypeMismatch>),

    /// A property was accessed on a value that has no properties.
    #[error("cannot access property `{property}` of {target}")]
    PropertyAccess {
        property: String,
        target: &'static str,
    },

    /// A non-callable value was invoked.
    #[error("{what} is not a function")]
    NotCallable { what: String },

    /// A handler body failed with a plain message.
    #[error("{0}")]
    Handler(String),

    /// A handler body failed with a foreign error.
    #[error(transparent)]
    Custom(Arc<dyn std::error::Error + Send + Sync>),
}

/// Result type for everything that can raise a [`TypedError`].
pub type TypedResult<T> = Result<T, TypedError>;

impl TypedError {
    /// Creates a handler failure from a message.
    pub fn handler(message: impl Into<String>) -> Self {
        TypedError::Handler(message.into())
    }

    /// Wraps a foreign error raised inside a handler.
    pub fn custom<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TypedError::Custom(Arc::new(error))
    }

    /// Returns true if this is a Type-Mismatch error.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, TypedError::TypeMismatch(_))
    }

    /// Returns the mismatch details, if this is a Type-Mismatch error.
    pub fn as_type_mismatch(&self) -> Option<&TypeMismatch> {
        match self {
            TypedError::TypeMismatch(details) => Some(details),
            _ => None,
        }
    }
}

impl From<TypeMismatch> for TypedError {
    fn from(mismatch: TypeMismatch) -> Self {
        TypedError::TypeMismatch(Box::new(mismatch))
    }
}

/// Details of a rejected argument list.
#[derive(Debug, Clone)]
pub struct TypeMismatch {
    /// The descriptor list the call was guarded by.
    pub expected: Signature,
    /// The arguments actually received.
    pub arguments: Vec<Value>,
    /// Why the list was rejected.
    pub mismatch: Mismatch,
}

impl TypeMismatch {
    pub fn new(expected: Signature, arguments: Vec<Value>, mismatch: Mismatch) -> Self {
        Self {
            expected,
            arguments,
            mismatch,
        }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type mismatch: expected {}, got (", self.expected)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg.type_name())?;
        }
        write!(f, ")")?;

        match self.mismatch {
            Mismatch::Arity { expected, found } => {
                write!(f, ": expected {} argument(s), found {}", expected, found)
            }
            Mismatch::Position { index } => match self.expected.as_slice().get(index) {
                Some(descriptor) => {
                    write!(f, ": argument {} does not match `{}`", index, descriptor)
                }
                None => write!(f, ": argument {} has no descriptor", index),
            },
        }
    }
}
