//! Runtime type matching.
//!
//! This crate classifies dynamically typed [`Value`]s against
//! [`Descriptor`]s. It provides:
//!
//! - The value model ([`value`], [`function`])
//! - Type descriptors ([`descriptor`])
//! - The extensible matcher registry ([`registry`])
//! - Argument list checking ([`checker`])
//!
//! Guarded calls and overload dispatch live in `typed-dispatch`, built on
//! [`check_types`].
//!
//! ```text
//! Descriptor ──► MatcherRegistry ──► Predicate
//!                     ▲
//!   [Descriptor] ─► checker ◄─ [Value]
//! ```

pub mod checker;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod function;
pub mod registry;
pub mod value;

pub use checker::{check_types, check_types_in, first_mismatch, first_mismatch_in, Mismatch};
pub use config::{Config, ConfigError, ConfigResult, RegistryConfig};
pub use descriptor::{Descriptor, Extension, Matcher, PrimitiveKind, Signature, Verdict};
pub use error::{TypeMismatch, TypedError, TypedResult};
pub use function::{Class, Function, Instance, NativeFn};
pub use registry::{
    add_strategy, match_type, matcher_for, MatchStrategy, MatcherRegistry, Predicate,
    StrategyParts,
};
pub use value::{Array, Date, Object, Regex, Value, WeakObject};
