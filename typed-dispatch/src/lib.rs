//! Guarded calls and overload dispatch over `typed-core`.
//!
//! - [`TypeChecked`] runs a function only when its arguments match a
//!   signature, routing rejections through a replaceable error hook.
//! - [`Overload`] selects the first clause whose signature accepts the
//!   arguments, falling back to a default.
//!
//! Both accept a call exactly when [`typed_core::check_types`] does.

pub mod guard;
pub mod handle;
pub mod overload;

pub use guard::{type_checked, ErrorHook, ErrorHookFn, TypeChecked};
pub use handle::RegistryHandle;
pub use overload::{overload, Fallback, Overload, WeakOverload};
