//! Which matcher registry a wrapper or table checks arguments against.

use std::fmt;
use std::sync::Arc;

use typed_core::MatcherRegistry;

/// A reference to a matcher registry.
///
/// Defaults to the process-wide registry. A shared instance registry keeps
/// appended strategies local to the wrappers and tables that use it.
#[derive(Clone, Default)]
pub enum RegistryHandle {
    #[default]
    Global,
    Shared(Arc<MatcherRegistry>),
}

impl RegistryHandle {
    pub fn get(&self) -> &MatcherRegistry {
        match self {
            RegistryHandle::Global => MatcherRegistry::global(),
            RegistryHandle::Shared(registry) => registry,
        }
    }
}

impl From<Arc<MatcherRegistry>> for RegistryHandle {
    fn from(registry: Arc<MatcherRegistry>) -> Self {
        RegistryHandle::Shared(registry)
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryHandle::Global => write!(f, "Global"),
            RegistryHandle::Shared(registry) => write!(f, "Shared({:?})", registry),
        }
    }
}
