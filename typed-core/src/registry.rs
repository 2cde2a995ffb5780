//! The matcher registry.
//!
//! Resolves a [`Descriptor`] to a [`Predicate`] by walking an ordered list
//! of matching strategies. The first strategy that applies to a descriptor
//! builds its predicate; every later strategy is skipped. A descriptor no
//! strategy applies to matches nothing.
//!
//! # Ordering
//!
//! The built-in strategies are checked in this order:
//!
//! 1. primitive kinds
//! 2. `Any`
//! 3. `Either`
//! 4. `Matcher`
//! 5. string tags
//! 6. classes
//! 7. `null`
//! 8. `undefined`
//!
//! Strategies appended at runtime come after all of these. The list only
//! grows: strategies are never removed or reordered.
//!
//! # Concurrency
//!
//! Appends take a write lock and publish a new immutable snapshot. Lookups
//! clone the current snapshot and release the lock before building any
//! predicate, so a strategy may safely recurse into the registry.
//!
//! Clones of a registry share one strategy list. A predicate whose answer
//! can change as strategies are appended (an `Either` member, or a
//! descriptor nothing claims yet) holds such a clone and resolves at test
//! time, so [`MatcherRegistry::matcher_for`] and
//! [`MatcherRegistry::matches`] always agree.

mod strategies;

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::{Config, ConfigError, ConfigResult};
use crate::descriptor::Descriptor;
use crate::value::Value;

pub use strategies::{
    AnyStrategy, ClassStrategy, EitherStrategy, KindStrategy, MatcherStrategy, NullStrategy,
    TagStrategy, UndefinedStrategy,
};

/// A reusable one-argument match test.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// A predicate that accepts every value.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// A predicate that rejects every value.
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate")
    }
}

/// A rule pairing "does this descriptor apply" with "build a predicate for it".
pub trait MatchStrategy: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str {
        "custom"
    }

    /// Whether this strategy handles the descriptor.
    fn applies_to(&self, descriptor: &Descriptor) -> bool;

    /// Builds the predicate for a descriptor this strategy applies to.
    ///
    /// `registry` is the registry doing the lookup, for strategies that
    /// need to resolve nested descriptors.
    fn build(&self, descriptor: &Descriptor, registry: &MatcherRegistry) -> Predicate;

    /// Tests a single value without building a reusable predicate.
    fn test(&self, descriptor: &Descriptor, value: &Value, registry: &MatcherRegistry) -> bool {
        self.build(descriptor, registry).test(value)
    }
}

/// Applicability half of a [`StrategyParts`].
pub type AppliesFn = dyn Fn(&Descriptor) -> bool + Send + Sync;

/// Predicate-builder half of a [`StrategyParts`].
pub type BuildFn = dyn Fn(&Descriptor, &MatcherRegistry) -> Predicate + Send + Sync;

/// A loosely assembled strategy.
///
/// Registration through [`MatcherRegistry::add_strategy`] accepts it only
/// when both halves are present; anything else is dropped without error.
#[derive(Clone, Default)]
pub struct StrategyParts {
    pub name: Option<String>,
    pub applies_to: Option<Arc<AppliesFn>>,
    pub build: Option<Arc<BuildFn>>,
}

impl StrategyParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_applies_to<F>(mut self, applies_to: F) -> Self
    where
        F: Fn(&Descriptor) -> bool + Send + Sync + 'static,
    {
        self.applies_to = Some(Arc::new(applies_to));
        self
    }

    pub fn with_build<F>(mut self, build: F) -> Self
    where
        F: Fn(&Descriptor, &MatcherRegistry) -> Predicate + Send + Sync + 'static,
    {
        self.build = Some(Arc::new(build));
        self
    }

    /// Validates the parts, yielding a strategy if both halves are present.
    pub fn into_strategy(self) -> Option<FnStrategy> {
        match (self.applies_to, self.build) {
            (Some(applies_to), Some(build)) => Some(FnStrategy {
                name: self.name.unwrap_or_else(|| "custom".to_string()),
                applies_to,
                build,
            }),
            _ => None,
        }
    }

    fn missing(&self) -> &'static str {
        match (self.applies_to.is_some(), self.build.is_some()) {
            (false, false) => "applies_to and build",
            (false, true) => "applies_to",
            (true, false) => "build",
            (true, true) => "nothing",
        }
    }
}

/// A strategy assembled from two closures.
pub struct FnStrategy {
    name: String,
    applies_to: Arc<AppliesFn>,
    build: Arc<BuildFn>,
}

impl MatchStrategy for FnStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies_to(&self, descriptor: &Descriptor) -> bool {
        (self.applies_to)(descriptor)
    }

    fn build(&self, descriptor: &Descriptor, registry: &MatcherRegistry) -> Predicate {
        (self.build)(descriptor, registry)
    }
}

type StrategyList = Arc<Vec<Arc<dyn MatchStrategy>>>;

/// An ordered, append-only list of matching strategies.
///
/// Clones share the same list.
#[derive(Clone)]
pub struct MatcherRegistry {
    strategies: Arc<RwLock<StrategyList>>,
    warn_on_malformed: bool,
}

static GLOBAL: OnceLock<MatcherRegistry> = OnceLock::new();

impl MatcherRegistry {
    /// Creates a registry seeded with the built-in strategies.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates a registry with no strategies at all.
    pub fn empty() -> Self {
        Self {
            strategies: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            warn_on_malformed: Config::default().registry.warn_on_malformed,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let strategies = if config.registry.builtins {
            strategies::builtins()
        } else {
            Vec::new()
        };
        Self {
            strategies: Arc::new(RwLock::new(Arc::new(strategies))),
            warn_on_malformed: config.registry.warn_on_malformed,
        }
    }

    /// The process-wide registry used by [`match_type`] and [`matcher_for`].
    pub fn global() -> &'static MatcherRegistry {
        GLOBAL.get_or_init(MatcherRegistry::new)
    }

    /// Configures the process-wide registry.
    ///
    /// Must run before the first use of [`MatcherRegistry::global`].
    pub fn init_global(config: &Config) -> ConfigResult<()> {
        GLOBAL
            .set(MatcherRegistry::with_config(config))
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Appends a strategy. It takes priority only over later appends.
    pub fn register<S: MatchStrategy + 'static>(&self, strategy: S) {
        self.push(Arc::new(strategy));
    }

    /// Appends a loosely assembled strategy, silently dropping it if it is
    /// missing either half.
    pub fn add_strategy(&self, parts: StrategyParts) {
        if self.warn_on_malformed && (parts.applies_to.is_none() || parts.build.is_none()) {
            warn!(
                strategy = parts.name.as_deref().unwrap_or("custom"),
                missing = parts.missing(),
                "dropping malformed match strategy"
            );
        }
        if let Some(strategy) = parts.into_strategy() {
            self.push(Arc::new(strategy));
        }
    }

    fn push(&self, strategy: Arc<dyn MatchStrategy>) {
        let mut guard = self.strategies.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        debug!(strategy = strategy.name(), position = next.len(), "registered match strategy");
        next.push(strategy);
        *guard = Arc::new(next);
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }

    /// Names of the registered strategies, in priority order.
    pub fn strategy_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|s| s.name().to_string()).collect()
    }

    fn snapshot(&self) -> StrategyList {
        self.strategies.read().clone()
    }

    /// Resolves a descriptor to a reusable predicate.
    ///
    /// The strategy found here cannot be displaced, since appends only go
    /// after it. A descriptor with no strategy yet is looked up again on
    /// every test.
    pub fn matcher_for(&self, descriptor: &Descriptor) -> Predicate {
        let strategies = self.snapshot();
        match strategies.iter().find(|s| s.applies_to(descriptor)) {
            Some(strategy) => strategy.build(descriptor, self),
            None => {
                trace!(%descriptor, "no match strategy applies yet; deferring lookup");
                let registry = self.clone();
                let descriptor = descriptor.clone();
                Predicate::new(move |value| registry.matches(&descriptor, value))
            }
        }
    }

    /// Tests a value against a descriptor immediately.
    pub fn matches(&self, descriptor: &Descriptor, value: &Value) -> bool {
        let strategies = self.snapshot();
        match strategies.iter().find(|s| s.applies_to(descriptor)) {
            Some(strategy) => strategy.test(descriptor, value, self),
            None => {
                trace!(%descriptor, "no match strategy applies; matching nothing");
                false
            }
        }
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

/// Resolves a descriptor to a reusable predicate using the global registry.
pub fn matcher_for(descriptor: &Descriptor) -> Predicate {
    MatcherRegistry::global().matcher_for(descriptor)
}

/// Tests a value against a descriptor using the global registry.
pub fn match_type(descriptor: &Descriptor, value: &Value) -> bool {
    MatcherRegistry::global().matches(descriptor, value)
}

/// Appends a strategy to the global registry, dropping it if malformed.
pub fn add_strategy(parts: StrategyParts) {
    MatcherRegistry::global().add_strategy(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;
    use crate::function::Class;

    fn is_even_strategy() -> StrategyParts {
        StrategyParts::new()
            .named("even")
            .with_applies_to(|d| matches!(d.as_extension(), Some(e) if e.label() == "Even"))
            .with_build(|_, _| {
                Predicate::new(|v| v.as_number().is_some_and(|n| n % 2.0 == 0.0))
            })
    }

    #[test]
    fn test_builtin_order() {
        let registry = MatcherRegistry::new();
        assert_eq!(
            registry.strategy_names(),
            vec!["kind", "any", "either", "matcher", "tag", "class", "null", "undefined"]
        );
    }

    #[test]
    fn test_unknown_descriptor_matches_nothing() {
        let registry = MatcherRegistry::new();
        let even = Descriptor::extension("Even", ());
        assert!(!registry.matches(&even, &Value::from(2)));
        assert!(!registry.matcher_for(&even).test(&Value::Undefined));
    }

    #[test]
    fn test_appended_strategy_recognizes_extension() {
        let registry = MatcherRegistry::new();
        registry.add_strategy(is_even_strategy());
        assert_eq!(registry.len(), 9);

        let even = Descriptor::extension("Even", ());
        assert!(registry.matches(&even, &Value::from(4)));
        assert!(!registry.matches(&even, &Value::from(3)));
        assert!(!registry.matches(&even, &Value::from("4")));
    }

    #[test]
    fn test_malformed_strategies_are_dropped() {
        let registry = MatcherRegistry::new();
        registry.add_strategy(StrategyParts::new());
        registry.add_strategy(StrategyParts::new().with_applies_to(|_| true));
        registry.add_strategy(StrategyParts::new().with_build(|_, _| Predicate::always()));
        assert_eq!(registry.len(), 8);
        assert!(!registry.matches(&Descriptor::extension("x", ()), &Value::Null));
    }

    #[test]
    fn test_appended_strategy_cannot_override_builtin() {
        let registry = MatcherRegistry::new();
        registry.add_strategy(
            StrategyParts::new()
                .with_applies_to(|_| true)
                .with_build(|_, _| Predicate::always()),
        );
        // The kind strategy still wins for String.
        assert!(!registry.matches(&Descriptor::STRING, &Value::from(1)));
        // The catch-all only sees descriptors no built-in handles.
        assert!(registry.matches(&Descriptor::extension("anything", ()), &Value::from(1)));
    }

    #[test]
    fn test_empty_registry() {
        let registry = MatcherRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.matches(&Descriptor::Any, &Value::from(1)));

        registry.register(AnyStrategy);
        assert!(registry.matches(&Descriptor::Any, &Value::from(1)));
    }

    #[test]
    fn test_config_without_builtins() {
        let mut config = Config::default();
        config.registry.builtins = false;
        let registry = MatcherRegistry::with_config(&config);
        assert!(registry.is_empty());
        assert!(!registry.matches(&Descriptor::Kind(PrimitiveKind::Number), &Value::from(1)));
    }

    #[test]
    fn test_strategy_recursing_into_registry() {
        struct ListOf;

        impl MatchStrategy for ListOf {
            fn name(&self) -> &str {
                "list-of"
            }

            fn applies_to(&self, descriptor: &Descriptor) -> bool {
                descriptor
                    .as_extension()
                    .is_some_and(|e| e.downcast_ref::<Descriptor>().is_some())
            }

            fn build(&self, descriptor: &Descriptor, registry: &MatcherRegistry) -> Predicate {
                let Some(element) = descriptor
                    .as_extension()
                    .and_then(|e| e.downcast_ref::<Descriptor>())
                    .cloned()
                else {
                    return Predicate::never();
                };
                let registry = registry.clone();
                Predicate::new(move |v| {
                    v.as_array().is_some_and(|a| {
                        a.to_vec().iter().all(|item| registry.matches(&element, item))
                    })
                })
            }
        }

        let registry = MatcherRegistry::new();
        registry.register(ListOf);

        let point = Class::new("Point");
        let points = Descriptor::extension("[Point]", Descriptor::from(&point));
        let good = Value::array([Value::from(point.instantiate()), Value::from(point.instantiate())]);
        let bad = Value::array([Value::from(point.instantiate()), Value::from(1)]);

        assert!(registry.matches(&points, &good));
        assert!(!registry.matches(&points, &bad));
    }

    #[test]
    fn test_prebuilt_predicates_see_later_strategies() {
        let registry = MatcherRegistry::new();
        let even = Descriptor::extension("Even", ());
        let either = Descriptor::either([Descriptor::STRING, even.clone()]);

        let either_predicate = registry.matcher_for(&either);
        let even_predicate = registry.matcher_for(&even);
        assert!(!either_predicate.test(&Value::from(4)));
        assert!(!even_predicate.test(&Value::from(4)));

        registry.add_strategy(is_even_strategy());

        assert!(registry.matches(&either, &Value::from(4)));
        assert!(either_predicate.test(&Value::from(4)));
        assert!(even_predicate.test(&Value::from(4)));
        assert!(either_predicate.test(&Value::from("s")));
        assert!(!either_predicate.test(&Value::from(3)));
    }

    #[test]
    fn test_clones_share_strategies() {
        let registry = MatcherRegistry::new();
        let shared = registry.clone();
        shared.add_strategy(is_even_strategy());
        assert_eq!(registry.len(), 9);
        assert!(registry.matches(&Descriptor::extension("Even", ()), &Value::from(2)));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MatcherRegistry>();
        assert_send_sync::<Predicate>();
        assert_send_sync::<Descriptor>();
    }

    #[test]
    fn test_immediate_match_skips_predicate_building() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(Arc<AtomicUsize>);

        impl MatchStrategy for Counting {
            fn applies_to(&self, descriptor: &Descriptor) -> bool {
                descriptor.as_extension().is_some_and(|e| e.label() == "Counted")
            }

            fn build(&self, _descriptor: &Descriptor, _registry: &MatcherRegistry) -> Predicate {
                self.0.fetch_add(1, Ordering::SeqCst);
                Predicate::always()
            }

            fn test(&self, _: &Descriptor, _: &Value, _: &MatcherRegistry) -> bool {
                true
            }
        }

        let builds = Arc::new(AtomicUsize::new(0));
        let registry = MatcherRegistry::new();
        registry.register(Counting(Arc::clone(&builds)));

        let counted = Descriptor::extension("Counted", ());
        assert!(registry.matches(&counted, &Value::Null));
        assert!(registry.matches(&Descriptor::either([counted.clone()]), &Value::Null));
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        assert!(registry.matcher_for(&counted).test(&Value::Null));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
