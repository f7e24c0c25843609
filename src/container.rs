//! The container facade
//!
//! A [`Container`] composes one service registry with the resolution
//! algorithm and the two external collaborators: a class resolver for
//! bare-name construction and an optional event dispatcher for lifecycle
//! notifications. Cloning a container is cheap and every clone shares the
//! same registry.
//!
//! The maps underneath are concurrency-safe, but the container makes no
//! atomicity promise across a `set`/`remove` racing a first resolution of
//! the same shared name; hosts that mutate and resolve concurrently must
//! serialize those themselves or give each context its own container.

use crate::class::{ClassRegistry, ClassResolver};
use crate::definition::{Instance, ServiceDefinition};
use crate::events::EventDispatcher;
use crate::registry::{ServiceRef, ServiceRegistry};
use crate::resolver::ResolveCtx;
use crate::{DiError, Result};
use std::any::Any;
use std::sync::{Arc, RwLock};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

struct ContainerInner {
    registry: ServiceRegistry,
    classes: Arc<dyn ClassResolver>,
    events: RwLock<Option<Arc<dyn EventDispatcher>>>,
}

/// Name-keyed service container.
///
/// Maps string service names to construction recipes and resolves them on
/// demand, caching shared instances lazily on first resolution.
///
/// # Examples
///
/// ```rust
/// use servitor::Container;
///
/// struct Config {
///     debug: bool,
/// }
///
/// let container = Container::new();
/// container.set_shared_factory("config", || Config { debug: true });
///
/// let config = container.get_typed::<Config>("config").unwrap();
/// assert!(config.debug);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a container with an empty class registry.
    ///
    /// Bare-name fallback and class-based definitions will only work once
    /// a resolver with known classes is attached; see
    /// [`with_classes`](Self::with_classes).
    pub fn new() -> Self {
        Self::with_classes(Arc::new(ClassRegistry::new()))
    }

    /// Create a container around an existing class-resolution collaborator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use servitor::class::{arg, ClassBuilder, ClassRegistry};
    /// use servitor::Container;
    ///
    /// struct FileLogger { path: String }
    ///
    /// let classes = ClassRegistry::new();
    /// classes.insert(
    ///     ClassBuilder::<FileLogger>::new("FileLogger")
    ///         .constructor(1, |args| {
    ///             Ok(FileLogger { path: servitor::class::arg::<String>(args, 0)?.clone() })
    ///         })
    ///         .build(),
    /// );
    ///
    /// let container = Container::with_classes(Arc::new(classes));
    /// ```
    pub fn with_classes(classes: Arc<dyn ClassResolver>) -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "servitor", "Creating new service container");

        Self {
            inner: Arc::new(ContainerInner {
                registry: ServiceRegistry::new(),
                classes,
                events: RwLock::new(None),
            }),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a definition under a name, overwriting any previous
    /// definition for that name.
    ///
    /// Overwriting does not invalidate an already-cached shared instance;
    /// the old instance keeps being served until [`remove`](Self::remove)
    /// or [`clear`](Self::clear). This staleness is intentional.
    pub fn set(&self, name: impl Into<String>, definition: ServiceDefinition) {
        self.inner.registry.register(name, definition);
    }

    /// Register a definition with the shared flag forced on
    pub fn set_shared(&self, name: impl Into<String>, definition: ServiceDefinition) {
        self.inner.registry.register(name, definition.shared(true));
    }

    /// Sugar: register a pre-built instance (literal definition).
    ///
    /// The stored instance is returned unchanged on every resolution.
    pub fn set_instance<T: Any + Send + Sync>(&self, name: impl Into<String>, instance: T) {
        self.set(name, ServiceDefinition::literal(instance));
    }

    /// Sugar: register a non-shared factory - a fresh instance per `get`
    pub fn set_factory<T, F>(&self, name: impl Into<String>, builder: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.set(name, ServiceDefinition::factory(builder));
    }

    /// Sugar: register a shared factory - built once, then cached
    pub fn set_shared_factory<T, F>(&self, name: impl Into<String>, builder: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.set(name, ServiceDefinition::factory(builder).shared(true));
    }

    /// Sugar: register a bare class-name definition
    pub fn set_class(&self, name: impl Into<String>, class_name: impl Into<String>) {
        self.set(name, ServiceDefinition::class_ref(class_name));
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a service by name.
    ///
    /// Shared services return the cached instance after the first call.
    /// A name with no definition falls back to the class resolver: a known
    /// class name is implicitly registered as a non-shared class-ref
    /// definition; an unknown one fails with [`DiError::ServiceNotFound`].
    pub fn get(&self, name: &str) -> Result<Instance> {
        self.resolve_entry(name, None)
    }

    /// Resolve a service by name with runtime constructor arguments.
    ///
    /// The arguments reach class-ref constructors (and the bare-name
    /// fallback). If the service is shared and already cached, the cached
    /// instance is returned unconditionally and `args` are ignored - the
    /// arguments only matter on the call that actually constructs.
    pub fn get_with(&self, name: &str, args: &[Instance]) -> Result<Instance> {
        self.resolve_entry(name, Some(args))
    }

    /// Resolve with single-instance semantics regardless of the
    /// definition's own shared flag.
    ///
    /// The first call resolves and caches under the name; every later call
    /// returns that cached instance, even for non-shared definitions.
    pub fn get_shared(&self, name: &str) -> Result<Instance> {
        self.resolve_shared_entry(name, None)
    }

    /// [`get_shared`](Self::get_shared) with runtime constructor arguments
    /// (used only by the call that actually constructs)
    pub fn get_shared_with(&self, name: &str, args: &[Instance]) -> Result<Instance> {
        self.resolve_shared_entry(name, Some(args))
    }

    /// Sugar: resolve and downcast to a concrete type.
    ///
    /// Thin wrapper over [`get`](Self::get); fails with
    /// [`DiError::TypeMismatch`] when the resolved instance is not a `T`.
    pub fn get_typed<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(format!("service {name}")))
    }

    /// Sugar: [`get_shared`](Self::get_shared) and downcast
    pub fn get_shared_typed<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get_shared(name)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(format!("service {name}")))
    }

    /// Mutable access to the stored definition itself, for
    /// post-registration edits.
    ///
    /// Nothing is resolved at mutation time; edits take effect on the next
    /// resolution and never disturb an already-cached shared instance.
    ///
    /// The guard holds a map lock: drop it before calling back into the
    /// container, or the call can deadlock.
    pub fn service_mut(&self, name: &str) -> Result<ServiceRef<'_>> {
        self.inner
            .registry
            .lookup_mut(name)
            .ok_or_else(|| DiError::service_not_found(name))
    }

    // =========================================================================
    // Queries and lifecycle
    // =========================================================================

    /// Whether a definition is registered under the name
    pub fn has(&self, name: &str) -> bool {
        self.inner.registry.has(name)
    }

    /// Drop the definition and any cached shared instance for the name.
    /// Returns whether a definition existed.
    pub fn remove(&self, name: &str) -> bool {
        self.inner.registry.remove(name)
    }

    /// All registered service names
    pub fn names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether no definitions are registered
    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Drop every definition and every cached shared instance
    pub fn clear(&self) {
        self.inner.registry.clear();
    }

    /// Attach (or replace) the event dispatcher
    pub fn set_event_dispatcher(&self, dispatcher: Arc<dyn EventDispatcher>) {
        *self.inner.events.write().unwrap() = Some(dispatcher);
    }

    /// Detach the event dispatcher; no further events are delivered
    pub fn clear_event_dispatcher(&self) {
        *self.inner.events.write().unwrap() = None;
    }

    /// The class-resolution collaborator this container consults
    pub fn classes(&self) -> &Arc<dyn ClassResolver> {
        &self.inner.classes
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    pub(crate) fn dispatcher(&self) -> Option<Arc<dyn EventDispatcher>> {
        self.inner.events.read().unwrap().clone()
    }

    /// Definition lookup with the bare-name class fallback
    fn definition_for(&self, name: &str) -> Result<ServiceDefinition> {
        if let Some(definition) = self.inner.registry.lookup(name) {
            return Ok(definition);
        }

        if self.inner.classes.is_known(name) {
            #[cfg(feature = "logging")]
            debug!(
                target: "servitor",
                service = %name,
                "No definition registered; implicitly registering the name as a class-ref"
            );
            let definition = ServiceDefinition::class_ref(name);
            self.inner.registry.register(name, definition.clone());
            return Ok(definition);
        }

        Err(DiError::service_not_found(name))
    }

    fn resolve_entry(&self, name: &str, args: Option<&[Instance]>) -> Result<Instance> {
        let definition = self.definition_for(name)?;

        if definition.shared {
            if let Some(cached) = self.inner.registry.cached(name) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "servitor",
                    service = %name,
                    "Returning cached shared instance (runtime args, if any, are ignored)"
                );
                return Ok(cached);
            }
        }

        let mut ctx = ResolveCtx::new();
        let instance = self.resolve_named(name, &definition, args, &mut ctx)?;

        if definition.shared {
            self.inner.registry.cache(name, Instance::clone(&instance));
        }
        Ok(instance)
    }

    fn resolve_shared_entry(&self, name: &str, args: Option<&[Instance]>) -> Result<Instance> {
        if let Some(cached) = self.inner.registry.cached(name) {
            return Ok(cached);
        }

        let definition = self.definition_for(name)?;
        let mut ctx = ResolveCtx::new();
        let instance = self.resolve_named(name, &definition, args, &mut ctx)?;

        self.inner.registry.cache(name, Instance::clone(&instance));
        Ok(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.len())
            .field(
                "has_dispatcher",
                &self.inner.events.read().unwrap().is_some(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Database {
        url: String,
    }

    #[test]
    fn set_instance_returns_the_stored_value() {
        let container = Container::new();
        container.set_instance(
            "db",
            Database {
                url: "postgres://localhost".into(),
            },
        );

        let db = container.get_typed::<Database>("db").unwrap();
        assert_eq!(db.url, "postgres://localhost");
    }

    #[test]
    fn literal_ignores_the_shared_flag() {
        let container = Container::new();
        container.set(
            "db",
            ServiceDefinition::literal(Database { url: "a".into() }),
        );

        let first = container.get("db").unwrap();
        let second = container.get("db").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn shared_factory_builds_once() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        struct Expensive;

        let container = Container::new();
        container.set_shared_factory("expensive", || {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Expensive
        });

        assert_eq!(BUILT.load(Ordering::SeqCst), 0);
        let first = container.get("expensive").unwrap();
        let second = container.get("expensive").unwrap();

        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn non_shared_factory_builds_every_time() {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        struct RequestId(u32);

        let container = Container::new();
        container.set_factory("request_id", || {
            RequestId(COUNTER.fetch_add(1, Ordering::SeqCst))
        });

        let first = container.get_typed::<RequestId>("request_id").unwrap();
        let second = container.get_typed::<RequestId>("request_id").unwrap();
        assert_ne!(first.0, second.0);
    }

    #[test]
    fn missing_name_with_no_class_fails() {
        let container = Container::new();
        let err = container.get("missing").unwrap_err();
        assert!(matches!(err, DiError::ServiceNotFound { name } if name == "missing"));
    }

    #[test]
    fn remove_forgets_definition_and_cache() {
        let container = Container::new();
        container.set_shared_factory("db", || Database { url: "a".into() });

        let first = container.get("db").unwrap();
        assert!(container.remove("db"));
        assert!(!container.has("db"));

        container.set_shared_factory("db", || Database { url: "b".into() });
        let second = container.get("db").unwrap();
        // Fresh cache slot after remove: a genuinely new instance.
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn get_typed_rejects_the_wrong_type() {
        let container = Container::new();
        container.set_instance("db", Database { url: "a".into() });

        let err = container.get_typed::<String>("db").unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn names_len_and_clear() {
        let container = Container::new();
        assert!(container.is_empty());

        container.set_instance("a", 1u8);
        container.set_instance("b", 2u8);
        assert_eq!(container.len(), 2);

        let mut names = container.names();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);

        container.clear();
        assert!(container.is_empty());
    }

    #[test]
    fn clones_share_the_registry() {
        let container = Container::new();
        let clone = container.clone();

        container.set_instance("db", Database { url: "a".into() });
        assert!(clone.has("db"));
    }
}
