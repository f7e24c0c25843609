//! Storage for service definitions and resolved shared instances
//!
//! Uses `DashMap` with `ahash` so reads never block each other. Note that
//! map-level safety is all the registry promises: racing a `register`
//! against a first resolution of the same shared name is the caller's
//! problem to serialize.

use crate::definition::{Instance, ServiceDefinition};
use ahash::RandomState;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::ops::{Deref, DerefMut};

#[cfg(feature = "logging")]
use tracing::debug;

/// Definitions keyed by service name, plus the cache of already-resolved
/// shared instances. One registry is exclusively owned by one container.
pub(crate) struct ServiceRegistry {
    /// Current definition per name; `register` overwrites, never merges
    definitions: DashMap<String, ServiceDefinition, RandomState>,
    /// Resolved shared instances, held for the container's full lifetime
    shared: DashMap<String, Instance, RandomState>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    ///
    /// Uses 8 shards: service registries hold tens of names, and fewer
    /// shards keep creation cheap without hurting concurrent reads.
    pub(crate) fn new() -> Self {
        Self {
            definitions: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
            shared: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Store or overwrite the definition for a name.
    ///
    /// Deliberately leaves any cached shared instance for the name in
    /// place: replacing a definition after its shared instance was built
    /// does not retroactively change that instance. `remove` or `clear`
    /// invalidate explicitly.
    pub(crate) fn register(&self, name: impl Into<String>, definition: ServiceDefinition) {
        let name = name.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "servitor",
            service = %name,
            shared = definition.shared,
            "Registering service definition"
        );

        self.definitions.insert(name, definition);
    }

    /// Clone out the current definition for a name.
    ///
    /// Clone-out keeps the map guard out of the resolver: recursive
    /// argument resolution re-enters this registry, and a held shard guard
    /// would deadlock.
    pub(crate) fn lookup(&self, name: &str) -> Option<ServiceDefinition> {
        self.definitions.get(name).map(|r| r.value().clone())
    }

    /// Mutable guard over the stored definition itself
    pub(crate) fn lookup_mut(&self, name: &str) -> Option<ServiceRef<'_>> {
        self.definitions.get_mut(name).map(ServiceRef)
    }

    /// Whether a definition exists for the name
    pub(crate) fn has(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Drop the definition and any cached shared instance for a name
    pub(crate) fn remove(&self, name: &str) -> bool {
        self.shared.remove(name);
        self.definitions.remove(name).is_some()
    }

    /// The cached shared instance for a name, if one was resolved
    pub(crate) fn cached(&self, name: &str) -> Option<Instance> {
        self.shared.get(name).map(|r| Instance::clone(r.value()))
    }

    /// Cache a resolved shared instance
    pub(crate) fn cache(&self, name: impl Into<String>, instance: Instance) {
        self.shared.insert(name.into(), instance);
    }

    /// All registered service names
    pub(crate) fn names(&self) -> Vec<String> {
        self.definitions.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of registered definitions
    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions are registered
    pub(crate) fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Drop every definition and every cached shared instance
    pub(crate) fn clear(&self) {
        let count = self.definitions.len();
        self.definitions.clear();
        self.shared.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "servitor",
            services_removed = count,
            "Registry cleared"
        );
        #[cfg(not(feature = "logging"))]
        let _ = count;
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("definitions", &self.definitions.len())
            .field("shared_cached", &self.shared.len())
            .finish()
    }
}

/// Mutable guard over a stored [`ServiceDefinition`].
///
/// Returned by [`Container::service_mut`](crate::Container::service_mut).
/// Holds a map shard lock: drop it before resolving anything, or the
/// resolution can deadlock against the guard.
pub struct ServiceRef<'a>(RefMut<'a, String, ServiceDefinition>);

impl ServiceRef<'_> {
    /// The service name this definition is registered under
    pub fn name(&self) -> &str {
        self.0.key()
    }
}

impl Deref for ServiceRef<'_> {
    type Target = ServiceDefinition;

    fn deref(&self) -> &Self::Target {
        self.0.value()
    }
}

impl DerefMut for ServiceRef<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.value_mut()
    }
}

impl std::fmt::Debug for ServiceRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRef")
            .field("name", &self.name())
            .field("definition", &**self)
            .finish()
    }
}
