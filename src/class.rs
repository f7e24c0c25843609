//! Class-resolution collaborator
//!
//! Rust has no runtime reflection, so "resolve a bare class name into a
//! constructible type" is modeled as an injected capability instead of
//! magic baked into the resolver: a [`ClassResolver`] maps class names to
//! [`Blueprint`]s, and a blueprint knows how to construct its concrete type
//! from erased arguments and how to apply named setter calls and property
//! assignments to it.
//!
//! [`ClassRegistry`] is the default resolver: a concurrent map of
//! blueprints built with [`ClassBuilder`], plus the capability probes used
//! for post-construction container injection.

use crate::definition::Instance;
use crate::{Container, DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// An instance still under construction, before it is frozen into an
/// [`Instance`]. Setter calls and property assignments mutate it in place.
pub type BoxedInstance = Box<dyn Any + Send + Sync>;

/// Contract for objects that want the owning container handed to them
/// right after construction.
///
/// The resolver probes every freshly built instance through the class
/// resolver and, when the capability is present, injects the container
/// exactly once. Implementers typically stash it in a `OnceLock`.
pub trait ContainerAware: Send + Sync {
    /// Receive the container that built this instance
    fn set_container(&self, container: Container);
}

/// A constructible class: knows how to build its concrete type from erased
/// arguments and how to apply named injection steps to a built instance.
pub trait Blueprint: Send + Sync {
    /// The class name this blueprint is registered under
    fn class_name(&self) -> &str;

    /// Construct an instance from resolved constructor arguments.
    ///
    /// Implementations check arity and surface
    /// [`DiError::ConstructorArityMismatch`] on a wrong argument count.
    fn construct(&self, args: &[Instance]) -> Result<BoxedInstance>;

    /// Apply a named setter call to an instance under construction
    fn call(&self, instance: &mut BoxedInstance, method: &str, args: &[Instance]) -> Result<()>;

    /// Apply a named property assignment to an instance under construction
    fn set_property(&self, instance: &mut BoxedInstance, property: &str, value: Instance)
        -> Result<()>;
}

/// Maps class names to blueprints; the container consults it for class-ref
/// and complex definitions and for the bare-name fallback in `get`.
pub trait ClassResolver: Send + Sync {
    /// Resolve a class name to its blueprint, if known
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn Blueprint>>;

    /// Whether the class name is resolvable
    fn is_known(&self, class_name: &str) -> bool {
        self.resolve(class_name).is_some()
    }

    /// Probe a built instance for the container-aware capability.
    ///
    /// The default implementation knows no capabilities; see
    /// [`ClassRegistry::register_container_aware`].
    fn container_aware<'a>(
        &self,
        instance: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a dyn ContainerAware> {
        let _ = instance;
        None
    }
}

/// Extract a typed constructor argument from the erased argument slice.
///
/// # Examples
///
/// ```rust
/// use servitor::class::{arg, ClassBuilder};
///
/// struct FileLogger { path: String }
///
/// let blueprint = ClassBuilder::<FileLogger>::new("FileLogger")
///     .constructor(1, |args| {
///         Ok(FileLogger { path: arg::<String>(args, 0)?.clone() })
///     })
///     .build();
/// ```
pub fn arg<T: Any + Send + Sync>(args: &[Instance], index: usize) -> Result<&T> {
    let value = args
        .get(index)
        .ok_or_else(|| DiError::type_mismatch::<T>(format!("missing argument {index}")))?;
    value
        .downcast_ref::<T>()
        .ok_or_else(|| DiError::type_mismatch::<T>(format!("argument {index}")))
}

type Ctor<T> = Box<dyn Fn(&[Instance]) -> Result<T> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &[Instance]) -> Result<()> + Send + Sync>;
type PropertySetter<T> = Box<dyn Fn(&mut T, Instance) -> Result<()> + Send + Sync>;

/// Builder for a typed [`Blueprint`].
///
/// # Examples
///
/// ```rust
/// use servitor::class::{arg, ClassBuilder, ClassRegistry};
///
/// struct FileLogger {
///     path: String,
///     level: u8,
/// }
///
/// let classes = ClassRegistry::new();
/// classes.insert(
///     ClassBuilder::<FileLogger>::new("FileLogger")
///         .constructor(1, |args| {
///             Ok(FileLogger { path: arg::<String>(args, 0)?.clone(), level: 0 })
///         })
///         .setter("set_level", |logger, args| {
///             logger.level = *arg::<u8>(args, 0)?;
///             Ok(())
///         })
///         .build(),
/// );
/// ```
pub struct ClassBuilder<T> {
    class_name: String,
    arity: usize,
    ctor: Option<Ctor<T>>,
    setters: HashMap<String, Setter<T>>,
    properties: HashMap<String, PropertySetter<T>>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    /// Start a blueprint for a class name
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            arity: 0,
            ctor: None,
            setters: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    /// Set the constructor and its expected argument count.
    ///
    /// Constructing with a different number of arguments fails with
    /// [`DiError::ConstructorArityMismatch`] before the closure runs.
    pub fn constructor<F>(mut self, arity: usize, ctor: F) -> Self
    where
        F: Fn(&[Instance]) -> Result<T> + Send + Sync + 'static,
    {
        self.arity = arity;
        self.ctor = Some(Box::new(ctor));
        self
    }

    /// Register a named setter for method-call injection steps
    pub fn setter<F>(mut self, method: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, &[Instance]) -> Result<()> + Send + Sync + 'static,
    {
        self.setters.insert(method.into(), Box::new(setter));
        self
    }

    /// Register a named property for property-assignment injection steps
    pub fn property<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.properties.insert(name.into(), Box::new(setter));
        self
    }

    /// Finish the blueprint
    pub fn build(self) -> TypedBlueprint<T> {
        TypedBlueprint { inner: self }
    }
}

/// Blueprint produced by [`ClassBuilder`]; downcasts instances to `T`
/// internally before applying injection steps.
pub struct TypedBlueprint<T> {
    inner: ClassBuilder<T>,
}

impl<T: Any + Send + Sync> TypedBlueprint<T> {
    fn downcast<'a>(&self, instance: &'a mut BoxedInstance, step: &str) -> Result<&'a mut T> {
        let class_name = self.inner.class_name.clone();
        instance
            .downcast_mut::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(format!("{step} on {class_name}")))
    }
}

impl<T: Any + Send + Sync> Blueprint for TypedBlueprint<T> {
    fn class_name(&self) -> &str {
        &self.inner.class_name
    }

    fn construct(&self, args: &[Instance]) -> Result<BoxedInstance> {
        let ctor = self.inner.ctor.as_ref().ok_or_else(|| {
            DiError::creation_failed(&self.inner.class_name, "no constructor registered")
        })?;
        if args.len() != self.inner.arity {
            return Err(DiError::ConstructorArityMismatch {
                class_name: self.inner.class_name.clone(),
                expected: self.inner.arity,
                actual: args.len(),
            });
        }
        Ok(Box::new(ctor(args)?))
    }

    fn call(&self, instance: &mut BoxedInstance, method: &str, args: &[Instance]) -> Result<()> {
        let setter = self.inner.setters.get(method).ok_or_else(|| DiError::MethodNotFound {
            class_name: self.inner.class_name.clone(),
            method: method.to_string(),
        })?;
        let target = self.downcast(instance, method)?;
        setter(target, args)
    }

    fn set_property(
        &self,
        instance: &mut BoxedInstance,
        property: &str,
        value: Instance,
    ) -> Result<()> {
        let setter =
            self.inner
                .properties
                .get(property)
                .ok_or_else(|| DiError::PropertyNotFound {
                    class_name: self.inner.class_name.clone(),
                    property: property.to_string(),
                })?;
        let target = self.downcast(instance, property)?;
        setter(target, value)
    }
}

/// Capability probe: tries to view an erased instance as container-aware
type AwareProbe = fn(&(dyn Any + Send + Sync)) -> Option<&dyn ContainerAware>;

fn probe_for<T: ContainerAware + Any + Send + Sync>(
    instance: &(dyn Any + Send + Sync),
) -> Option<&dyn ContainerAware> {
    instance.downcast_ref::<T>().map(|t| t as &dyn ContainerAware)
}

/// Default [`ClassResolver`]: a concurrent map of blueprints plus the
/// capability probes for container-aware types.
pub struct ClassRegistry {
    blueprints: DashMap<String, Arc<dyn Blueprint>, RandomState>,
    probes: DashMap<TypeId, AwareProbe, RandomState>,
}

impl ClassRegistry {
    /// Create an empty registry.
    ///
    /// Uses a small fixed shard count - class registries hold tens of
    /// entries, not thousands.
    pub fn new() -> Self {
        Self {
            blueprints: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
            probes: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Register a blueprint under its own class name, overwriting any
    /// previous blueprint for that name
    pub fn insert(&self, blueprint: impl Blueprint + 'static) {
        self.insert_arc(Arc::new(blueprint));
    }

    /// Register an already-shared blueprint
    pub fn insert_arc(&self, blueprint: Arc<dyn Blueprint>) {
        self.blueprints
            .insert(blueprint.class_name().to_string(), blueprint);
    }

    /// Mark a concrete type as container-aware.
    ///
    /// Instances of `T` built by any definition style (literal, class-ref,
    /// factory, or complex) will receive the owning container right after
    /// construction.
    pub fn register_container_aware<T: ContainerAware + Any + Send + Sync>(&self) {
        self.probes.insert(TypeId::of::<T>(), probe_for::<T>);
    }

    /// Number of registered blueprints
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Whether no blueprints are registered
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn Blueprint>> {
        self.blueprints.get(class_name).map(|r| Arc::clone(r.value()))
    }

    fn is_known(&self, class_name: &str) -> bool {
        self.blueprints.contains_key(class_name)
    }

    fn container_aware<'a>(
        &self,
        instance: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a dyn ContainerAware> {
        let probe = self.probes.get(&instance.type_id()).map(|p| *p.value())?;
        probe(instance)
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("blueprints", &self.len())
            .field("probes", &self.probes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::erase;
    use std::sync::OnceLock;

    struct FileLogger {
        path: String,
        level: u8,
        prefix: String,
    }

    fn logger_blueprint() -> TypedBlueprint<FileLogger> {
        ClassBuilder::<FileLogger>::new("FileLogger")
            .constructor(1, |args| {
                Ok(FileLogger {
                    path: arg::<String>(args, 0)?.clone(),
                    level: 0,
                    prefix: String::new(),
                })
            })
            .setter("set_level", |logger, args| {
                logger.level = *arg::<u8>(args, 0)?;
                Ok(())
            })
            .property("prefix", |logger, value| {
                logger.prefix = value
                    .downcast_ref::<String>()
                    .ok_or_else(|| DiError::type_mismatch::<String>("prefix"))?
                    .clone();
                Ok(())
            })
            .build()
    }

    #[test]
    fn construct_applies_typed_arguments() {
        let blueprint = logger_blueprint();
        let built = blueprint.construct(&[erase(String::from("/log"))]).unwrap();
        let logger = built.downcast_ref::<FileLogger>().unwrap();
        assert_eq!(logger.path, "/log");
    }

    #[test]
    fn construct_checks_arity() {
        let blueprint = logger_blueprint();
        let err = blueprint.construct(&[]).unwrap_err();
        assert!(matches!(
            err,
            DiError::ConstructorArityMismatch { expected: 1, actual: 0, .. }
        ));
    }

    #[test]
    fn setter_and_property_mutate_in_place() {
        let blueprint = logger_blueprint();
        let mut built = blueprint.construct(&[erase(String::from("/log"))]).unwrap();

        blueprint.call(&mut built, "set_level", &[erase(3u8)]).unwrap();
        blueprint
            .set_property(&mut built, "prefix", erase(String::from("app")))
            .unwrap();

        let logger = built.downcast_ref::<FileLogger>().unwrap();
        assert_eq!(logger.level, 3);
        assert_eq!(logger.prefix, "app");
    }

    #[test]
    fn unknown_setter_is_an_error() {
        let blueprint = logger_blueprint();
        let mut built = blueprint.construct(&[erase(String::from("/log"))]).unwrap();
        let err = blueprint.call(&mut built, "set_color", &[]).unwrap_err();
        assert!(matches!(err, DiError::MethodNotFound { method, .. } if method == "set_color"));
    }

    #[test]
    fn unknown_property_is_an_error() {
        let blueprint = logger_blueprint();
        let mut built = blueprint.construct(&[erase(String::from("/log"))]).unwrap();
        let err = blueprint
            .set_property(&mut built, "color", erase(String::from("red")))
            .unwrap_err();
        assert!(matches!(err, DiError::PropertyNotFound { property, .. } if property == "color"));
    }

    #[test]
    fn registry_resolves_by_class_name() {
        let classes = ClassRegistry::new();
        assert!(!classes.is_known("FileLogger"));

        classes.insert(logger_blueprint());
        assert!(classes.is_known("FileLogger"));
        let blueprint = classes.resolve("FileLogger").unwrap();
        assert_eq!(blueprint.class_name(), "FileLogger");
    }

    #[test]
    fn aware_probe_finds_registered_types() {
        struct Aware {
            container: OnceLock<Container>,
        }

        impl ContainerAware for Aware {
            fn set_container(&self, container: Container) {
                let _ = self.container.set(container);
            }
        }

        let classes = ClassRegistry::new();
        classes.register_container_aware::<Aware>();

        let instance = Aware {
            container: OnceLock::new(),
        };
        assert!(classes.container_aware(&instance).is_some());

        let unaware = String::from("plain");
        assert!(classes.container_aware(&unaware).is_none());
    }
}
