//! Service definitions: the stored recipes describing how to build services
//!
//! Four registration styles are unified under one tagged union so the
//! resolver has exactly one branch per style instead of four independently
//! evolving code paths:
//!
//! - [`DefinitionKind::Literal`] - a pre-built instance, returned verbatim
//! - [`DefinitionKind::ClassRef`] - a bare class name, constructed through
//!   the class-resolution collaborator
//! - [`DefinitionKind::Factory`] - a zero-argument builder closure
//! - [`DefinitionKind::Complex`] - a class name plus ordered constructor
//!   arguments, setter calls, and property assignments

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased service instance. Every value that flows through the
/// container - resolved services, literal parameters, runtime arguments -
/// is one of these.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Zero-argument builder closure stored by factory definitions.
///
/// Any external state the builder needs must be captured at registration
/// time; the resolver never feeds arguments into a factory.
pub type FactoryFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Erase a concrete value into the container's instance currency.
#[inline]
pub fn erase<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Recipe for a single value fed into a constructor, setter, or property.
#[derive(Clone)]
pub enum Argument {
    /// Pass the stored value through verbatim
    Parameter { value: Instance },
    /// Resolve another service by name through the registry
    Service { name: String },
    /// Build a fresh, unregistered object on the spot from a nested spec
    Instance {
        class_name: String,
        arguments: Vec<Argument>,
    },
}

impl Argument {
    /// Literal parameter argument
    #[inline]
    pub fn parameter<T: Any + Send + Sync>(value: T) -> Self {
        Argument::Parameter {
            value: Arc::new(value),
        }
    }

    /// Literal parameter argument from an already-erased value
    #[inline]
    pub fn parameter_erased(value: Instance) -> Self {
        Argument::Parameter { value }
    }

    /// Reference to another registered service
    #[inline]
    pub fn service(name: impl Into<String>) -> Self {
        Argument::Service { name: name.into() }
    }

    /// Nested ad-hoc instance spec
    #[inline]
    pub fn instance(class_name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Argument::Instance {
            class_name: class_name.into(),
            arguments,
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Parameter { .. } => f.write_str("Parameter(<value>)"),
            Argument::Service { name } => write!(f, "Service({name})"),
            Argument::Instance {
                class_name,
                arguments,
            } => write!(f, "Instance({class_name}, {} args)", arguments.len()),
        }
    }
}

/// An ordered setter-injection step of a complex definition.
#[derive(Clone, Debug)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Vec<Argument>,
}

/// An ordered property-injection step of a complex definition.
#[derive(Clone, Debug)]
pub struct PropertyAssignment {
    pub name: String,
    pub value: Argument,
}

/// Structured recipe: class name plus ordered constructor arguments,
/// setter calls, and property assignments, each applied in declared order.
#[derive(Clone, Debug)]
pub struct ComplexRecipe {
    pub class_name: String,
    pub arguments: Vec<Argument>,
    pub calls: Vec<MethodCall>,
    pub properties: Vec<PropertyAssignment>,
}

impl ComplexRecipe {
    /// Empty recipe for a class name
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            arguments: Vec::new(),
            calls: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// The four registration styles.
#[derive(Clone)]
pub enum DefinitionKind {
    /// Pre-built instance, returned unchanged on every resolution
    Literal(Instance),
    /// Bare class name, constructed through the class resolver
    ClassRef { class_name: String },
    /// Zero-argument builder closure
    Factory(FactoryFn),
    /// Structured recipe with constructor/setter/property injection
    Complex(ComplexRecipe),
}

impl fmt::Debug for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Literal(_) => f.write_str("Literal(<instance>)"),
            DefinitionKind::ClassRef { class_name } => write!(f, "ClassRef({class_name})"),
            DefinitionKind::Factory(_) => f.write_str("Factory(<closure>)"),
            DefinitionKind::Complex(recipe) => write!(f, "Complex({:?})", recipe),
        }
    }
}

/// The stored recipe for one named service, plus its lifecycle flag.
///
/// `shared` definitions cache their first resolved instance for the
/// container's lifetime; non-shared definitions build a fresh instance on
/// every resolution. Literal definitions ignore the flag - the stored
/// instance is always returned unchanged.
#[derive(Clone, Debug)]
pub struct ServiceDefinition {
    pub kind: DefinitionKind,
    pub shared: bool,
}

impl ServiceDefinition {
    /// Literal definition wrapping a pre-built value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use servitor::ServiceDefinition;
    ///
    /// let def = ServiceDefinition::literal(String::from("postgres://localhost"));
    /// ```
    #[inline]
    pub fn literal<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            kind: DefinitionKind::Literal(Arc::new(value)),
            shared: false,
        }
    }

    /// Literal definition from an already-erased instance
    #[inline]
    pub fn literal_erased(value: Instance) -> Self {
        Self {
            kind: DefinitionKind::Literal(value),
            shared: false,
        }
    }

    /// Bare class-name definition, constructed through the class resolver
    #[inline]
    pub fn class_ref(class_name: impl Into<String>) -> Self {
        Self {
            kind: DefinitionKind::ClassRef {
                class_name: class_name.into(),
            },
            shared: false,
        }
    }

    /// Factory definition from a typed builder closure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use servitor::ServiceDefinition;
    ///
    /// struct Clock;
    ///
    /// let def = ServiceDefinition::factory(|| Clock);
    /// ```
    #[inline]
    pub fn factory<T, F>(builder: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            kind: DefinitionKind::Factory(Arc::new(move || Arc::new(builder()) as Instance)),
            shared: false,
        }
    }

    /// Factory definition from an already-erased builder
    #[inline]
    pub fn factory_erased(builder: FactoryFn) -> Self {
        Self {
            kind: DefinitionKind::Factory(builder),
            shared: false,
        }
    }

    /// Start a complex (structured) definition for a class.
    ///
    /// Chain [`argument`](Self::argument), [`call`](Self::call), and
    /// [`property`](Self::property) to fill in the injection steps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use servitor::{Argument, ServiceDefinition};
    ///
    /// let def = ServiceDefinition::for_class("FileLogger")
    ///     .argument(Argument::parameter(String::from("/log")))
    ///     .call("set_level", vec![Argument::parameter(3u8)])
    ///     .shared(true);
    /// ```
    #[inline]
    pub fn for_class(class_name: impl Into<String>) -> Self {
        Self {
            kind: DefinitionKind::Complex(ComplexRecipe::new(class_name)),
            shared: false,
        }
    }

    /// Complex definition from a fully built recipe
    #[inline]
    pub fn complex(recipe: ComplexRecipe) -> Self {
        Self {
            kind: DefinitionKind::Complex(recipe),
            shared: false,
        }
    }

    /// Append a constructor argument (complex definitions only).
    ///
    /// # Panics
    ///
    /// Panics if the definition is not complex.
    pub fn argument(mut self, argument: Argument) -> Self {
        self.recipe_mut("argument").arguments.push(argument);
        self
    }

    /// Append a setter call (complex definitions only).
    ///
    /// # Panics
    ///
    /// Panics if the definition is not complex.
    pub fn call(mut self, method: impl Into<String>, arguments: Vec<Argument>) -> Self {
        self.recipe_mut("call").calls.push(MethodCall {
            method: method.into(),
            arguments,
        });
        self
    }

    /// Append a property assignment (complex definitions only).
    ///
    /// # Panics
    ///
    /// Panics if the definition is not complex.
    pub fn property(mut self, name: impl Into<String>, value: Argument) -> Self {
        self.recipe_mut("property")
            .properties
            .push(PropertyAssignment {
                name: name.into(),
                value,
            });
        self
    }

    /// Set the shared (single-instance) flag
    #[inline]
    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Whether this definition caches its first resolved instance
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// The class name, for class-ref and complex definitions
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            DefinitionKind::ClassRef { class_name } => Some(class_name),
            DefinitionKind::Complex(recipe) => Some(&recipe.class_name),
            _ => None,
        }
    }

    /// Shared access to the structured recipe, if this definition is complex
    pub fn as_complex(&self) -> Option<&ComplexRecipe> {
        match &self.kind {
            DefinitionKind::Complex(recipe) => Some(recipe),
            _ => None,
        }
    }

    /// Mutable access to the structured recipe, if this definition is
    /// complex. Edits take effect on the next resolution.
    pub fn as_complex_mut(&mut self) -> Option<&mut ComplexRecipe> {
        match &mut self.kind {
            DefinitionKind::Complex(recipe) => Some(recipe),
            _ => None,
        }
    }

    fn recipe_mut(&mut self, op: &str) -> &mut ComplexRecipe {
        match &mut self.kind {
            DefinitionKind::Complex(recipe) => recipe,
            other => panic!("{op}() is only valid on complex definitions, not {other:?}"),
        }
    }
}
