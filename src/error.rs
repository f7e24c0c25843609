//! Error types for service registration and resolution

use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// No definition is registered under the name and the name is not a
    /// resolvable class either
    #[error("service not found: {name}")]
    ServiceNotFound { name: String },

    /// The class-resolution collaborator does not know the class name
    #[error("class not found: {class_name}")]
    ClassNotFound { class_name: String },

    /// A constructor was invoked with the wrong number of arguments
    #[error("constructor for {class_name} expects {expected} argument(s), got {actual}")]
    ConstructorArityMismatch {
        class_name: String,
        expected: usize,
        actual: usize,
    },

    /// A service-reference argument names a service with no definition
    #[error("argument references unknown service: {name}")]
    UnresolvableArgument { name: String },

    /// A resolution chain re-entered a name already being resolved in the
    /// same top-level call
    #[error("circular dependency detected while resolving {name}: {}", .chain.join(" -> "))]
    CircularDependency { name: String, chain: Vec<String> },

    /// An event hook answered `Stop` to the before-resolve notification
    #[error("resolution of {name} aborted by event hook")]
    ResolutionAborted { name: String },

    /// A structured definition named a setter the blueprint does not expose
    #[error("{class_name} has no setter {method}")]
    MethodNotFound { class_name: String, method: String },

    /// A structured definition named a property the blueprint does not expose
    #[error("{class_name} has no property {property}")]
    PropertyNotFound { class_name: String, property: String },

    /// A value did not downcast to the type the caller asked for
    #[error("type mismatch in {context}: expected {expected}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
    },

    /// A constructor, setter, or blueprint lookup failed for a reason of
    /// its own
    #[error("failed to build {name}: {reason}")]
    CreationFailed { name: String, reason: String },
}

impl DiError {
    /// Create a ServiceNotFound error
    #[inline]
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::ServiceNotFound { name: name.into() }
    }

    /// Create a ClassNotFound error
    #[inline]
    pub fn class_not_found(class_name: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class_name: class_name.into(),
        }
    }

    /// Create an UnresolvableArgument error
    #[inline]
    pub fn unresolvable_argument(name: impl Into<String>) -> Self {
        Self::UnresolvableArgument { name: name.into() }
    }

    /// Create a CircularDependency error carrying the full chain
    #[inline]
    pub fn circular(name: impl Into<String>, chain: Vec<String>) -> Self {
        Self::CircularDependency {
            name: name.into(),
            chain,
        }
    }

    /// Create a ResolutionAborted error
    #[inline]
    pub fn aborted(name: impl Into<String>) -> Self {
        Self::ResolutionAborted { name: name.into() }
    }

    /// Create a TypeMismatch error for a downcast that failed
    #[inline]
    pub fn type_mismatch<T: 'static>(context: impl Into<String>) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
