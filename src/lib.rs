//! # Servitor - a name-keyed service container
//!
//! A process-wide registry that maps string service names to construction
//! recipes ("definitions") and resolves them into live instances on
//! demand, with shared (cached) and fresh-instance lifecycles.
//!
//! ## Features
//!
//! - **Four registration styles, one model** - literal instance, bare
//!   class name, factory closure, and structured recipes with
//!   constructor/setter/property injection, unified under one tagged
//!   [`ServiceDefinition`]
//! - **Lazy shared instances** - resolved once, cached for the
//!   container's lifetime
//! - **Recursive wiring** - arguments can reference other services or
//!   nest ad-hoc instance specs, resolved depth-first
//! - **Cycle detection** - re-entering a name mid-resolution is a hard
//!   error, never a stack overflow
//! - **Lifecycle hooks** - an optional dispatcher sees every resolution
//!   and can veto it before side effects
//! - **Config-driven wiring** - structured definitions deserialize from
//!   JSON via [`schema`]
//! - **Observable** - structured `tracing` events under the `servitor`
//!   target (default `logging` feature)
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use servitor::class::{arg, ClassBuilder, ClassRegistry};
//! use servitor::{Argument, Container, ServiceDefinition};
//!
//! struct FileLogger {
//!     path: String,
//!     level: u8,
//! }
//!
//! // Rust has no reflection: the class registry is the "autoloader",
//! // mapping class names to constructible blueprints.
//! let classes = ClassRegistry::new();
//! classes.insert(
//!     ClassBuilder::<FileLogger>::new("FileLogger")
//!         .constructor(1, |args| {
//!             Ok(FileLogger {
//!                 path: arg::<String>(args, 0)?.clone(),
//!                 level: 0,
//!             })
//!         })
//!         .setter("set_level", |logger, args| {
//!             logger.level = *arg::<u8>(args, 0)?;
//!             Ok(())
//!         })
//!         .build(),
//! );
//!
//! let container = Container::with_classes(Arc::new(classes));
//!
//! container.set_shared(
//!     "logger",
//!     ServiceDefinition::for_class("FileLogger")
//!         .argument(Argument::parameter(String::from("/log")))
//!         .call("set_level", vec![Argument::parameter(3u8)]),
//! );
//!
//! let logger = container.get_typed::<FileLogger>("logger").unwrap();
//! assert_eq!(logger.path, "/log");
//! assert_eq!(logger.level, 3);
//!
//! // Shared: the same instance every time after the first resolution.
//! let again = container.get_typed::<FileLogger>("logger").unwrap();
//! assert!(Arc::ptr_eq(&logger, &again));
//! ```
//!
//! ## Service lifecycles
//!
//! ```rust
//! use servitor::Container;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! static COUNTER: AtomicU64 = AtomicU64::new(0);
//!
//! struct RequestId(u64);
//!
//! let container = Container::new();
//!
//! // Non-shared: a fresh instance on every resolution.
//! container.set_factory("request_id", || {
//!     RequestId(COUNTER.fetch_add(1, Ordering::SeqCst))
//! });
//!
//! let first = container.get_typed::<RequestId>("request_id").unwrap();
//! let second = container.get_typed::<RequestId>("request_id").unwrap();
//! assert_ne!(first.0, second.0);
//!
//! // get_shared pins a single instance even for non-shared definitions.
//! let pinned = container.get_shared("request_id").unwrap();
//! let again = container.get_shared("request_id").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&pinned, &again));
//! ```
//!
//! ## Concurrency
//!
//! The maps underneath are lock-free for readers, but the container makes
//! no atomicity promise across a `set`/`remove` racing the first
//! resolution of a shared name. Hosts that mutate and resolve the same
//! names concurrently serialize that themselves or give each context its
//! own container. Resolution itself is synchronous and depth-first: one
//! top-level `get` completes or fails as a single call.

pub mod class;
mod container;
mod definition;
mod error;
mod events;
pub mod global;
#[cfg(feature = "logging")]
pub mod logging;
mod registry;
mod resolver;
pub mod schema;

pub use container::Container;
pub use definition::{
    erase, Argument, ComplexRecipe, DefinitionKind, FactoryFn, Instance, MethodCall,
    PropertyAssignment, ServiceDefinition,
};
pub use error::{DiError, Result};
pub use events::{EventDispatcher, EventOutcome, ResolveEvent};
pub use registry::ServiceRef;

// Re-export tracing macros for convenience when the logging feature is on
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::class::{arg, ClassBuilder, ClassRegistry, ClassResolver, ContainerAware};
    pub use crate::{
        Argument, Container, DiError, EventDispatcher, EventOutcome, Instance, ResolveEvent,
        Result, ServiceDefinition,
    };
    pub use std::sync::Arc;
}
