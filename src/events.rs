//! Lifecycle event hooks
//!
//! The container itself fires no events; when a dispatcher is attached it
//! is notified before and after each resolution. A `Stop` answer to the
//! before-resolve notification aborts the resolution with
//! [`DiError::ResolutionAborted`](crate::DiError::ResolutionAborted) before
//! any side effect.

use crate::definition::Instance;

/// Answer from a dispatcher: keep going or abort the resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Proceed with the resolution
    Continue,
    /// Abort before any side effect (only meaningful on
    /// [`ResolveEvent::BeforeResolve`]; ignored after the fact)
    Stop,
}

/// Payload delivered to the dispatcher around each resolution
#[derive(Clone)]
pub enum ResolveEvent<'a> {
    /// About to resolve `name`; `args` are the caller-supplied runtime
    /// constructor arguments, if any
    BeforeResolve {
        name: &'a str,
        args: Option<&'a [Instance]>,
    },
    /// `name` resolved to `instance`, which has not been cached yet
    AfterResolve {
        name: &'a str,
        instance: &'a Instance,
        args: Option<&'a [Instance]>,
    },
}

impl ResolveEvent<'_> {
    /// The service name this event concerns
    pub fn name(&self) -> &str {
        match self {
            ResolveEvent::BeforeResolve { name, .. } => name,
            ResolveEvent::AfterResolve { name, .. } => name,
        }
    }
}

impl std::fmt::Debug for ResolveEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveEvent::BeforeResolve { name, args } => f
                .debug_struct("BeforeResolve")
                .field("name", name)
                .field("args", &args.map(<[Instance]>::len))
                .finish(),
            ResolveEvent::AfterResolve { name, args, .. } => f
                .debug_struct("AfterResolve")
                .field("name", name)
                .field("instance", &format_args!("<resolved>"))
                .field("args", &args.map(<[Instance]>::len))
                .finish(),
        }
    }
}

/// External event-dispatcher collaborator
pub trait EventDispatcher: Send + Sync {
    /// Deliver one lifecycle notification
    fn notify(&self, event: &ResolveEvent<'_>) -> EventOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::erase;

    #[test]
    fn event_exposes_its_service_name() {
        let before = ResolveEvent::BeforeResolve {
            name: "logger",
            args: None,
        };
        assert_eq!(before.name(), "logger");

        let instance = erase(1u8);
        let after = ResolveEvent::AfterResolve {
            name: "logger",
            instance: &instance,
            args: None,
        };
        assert_eq!(after.name(), "logger");
    }

    #[test]
    fn debug_output_distinguishes_the_variants() {
        let before = ResolveEvent::BeforeResolve {
            name: "logger",
            args: None,
        };
        let instance = erase(1u8);
        let after = ResolveEvent::AfterResolve {
            name: "logger",
            instance: &instance,
            args: None,
        };

        let before_dbg = format!("{before:?}");
        let after_dbg = format!("{after:?}");
        assert!(before_dbg.starts_with("BeforeResolve"));
        assert!(after_dbg.starts_with("AfterResolve"));
        assert!(after_dbg.contains("instance"));
        assert!(!before_dbg.contains("instance"));
    }
}
