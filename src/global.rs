//! The process-wide default container
//!
//! An explicit single-slot global with a set/replace/read/reset lifecycle:
//! setting it replaces any previous value with no history, and nothing is
//! installed until a caller installs it. Prefer passing a [`Container`]
//! explicitly; the slot is an escape hatch for code with no injection
//! point of its own. Tests that touch the slot should call
//! [`reset_default`] between cases.

use crate::Container;
use once_cell::sync::Lazy;
use std::sync::RwLock;

static DEFAULT: Lazy<RwLock<Option<Container>>> = Lazy::new(|| RwLock::new(None));

/// Install a container as the process default, replacing any previous one
/// (last writer wins, no stack).
pub fn set_default(container: Container) {
    *DEFAULT.write().unwrap() = Some(container);
}

/// The current default container, if one was installed.
///
/// Returns a clone sharing the installed container's registry.
pub fn default_container() -> Option<Container> {
    DEFAULT.read().unwrap().clone()
}

/// Empty the default slot
pub fn reset_default() {
    *DEFAULT.write().unwrap() = None;
}
