use std::collections::HashMap;
use std::sync::Arc;

use ensemble_config::HandlerCatalog;
use ensemble_types::{ActionName, Rule};

use crate::workload_manager::JobEvent;

/// What a [`CustomHandler`] is given to decide with: the event that
/// triggered it (absent for non-event triggers like `heartbeat` or
/// `metric`), the rule being evaluated, and a read-only metrics snapshot
/// value for convenience (resolved lazily by the caller via `metric`).
pub struct CustomContext<'a> {
    /// The rule whose `custom` action is firing.
    pub rule: &'a Rule,
    /// The event that caused this firing, if any.
    pub event: Option<&'a JobEvent>,
}

/// An action a [`CustomHandler`] asks the executor to perform on its behalf,
/// re-dispatched exactly one level (SPEC_FULL.md §4.4, Open Question ii).
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    /// Which action to perform.
    pub name: ActionName,
    /// Group name, handler name, or similar, depending on `name`.
    pub label: Option<String>,
    /// Resize magnitude, when `name` is `grow`/`shrink`.
    pub value: Option<f64>,
}

/// A statically registered replacement for the original implementation's
/// dynamically-compiled `custom` functions (REDESIGN FLAG #1 in
/// SPEC_FULL.md §9). Implementations are plain Rust and are wired up by the
/// embedding binary before configuration is loaded.
pub trait CustomHandler: Send + Sync {
    /// Run the handler, optionally asking the executor to perform a further
    /// action.
    fn call(&self, ctx: CustomContext<'_>) -> Option<ActionDescriptor>;
}

/// The set of `custom` handlers available to a given run, keyed by the name
/// referenced in `action.label`.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn CustomHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any existing handler with
    /// that name.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn CustomHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up a registered handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CustomHandler>> {
        self.handlers.get(name).cloned()
    }
}

impl HandlerCatalog for HandlerRegistry {
    fn contains(&self, label: &str) -> bool {
        self.handlers.contains_key(label)
    }
}
