//! Ordered hook registry.

use super::hook::{Hook, HookCapability, HookInsertBegin, HookWorkBegin};
use std::sync::Arc;
use tracing::debug;

/// Registry holding hooks in registration order.
///
/// Built mutably at startup, then shared behind an `Arc` and never mutated again,
/// so dispatch takes no locks.
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    /// Create an empty hook registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a hook. Registering the same hook twice makes it run twice.
    pub fn register(&mut self, hook: impl Hook + 'static) {
        self.register_arc(Arc::new(hook));
    }

    /// Append an already shared hook.
    pub fn register_arc(&mut self, hook: Arc<dyn Hook>) {
        debug!(
            "Registering hook '{}' at position {} with capabilities {:?}",
            hook.name(),
            self.hooks.len(),
            hook.capabilities()
        );
        self.hooks.push(hook);
    }

    /// Builder-style [`HookRegistry::register`].
    pub fn with(mut self, hook: impl Hook + 'static) -> Self {
        self.register(hook);
        self
    }

    /// All hooks, in registration order.
    pub fn hooks(&self) -> &[Arc<dyn Hook>] {
        &self.hooks
    }

    /// Hooks implementing `capability`, in registration order.
    ///
    /// The iterator borrows the registry and can be cloned or recreated freely.
    pub fn hooks_implementing(
        &self,
        capability: HookCapability,
    ) -> impl Iterator<Item = &Arc<dyn Hook>> + Clone + '_ {
        self.hooks.iter().filter(move |h| h.implements(capability))
    }

    pub fn insert_begin_hooks(&self) -> impl Iterator<Item = &dyn HookInsertBegin> + Clone + '_ {
        self.hooks.iter().filter_map(|h| h.as_insert_begin())
    }

    pub fn work_begin_hooks(&self) -> impl Iterator<Item = &dyn HookWorkBegin> + Clone + '_ {
        self.hooks.iter().filter_map(|h| h.as_work_begin())
    }

    /// Get the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}
