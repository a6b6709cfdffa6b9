//! Lifecycle hooks for job insertion and job execution.
//!
//! Hooks are plain values implementing the [`Hook`] marker plus one trait per
//! lifecycle point they care about. A [`HookRegistry`] keeps them in
//! registration order and a [`LifecycleDispatcher`] runs them fail-fast.

mod builtin;
mod context;
mod dispatcher;
mod func;
mod hook;
mod registry;

pub use builtin::TracingHook;
pub use context::HookContext;
pub use dispatcher::LifecycleDispatcher;
pub use func::{HookFuture, HookInsertBeginFunc, HookWorkBeginFunc};
pub use hook::{Hook, HookCapability, HookInsertBegin, HookWorkBegin};
pub use registry::HookRegistry;
