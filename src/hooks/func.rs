//! Adapters that turn a plain async closure into a hook.
//!
//! ```ignore
//! let hook = HookInsertBeginFunc::new(|_ctx, params| {
//!     Box::pin(async move {
//!         params.set_metadata("source", json!("api"));
//!         anyhow::Ok(())
//!     })
//! });
//! registry.register(hook);
//! ```

use super::context::HookContext;
use super::hook::{Hook, HookInsertBegin, HookWorkBegin};
use crate::job::{JobInsertParams, JobRow};
use async_trait::async_trait;
use futures::future::BoxFuture;

/// Future returned by closures wrapped in the function adapters.
pub type HookFuture<'a> = BoxFuture<'a, anyhow::Result<()>>;

/// Wraps a closure as an insert-begin hook.
pub struct HookInsertBeginFunc<F> {
    name: String,
    func: F,
}

impl<F> HookInsertBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobInsertParams) -> HookFuture<'a> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self::named("insert_begin_fn", func)
    }

    pub fn named(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Hook for HookInsertBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobInsertParams) -> HookFuture<'a> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
        Some(self)
    }
}

#[async_trait]
impl<F> HookInsertBegin for HookInsertBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobInsertParams) -> HookFuture<'a> + Send + Sync,
{
    async fn insert_begin(
        &self,
        ctx: &HookContext,
        params: &mut JobInsertParams,
    ) -> anyhow::Result<()> {
        (self.func)(ctx, params).await
    }
}

/// Wraps a closure as a work-begin hook.
pub struct HookWorkBeginFunc<F> {
    name: String,
    func: F,
}

impl<F> HookWorkBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobRow) -> HookFuture<'a> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self::named("work_begin_fn", func)
    }

    pub fn named(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Hook for HookWorkBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobRow) -> HookFuture<'a> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn as_work_begin(&self) -> Option<&dyn HookWorkBegin> {
        Some(self)
    }
}

#[async_trait]
impl<F> HookWorkBegin for HookWorkBeginFunc<F>
where
    F: for<'a> Fn(&'a HookContext, &'a mut JobRow) -> HookFuture<'a> + Send + Sync,
{
    async fn work_begin(&self, ctx: &HookContext, job: &mut JobRow) -> anyhow::Result<()> {
        (self.func)(ctx, job).await
    }
}
