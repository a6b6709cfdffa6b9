//! Fail-fast execution of hooks at each lifecycle point.

use super::context::HookContext;
use super::hook::HookCapability;
use super::registry::HookRegistry;
use crate::error::{Cancelled, QueueError, QueueResult};
use crate::job::{JobInsertParams, JobRow};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs registered hooks for a lifecycle point, in order, stopping at the first
/// failure.
///
/// Each call runs its hooks sequentially. Different jobs may be dispatched
/// concurrently from the same dispatcher.
#[derive(Clone, Debug)]
pub struct LifecycleDispatcher {
    registry: Arc<HookRegistry>,
}

impl LifecycleDispatcher {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Run insert-begin hooks against the params of a job about to be inserted.
    ///
    /// On `Err` the caller must not insert the job. Hooks may have modified
    /// `params` before the failing one ran.
    pub async fn run_insert_begin(
        &self,
        ctx: &HookContext,
        params: &mut JobInsertParams,
    ) -> QueueResult<()> {
        let point = HookCapability::InsertBegin;
        for hook in self.registry.insert_begin_hooks() {
            ensure_active(ctx, point)?;
            debug!("Running {} hook '{}' for kind {}", point, hook.name(), params.kind);
            let outcome = AssertUnwindSafe(hook.insert_begin(ctx, params))
                .catch_unwind()
                .await;
            settle(point, hook.name(), outcome)?;
        }
        Ok(())
    }

    /// Run work-begin hooks against a claimed job.
    ///
    /// On `Err` the caller must not run the job body this attempt.
    pub async fn run_work_begin(&self, ctx: &HookContext, job: &mut JobRow) -> QueueResult<()> {
        let point = HookCapability::WorkBegin;
        for hook in self.registry.work_begin_hooks() {
            ensure_active(ctx, point)?;
            debug!("Running {} hook '{}' for job {}", point, hook.name(), job.id);
            let outcome = AssertUnwindSafe(hook.work_begin(ctx, job))
                .catch_unwind()
                .await;
            settle(point, hook.name(), outcome)?;
        }
        Ok(())
    }
}

fn ensure_active(ctx: &HookContext, point: HookCapability) -> QueueResult<()> {
    if ctx.is_cancelled() {
        debug!("Context done before {} hooks finished", point);
        return Err(QueueError::Cancelled { point: Some(point) });
    }
    Ok(())
}

fn settle(
    point: HookCapability,
    hook_name: &str,
    outcome: Result<anyhow::Result<()>, Box<dyn Any + Send>>,
) -> QueueResult<()> {
    let err = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => err,
        Err(panic) => anyhow::anyhow!("hook panicked: {}", panic_message(panic.as_ref())),
    };

    // Only the marker counts as cancellation; a plain error is a veto even
    // if the deadline has passed by the time it returns.
    if err.chain().any(|cause| cause.is::<Cancelled>()) {
        debug!("{} hook '{}' stopped by cancellation: {}", point, hook_name, err);
        return Err(QueueError::Cancelled { point: Some(point) });
    }

    warn!("{} hook '{}' rejected: {:#}", point, hook_name, err);
    Err(QueueError::HookRejected {
        point,
        hook: hook_name.to_string(),
        source: err,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
