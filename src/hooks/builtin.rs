//! Built-in hooks.

use super::context::HookContext;
use super::hook::{Hook, HookInsertBegin, HookWorkBegin};
use crate::job::{JobInsertParams, JobRow};
use async_trait::async_trait;

/// Logs every insert-begin and work-begin event. Never rejects.
pub struct TracingHook {
    name: String,
}

impl TracingHook {
    pub fn new() -> Self {
        Self {
            name: "tracing".to_string(),
        }
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for TracingHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
        Some(self)
    }

    fn as_work_begin(&self) -> Option<&dyn HookWorkBegin> {
        Some(self)
    }
}

#[async_trait]
impl HookInsertBegin for TracingHook {
    async fn insert_begin(
        &self,
        _ctx: &HookContext,
        params: &mut JobInsertParams,
    ) -> anyhow::Result<()> {
        tracing::debug!(
            kind = %params.kind,
            queue = %params.queue,
            priority = params.priority,
            scheduled_at = ?params.scheduled_at,
            "Job insert begin"
        );
        Ok(())
    }
}

#[async_trait]
impl HookWorkBegin for TracingHook {
    async fn work_begin(&self, _ctx: &HookContext, job: &mut JobRow) -> anyhow::Result<()> {
        tracing::debug!(
            job_id = job.id,
            kind = %job.kind,
            queue = %job.queue,
            attempt = job.attempt,
            attempted_by = ?job.attempted_by.last(),
            "Job work begin"
        );
        Ok(())
    }
}
