use chrono::Utc;
use jobqueue_core::error::{QueueError, QueueResult};
use jobqueue_core::hooks::{HookContext, LifecycleDispatcher};
use jobqueue_core::job::{JobInsertParams, JobRow, JobState};
use std::sync::Mutex;

/// Minimal downstream job table that consults the lifecycle dispatcher the way
/// a real queue client does: hooks first, persistence only if they all pass.
pub struct FakeJobTable {
    dispatcher: LifecycleDispatcher,
    rows: Mutex<Vec<JobRow>>,
    executed: Mutex<Vec<i64>>,
}

impl FakeJobTable {
    pub fn new(dispatcher: LifecycleDispatcher) -> Self {
        Self {
            dispatcher,
            rows: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub async fn insert(&self, ctx: &HookContext, mut params: JobInsertParams) -> QueueResult<JobRow> {
        self.dispatcher.run_insert_begin(ctx, &mut params).await?;

        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let row = JobRow {
            id: rows.len() as i64 + 1,
            kind: params.kind,
            args: params.args,
            queue: params.queue,
            state: JobState::Available,
            attempt: 0,
            max_attempts: params.max_attempts,
            priority: params.priority,
            attempted_at: None,
            attempted_by: Vec::new(),
            created_at: now,
            scheduled_at: params.scheduled_at.unwrap_or(now),
            tags: params.tags,
            metadata: params.metadata,
        };
        rows.push(row.clone());
        Ok(row)
    }

    /// Fetch job `id` as `client_id`, run work-begin hooks, then "execute" it.
    pub async fn work(&self, ctx: &HookContext, id: i64, client_id: &str) -> QueueResult<JobRow> {
        let mut job = {
            let rows = self.rows.lock().unwrap();
            rows.iter()
                .find(|row| row.id == id)
                .cloned()
                .ok_or_else(|| QueueError::invalid_argument(format!("no job {id}")))?
        };
        job.state = JobState::Running;
        job.attempt += 1;
        job.attempted_at = Some(Utc::now());
        job.attempted_by.push(client_id.to_string());

        self.dispatcher.run_work_begin(ctx, &mut job).await?;

        self.executed.lock().unwrap().push(job.id);
        Ok(job)
    }

    pub fn rows(&self) -> Vec<JobRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<i64> {
        self.executed.lock().unwrap().clone()
    }
}
