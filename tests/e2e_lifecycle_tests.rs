//! End-to-end tests for lifecycle hooks guarding a downstream job table.

mod common;

use async_trait::async_trait;
use common::FakeJobTable;
use jobqueue_core::error::QueueError;
use jobqueue_core::hooks::{
    Hook, HookCapability, HookContext, HookInsertBegin, HookInsertBeginFunc, HookRegistry,
    HookWorkBeginFunc, LifecycleDispatcher, TracingHook,
};
use jobqueue_core::job::JobInsertParams;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Refuses every job aimed at the "blocked" queue.
struct BlockedQueueGuard;

impl Hook for BlockedQueueGuard {
    fn name(&self) -> &str {
        "blocked_queue_guard"
    }

    fn as_insert_begin(&self) -> Option<&dyn HookInsertBegin> {
        Some(self)
    }
}

#[async_trait]
impl HookInsertBegin for BlockedQueueGuard {
    async fn insert_begin(
        &self,
        _ctx: &HookContext,
        params: &mut JobInsertParams,
    ) -> anyhow::Result<()> {
        if params.queue == "blocked" {
            anyhow::bail!("queue '{}' does not accept jobs", params.queue);
        }
        Ok(())
    }
}

fn table_with(registry: HookRegistry) -> FakeJobTable {
    FakeJobTable::new(LifecycleDispatcher::new(Arc::new(registry)))
}

#[tokio::test]
async fn test_rejected_insert_creates_no_row() {
    let table = table_with(HookRegistry::new().with(TracingHook::new()).with(BlockedQueueGuard));
    let ctx = HookContext::background();

    let err = table
        .insert(
            &ctx,
            JobInsertParams::new("email", json!({})).with_queue("blocked"),
        )
        .await
        .unwrap_err();

    match err {
        QueueError::HookRejected { point, hook, .. } => {
            assert_eq!(point, HookCapability::InsertBegin);
            assert_eq!(hook, "blocked_queue_guard");
        }
        other => panic!("expected HookRejected, got {other:?}"),
    }
    assert!(table.rows().is_empty());

    let row = table
        .insert(&ctx, JobInsertParams::new("email", json!({})))
        .await
        .unwrap();
    assert_eq!(row.queue, "default");
    assert_eq!(table.rows().len(), 1);
}

#[tokio::test]
async fn test_panicking_hook_creates_no_row() {
    let hook = HookInsertBeginFunc::named("explodes_on_blocked", |_ctx, params| {
        Box::pin(async move {
            if params.queue == "blocked" {
                panic!("unexpected queue");
            }
            anyhow::Ok(())
        })
    });
    let table = table_with(HookRegistry::new().with(hook));

    let err = table
        .insert(
            &HookContext::background(),
            JobInsertParams::new("email", json!({})).with_queue("blocked"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::HookRejected { .. }));
    assert!(!err.is_retryable());
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn test_insert_hook_mutations_are_persisted() {
    let hook = HookInsertBeginFunc::named("stamp_source", |_ctx, params| {
        Box::pin(async move {
            params.set_metadata("source", json!("api"));
            params.tags.push("stamped".to_string());
            anyhow::Ok(())
        })
    });
    let table = table_with(HookRegistry::new().with(hook));

    let row = table
        .insert(
            &HookContext::background(),
            JobInsertParams::new("email", json!({"to": "x@y.z"})),
        )
        .await
        .unwrap();

    assert_eq!(row.metadata_value("source"), Some(&json!("api")));
    assert_eq!(row.tags, vec!["stamped".to_string()]);
    assert_eq!(table.rows()[0], row);
}

#[tokio::test]
async fn test_work_begin_hook_sees_attempt_details() {
    let single_attempt = HookWorkBeginFunc::named("single_attempt", |_ctx, job| {
        Box::pin(async move {
            if job.attempt > 1 {
                anyhow::bail!("job {} already attempted by {:?}", job.id, job.attempted_by);
            }
            job.metadata["checked"] = json!(true);
            anyhow::Ok(())
        })
    });
    let table = table_with(HookRegistry::new().with(single_attempt));
    let ctx = HookContext::background();

    let row = table
        .insert(&ctx, JobInsertParams::new("report", json!({})))
        .await
        .unwrap();

    let worked = table.work(&ctx, row.id, "w1").await.unwrap();
    assert_eq!(worked.attempt, 1);
    assert_eq!(worked.attempted_by, vec!["w1".to_string()]);
    assert_eq!(worked.metadata_value("checked"), Some(&json!(true)));
    assert_eq!(table.executed(), vec![row.id]);
}

#[tokio::test]
async fn test_rejected_work_begin_never_executes_job() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let counting = HookWorkBeginFunc::new(move |_ctx, _job| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(())
        })
    });
    let table = table_with(
        HookRegistry::new()
            .with(HookWorkBeginFunc::named("always_refuse", |_ctx, job| {
                Box::pin(async move { Err::<(), _>(anyhow::anyhow!("refusing job {}", job.id)) })
            }))
            .with(counting),
    );
    let ctx = HookContext::background();
    let row = table
        .insert(&ctx, JobInsertParams::new("report", json!({})))
        .await
        .unwrap();

    let err = table.work(&ctx, row.id, "w1").await.unwrap_err();
    match err {
        QueueError::HookRejected { point, hook, .. } => {
            assert_eq!(point, HookCapability::WorkBegin);
            assert_eq!(hook, "always_refuse");
        }
        other => panic!("expected HookRejected, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(table.executed().is_empty());
}

#[tokio::test]
async fn test_cancelled_context_is_not_a_rejection() {
    let table = table_with(HookRegistry::new().with(BlockedQueueGuard));
    let ctx = HookContext::background();
    ctx.cancellation_token.cancel();

    let err = table
        .insert(&ctx, JobInsertParams::new("email", json!({})))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(err.is_retryable());
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn test_concurrent_dispatches_share_one_registry() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let hook = HookInsertBeginFunc::new(move |_ctx, _params| {
        let counter = counter.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(())
        })
    });
    let table = Arc::new(table_with(HookRegistry::new().with(hook)));

    let mut handles = Vec::new();
    for i in 0..16 {
        let table = table.clone();
        handles.push(tokio::spawn(async move {
            table
                .insert(
                    &HookContext::background(),
                    JobInsertParams::new("bulk", json!({ "n": i })),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(seen.load(Ordering::SeqCst), 16);
    assert_eq!(table.rows().len(), 16);
}
