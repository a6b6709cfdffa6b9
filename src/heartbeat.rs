//! Periodic presence heartbeat for the local client.

use crate::client_ledger::{ClientLedgerStore, ClientRecord, ClientUpsertParams};
use crate::error::{QueueError, QueueResult};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct HeartbeatSettings {
    pub client_id: String,
    pub interval: Duration,
    /// Sent with every beat; only stored when the row is first created.
    pub metadata: Option<JsonValue>,
}

/// Refreshes this client's ledger row on a timer.
pub struct ClientHeartbeat;

impl ClientHeartbeat {
    /// Start heartbeating. The first beat happens immediately.
    ///
    /// The task stops when `shutdown` (or the handle's own token) is cancelled.
    pub fn spawn(
        store: Arc<dyn ClientLedgerStore>,
        settings: HeartbeatSettings,
        shutdown: CancellationToken,
    ) -> HeartbeatHandle {
        let (record_tx, record_rx) = watch::channel(None);
        let token = shutdown.child_token();
        let task = tokio::spawn(run_heartbeat(store, settings, token.clone(), record_tx));
        HeartbeatHandle {
            record_rx,
            shutdown: token,
            task,
        }
    }
}

async fn run_heartbeat(
    store: Arc<dyn ClientLedgerStore>,
    settings: HeartbeatSettings,
    shutdown: CancellationToken,
    record_tx: watch::Sender<Option<ClientRecord>>,
) {
    info!(
        "Starting heartbeat for client '{}' every {:?}",
        settings.client_id, settings.interval
    );
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_paused: Option<bool> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => break,
        }

        let mut params = ClientUpsertParams::new(settings.client_id.clone());
        params.metadata = settings.metadata.clone();

        match beat(store.clone(), params).await {
            Ok(record) => {
                let paused = record.is_paused();
                match last_paused {
                    Some(was) if was != paused => {
                        if paused {
                            info!("Client '{}' was paused at {:?}", record.id, record.paused_at);
                        } else {
                            info!("Client '{}' was resumed", record.id);
                        }
                    }
                    None if paused => {
                        warn!("Client '{}' starts out paused", record.id);
                    }
                    _ => {}
                }
                last_paused = Some(paused);
                debug!("Heartbeat for '{}' at {}", record.id, record.updated_at);
                record_tx.send_replace(Some(record));
            }
            Err(e) => {
                error!(
                    "Heartbeat for client '{}' failed (retrying next tick): {}",
                    settings.client_id, e
                );
            }
        }
    }

    info!("Heartbeat for client '{}' stopped", settings.client_id);
}

async fn beat(
    store: Arc<dyn ClientLedgerStore>,
    params: ClientUpsertParams,
) -> QueueResult<ClientRecord> {
    tokio::task::spawn_blocking(move || store.upsert(params))
        .await
        .map_err(|e| QueueError::StorageUnavailable { source: e.into() })?
}

/// Handle to a running heartbeat.
pub struct HeartbeatHandle {
    record_rx: watch::Receiver<Option<ClientRecord>>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Receiver of the latest authoritative row, `None` until the first beat lands.
    pub fn subscribe(&self) -> watch::Receiver<Option<ClientRecord>> {
        self.record_rx.clone()
    }

    pub fn latest(&self) -> Option<ClientRecord> {
        self.record_rx.borrow().clone()
    }

    /// Pause state as of the last successful beat.
    pub fn is_paused(&self) -> bool {
        self.record_rx
            .borrow()
            .as_ref()
            .is_some_and(|record| record.is_paused())
    }

    /// Stop the heartbeat and wait for the task to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!("Heartbeat task ended abnormally: {}", e);
        }
    }
}
