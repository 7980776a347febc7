//! Synchronizer: the per-board worker that owns every remote write.
//!
//! DESIGN
//! ======
//! One task per open board. It `select!`s over a bounded command channel
//! (creates, deletes, wake-ups, close) and a sleep until the engine's next
//! debounce deadline. Writes run one at a time inside the task. The select is
//! biased toward the queue, so a create already queued always lands before a
//! debounced write for the same item.
//!
//! Creates and deletes wait for room in the queue; only wake-ups are
//! best-effort.
//!
//! The engine lock is held only to snapshot or ack. Remote I/O happens with
//! the lock released, so interaction never waits on the network.
//!
//! ERROR HANDLING
//! ==============
//! A failed write leaves its items dirty (the ack never happens) and notifies
//! the user. Nothing is retried on a timer; the next mutation re-arms the
//! deadline and the retry rides along with it. Asset releases are
//! best-effort and only logged.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use canvas::dirty::Millis;
use canvas::doc::{BoardId, BoardItem, ItemId};
use canvas::engine::{EngineCore, PendingWrites};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::notify::{Notifier, NotifyKind};
use crate::remote::{AssetStore, BatchEntry, BoardBackend};
use crate::services::session::SessionError;

pub type SharedEngine = Arc<Mutex<EngineCore>>;

/// Millisecond clock for the engine, anchored when the board opened.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    #[must_use]
    pub fn start() -> Self {
        Self { origin: Instant::now() }
    }

    #[must_use]
    pub fn now_ms(&self) -> Millis {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn instant_at(&self, ms: Millis) -> Instant {
        self.origin + Duration::from_millis(ms)
    }
}

/// Work for the sync worker.
#[derive(Debug)]
pub enum SyncCommand {
    /// Immediate create of an item that exists locally.
    Create(BoardItem),
    /// Immediate delete, then best-effort release of the owned asset.
    Delete { id: ItemId, asset_url: Option<String> },
    /// The engine's next deadline may have moved.
    Wake,
    /// Flush everything pending, reply, and stop.
    Close(oneshot::Sender<FlushReport>),
}

impl SyncCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Delete { .. } => "delete",
            Self::Wake => "wake",
            Self::Close(_) => "close",
        }
    }
}

/// What one flush wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Items carried by a successful geometry batch.
    pub geometry_items: usize,
    /// Successful content writes.
    pub content_items: usize,
    /// Writes that failed.
    pub failures: usize,
}

impl FlushReport {
    fn absorb(&mut self, other: FlushReport) {
        self.geometry_items += other.geometry_items;
        self.content_items += other.content_items;
        self.failures += other.failures;
    }
}

/// Everything the worker needs for one board.
#[derive(Clone)]
pub struct SyncDeps {
    pub board_id: BoardId,
    pub engine: SharedEngine,
    pub clock: Clock,
    pub backend: Arc<dyn BoardBackend>,
    pub assets: Arc<dyn AssetStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Sending half of a worker's command queue.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    /// Queue a command, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the worker is gone.
    pub async fn submit(&self, command: SyncCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|e| {
            warn!(command = e.0.label(), "sync queue closed; dropping command");
            SessionError::Closed
        })
    }

    /// Non-blocking nudge to re-read the engine's next deadline.
    pub fn wake(&self) {
        match self.tx.try_send(SyncCommand::Wake) {
            // A non-empty queue already guarantees the worker re-reads it.
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => debug!("sync queue closed; wake ignored"),
        }
    }

    /// Ask the worker to flush everything and stop.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the worker is already gone.
    pub async fn close(&self) -> Result<FlushReport, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(SyncCommand::Close(tx)).await.map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Spawn the sync worker for one board.
#[must_use]
pub fn spawn_sync_worker(deps: SyncDeps, queue_capacity: usize) -> (SyncHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_capacity.max(1));
    info!(board_id = %deps.board_id, queue_capacity, "sync worker started");
    let worker = SyncWorker { deps, aliases: HashMap::new() };
    (SyncHandle { tx }, tokio::spawn(worker.run(rx)))
}

struct SyncWorker {
    deps: SyncDeps,
    /// Client id → id assigned by the remote, for items deleted locally
    /// before their create finished. Each entry is consumed by that delete.
    aliases: HashMap<ItemId, ItemId>,
}

impl SyncWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<SyncCommand>) {
        loop {
            let wake_at = self.deps.engine.lock().await.next_deadline().map(|ms| self.deps.clock.instant_at(ms));
            tokio::select! {
                biased;
                maybe_cmd = rx.recv() => match maybe_cmd {
                    Some(cmd) => {
                        if self.handle(cmd).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        // Every handle dropped without an explicit close.
                        self.flush_all().await;
                        break;
                    }
                },
                () = sleep_until(wake_at) => {
                    self.flush_due().await;
                }
            }
        }
        info!(board_id = %self.deps.board_id, "sync worker stopped");
    }

    async fn handle(&mut self, cmd: SyncCommand) -> ControlFlow<()> {
        match cmd {
            SyncCommand::Create(item) => self.create(item).await,
            SyncCommand::Delete { id, asset_url } => self.delete(id, asset_url).await,
            SyncCommand::Wake => {}
            SyncCommand::Close(reply) => {
                let report = self.flush_all().await;
                if reply.send(report).is_err() {
                    debug!(board_id = %self.deps.board_id, "close requester went away");
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn create(&mut self, item: BoardItem) {
        let client_id = item.id;
        match self.deps.backend.create_item(self.deps.board_id, &item).await {
            Ok(id) if id != client_id => {
                let rekeyed = self.deps.engine.lock().await.rekey(&client_id, id);
                if !rekeyed {
                    // Already deleted locally; its delete is queued under the client id.
                    self.aliases.insert(client_id, id);
                }
                debug!(%client_id, %id, rekeyed, "item re-keyed by remote");
            }
            Ok(_) => debug!(item_id = %client_id, kind = item.kind.as_str(), "item created"),
            Err(e) => {
                error!(board_id = %self.deps.board_id, item_id = %client_id, error = %e, "create failed");
                self.deps.notifier.notify(NotifyKind::Error, "Could not save the new item");
            }
        }
    }

    async fn delete(&mut self, id: ItemId, asset_url: Option<String>) {
        let id = self.aliases.remove(&id).unwrap_or(id);
        match self.deps.backend.delete_item(self.deps.board_id, id).await {
            Ok(()) => {
                debug!(item_id = %id, "item deleted");
                match asset_url {
                    Some(url) if self.deps.assets.owns_asset(&url) => {
                        release_best_effort(self.deps.assets.as_ref(), &url).await;
                    }
                    Some(url) => debug!(item_id = %id, %url, "external url; nothing to release"),
                    None => {}
                }
            }
            Err(e) => {
                error!(board_id = %self.deps.board_id, item_id = %id, error = %e, "delete failed");
                self.deps.notifier.notify(NotifyKind::Error, "Could not delete the item");
            }
        }
    }

    async fn flush_due(&mut self) -> FlushReport {
        let writes = {
            let mut engine = self.deps.engine.lock().await;
            engine.take_due_writes(self.deps.clock.now_ms())
        };
        self.write(writes).await
    }

    /// Teardown flush: one batch for every geometry-dirty item plus every
    /// pending content write, deadlines ignored.
    async fn flush_all(&mut self) -> FlushReport {
        let writes = self.deps.engine.lock().await.take_all_writes();
        let pending = writes.geometry.as_ref().map_or(0, |b| b.updates.len()) + writes.content.len();
        let report = self.write(writes).await;
        info!(board_id = %self.deps.board_id, pending, ?report, "teardown flush finished");
        report
    }

    async fn write(&self, writes: PendingWrites) -> FlushReport {
        let mut report = FlushReport::default();
        if let Some(batch) = writes.geometry {
            let entries: Vec<BatchEntry> =
                batch.updates.into_iter().map(|(id, partial)| BatchEntry { id, partial }).collect();
            match self.deps.backend.update_items_batch(self.deps.board_id, &entries).await {
                Ok(()) => {
                    self.deps.engine.lock().await.ack_geometry(&batch.ticket);
                    report.geometry_items = entries.len();
                    debug!(board_id = %self.deps.board_id, count = entries.len(), "geometry batch written");
                }
                Err(e) => {
                    report.failures += 1;
                    error!(board_id = %self.deps.board_id, count = entries.len(), error = %e, "geometry batch write failed");
                    self.deps.notifier.notify(NotifyKind::Error, "Could not save item positions");
                }
            }
        }
        for write in writes.content {
            let mut one = FlushReport::default();
            match self.deps.backend.update_item(self.deps.board_id, write.id, &write.fields).await {
                Ok(()) => {
                    self.deps.engine.lock().await.ack_content(&write.id, write.revision);
                    one.content_items = 1;
                }
                Err(e) => {
                    one.failures = 1;
                    error!(board_id = %self.deps.board_id, item_id = %write.id, error = %e, "content write failed");
                    self.deps.notifier.notify(NotifyKind::Error, "Could not save changes");
                }
            }
            report.absorb(one);
        }
        report
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Release an asset, logging instead of surfacing failure.
pub(crate) async fn release_best_effort(assets: &dyn AssetStore, url: &str) {
    match assets.release_asset(url).await {
        Ok(()) => debug!(%url, "asset released"),
        Err(e) => warn!(%url, error = %e, "asset release failed"),
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
