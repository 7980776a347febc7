//! Board session: one open board view.
//!
//! DESIGN
//! ======
//! `BoardSession::open` hydrates the engine from the backend and spawns the
//! board's sync worker. Every interaction runs synchronously against the
//! engine under a short lock; the actions it returns are routed to the worker
//! (creates, deletes, deadline changes) and handed back to the caller for
//! rendering. `close` performs the teardown flush and stops the worker.
//!
//! Uploads run in their own task so the board stays interactive while the
//! asset is in flight. The placeholder item exists only locally until the
//! upload succeeds. The session owns every upload task; `close` waits for
//! them before the final flush so none is cut off mid-way.
//!
//! Only assets the store issued are ever released.

use std::sync::Arc;

use canvas::camera::{Camera, Viewport};
use canvas::dirty::Millis;
use canvas::doc::{BoardId, BoardItem, ItemId, ItemKind};
use canvas::engine::{Action, EngineCore};
use canvas::variant::{self, ItemEdit, ItemView};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::sync::{Clock, FlushReport, SharedEngine, SyncCommand, SyncDeps, SyncHandle, release_best_effort, spawn_sync_worker};
use crate::config::SyncConfig;
use crate::notify::{Notifier, NotifyKind};
use crate::remote::{AssetStore, AssetUpload, BoardBackend, RemoteError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("item {0} not found or has no replaceable asset")]
    UnknownItem(ItemId),

    /// The sync worker has stopped.
    #[error("board session is closed")]
    Closed,
}

/// External collaborators for a session.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn BoardBackend>,
    pub assets: Arc<dyn AssetStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct BoardSession {
    board_id: BoardId,
    engine: SharedEngine,
    clock: Clock,
    sync: SyncHandle,
    worker: JoinHandle<()>,
    uploads: Mutex<JoinSet<()>>,
    assets: Arc<dyn AssetStore>,
    notifier: Arc<dyn Notifier>,
}

impl BoardSession {
    /// Load `board_id` and start its sync worker.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Remote`] if the initial load fails.
    pub async fn open(
        board_id: BoardId,
        collaborators: Collaborators,
        config: SyncConfig,
        viewport: Viewport,
    ) -> Result<Self, SessionError> {
        let items = collaborators.backend.load_items(board_id).await?;
        info!(%board_id, count = items.len(), "board loaded");

        let mut engine = EngineCore::new(board_id, config.windows);
        engine.set_viewport(viewport.width, viewport.height);
        engine.load(items);
        let engine = Arc::new(Mutex::new(engine));
        let clock = Clock::start();

        let deps = SyncDeps {
            board_id,
            engine: engine.clone(),
            clock,
            backend: collaborators.backend,
            assets: collaborators.assets.clone(),
            notifier: collaborators.notifier.clone(),
        };
        let (sync, worker) = spawn_sync_worker(deps, config.queue_capacity);

        Ok(Self {
            board_id,
            engine,
            clock,
            sync,
            worker,
            uploads: Mutex::new(JoinSet::new()),
            assets: collaborators.assets,
            notifier: collaborators.notifier,
        })
    }

    #[must_use]
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Milliseconds since the board opened, on the engine's clock.
    #[must_use]
    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Run one interaction against the engine.
    ///
    /// Creates and deletes in the returned actions are queued for immediate
    /// write, waiting for queue room if needed; debounced writes are
    /// rescheduled if the engine's next deadline moved. The actions are
    /// returned for the caller to render.
    pub async fn interact<F>(&self, f: F) -> Vec<Action>
    where
        F: FnOnce(&mut EngineCore, Millis) -> Vec<Action>,
    {
        let (actions, deadline_moved) = {
            let mut engine = self.engine.lock().await;
            let before = engine.next_deadline();
            let actions = f(&mut engine, self.clock.now_ms());
            (actions, engine.next_deadline() != before)
        };
        for action in &actions {
            let command = match action {
                Action::ItemCreated(item) => SyncCommand::Create(item.clone()),
                Action::ItemDeleted { id, asset_url } => SyncCommand::Delete { id: *id, asset_url: asset_url.clone() },
                _ => continue,
            };
            if self.sync.submit(command).await.is_err() {
                self.notifier.notify(NotifyKind::Error, "Board is closed; change not saved");
            }
        }
        if deadline_moved {
            self.sync.wake();
        }
        actions
    }

    /// Add an item at the next cascade position and create it remotely.
    pub async fn add_item(&self, kind: ItemKind, content: impl Into<String>) -> ItemId {
        let content = content.into();
        let mut created = None;
        self.interact(|engine, _| {
            let (id, actions) = engine.add_item(kind, content);
            created = Some(id);
            actions
        })
        .await;
        // add_item always yields an id.
        created.unwrap_or_default()
    }

    pub async fn edit_item(&self, id: ItemId, edit: ItemEdit) -> Vec<Action> {
        self.interact(|engine, now| engine.edit_item(&id, &edit, now)).await
    }

    pub async fn delete_item(&self, id: ItemId) -> Vec<Action> {
        self.interact(|engine, _| engine.delete_item(&id)).await
    }

    /// Insert a placeholder and upload `upload` in the background.
    ///
    /// On success the final URL replaces the placeholder and the item is
    /// created remotely. On failure the placeholder is removed and the user
    /// notified. See [`Self::settle_uploads`] to wait for it.
    pub async fn upload(&self, kind: ItemKind, upload: AssetUpload) -> ItemId {
        let id = {
            let mut engine = self.engine.lock().await;
            engine.begin_upload(kind).0
        };
        debug!(item_id = %id, kind = kind.as_str(), file_name = %upload.file_name, "upload started");
        let task = UploadTask {
            id,
            engine: self.engine.clone(),
            sync: self.sync.clone(),
            assets: self.assets.clone(),
            notifier: self.notifier.clone(),
        };
        let mut uploads = self.uploads.lock().await;
        while let Some(done) = uploads.try_join_next() {
            log_upload_join(done);
        }
        uploads.spawn(task.run(upload));
        id
    }

    /// Wait for every upload started so far to succeed or fail.
    pub async fn settle_uploads(&self) {
        let mut uploads = std::mem::take(&mut *self.uploads.lock().await);
        while let Some(done) = uploads.join_next().await {
            log_upload_join(done);
        }
    }

    /// Replace an asset-backed item's file: upload, swap the URL in, then
    /// release the old asset.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownItem`] if the item is missing, not
    /// upload-backed, or still uploading, and [`SessionError::Remote`] if the
    /// upload fails.
    pub async fn replace_asset(&self, id: ItemId, upload: AssetUpload) -> Result<(), SessionError> {
        let old_url = {
            let engine = self.engine.lock().await;
            engine
                .item(&id)
                .filter(|item| item.kind.is_upload_backed() && !engine.is_uploading(&id))
                .map(|item| item.content.trim().to_owned())
                .ok_or(SessionError::UnknownItem(id))?
        };

        let file_name = upload.file_name.clone();
        let new_url = match self.assets.upload_asset(upload).await {
            Ok(url) => url,
            Err(e) => {
                error!(item_id = %id, %file_name, error = %e, "replacement upload failed");
                self.notifier.notify(NotifyKind::Error, &format!("Upload failed: {file_name}"));
                return Err(e.into());
            }
        };

        let actions = self.edit_item(id, ItemEdit::SetUrl(new_url.clone())).await;
        if actions.is_empty() {
            // Item went away while uploading.
            release_best_effort(self.assets.as_ref(), &new_url).await;
            return Ok(());
        }
        if !old_url.is_empty() && old_url != new_url && self.assets.owns_asset(&old_url) {
            release_best_effort(self.assets.as_ref(), &old_url).await;
        }
        self.notifier.notify(NotifyKind::Success, &format!("Replaced with {file_name}"));
        Ok(())
    }

    // --- Read side ---

    /// Snapshot of every item in insertion order.
    pub async fn items(&self) -> Vec<BoardItem> {
        self.engine.lock().await.doc.items().cloned().collect()
    }

    /// Decoded view of every item in insertion order.
    pub async fn views(&self) -> Vec<(ItemId, ItemView)> {
        self.engine.lock().await.doc.items().map(|item| (item.id, variant::render(item))).collect()
    }

    pub async fn camera(&self) -> Camera {
        self.engine.lock().await.camera()
    }

    pub async fn selection(&self) -> Option<ItemId> {
        self.engine.lock().await.selection()
    }

    /// Let in-flight uploads settle, flush every pending write and stop the
    /// worker.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the worker stopped early.
    pub async fn close(self) -> Result<FlushReport, SessionError> {
        self.settle_uploads().await;
        let report = self.sync.close().await?;
        if let Err(e) = self.worker.await {
            warn!(board_id = %self.board_id, error = %e, "sync worker did not stop cleanly");
            return Err(SessionError::Closed);
        }
        if report.failures > 0 {
            warn!(board_id = %self.board_id, failures = report.failures, "board closed with unsaved changes");
        }
        info!(board_id = %self.board_id, ?report, "board closed");
        Ok(report)
    }
}

struct UploadTask {
    id: ItemId,
    engine: SharedEngine,
    sync: SyncHandle,
    assets: Arc<dyn AssetStore>,
    notifier: Arc<dyn Notifier>,
}

impl UploadTask {
    async fn run(self, upload: AssetUpload) {
        let file_name = upload.file_name.clone();
        match self.assets.upload_asset(upload).await {
            Ok(url) => {
                let created = self.engine.lock().await.complete_upload(&self.id, &url);
                match created {
                    Some(item) => {
                        if self.sync.submit(SyncCommand::Create(item)).await.is_err() {
                            release_best_effort(self.assets.as_ref(), &url).await;
                            self.notifier.notify(NotifyKind::Error, &format!("Upload not saved: {file_name}"));
                            return;
                        }
                        self.notifier.notify(NotifyKind::Success, &format!("Uploaded {file_name}"));
                    }
                    None => {
                        debug!(item_id = %self.id, %url, "placeholder removed during upload; releasing asset");
                        release_best_effort(self.assets.as_ref(), &url).await;
                    }
                }
            }
            Err(e) => {
                self.engine.lock().await.fail_upload(&self.id);
                error!(item_id = %self.id, %file_name, error = %e, "upload failed");
                self.notifier.notify(NotifyKind::Error, &format!("Upload failed: {file_name}"));
            }
        }
    }
}

fn log_upload_join(done: Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        warn!(error = %e, "upload task aborted");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
