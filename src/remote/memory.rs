//! In-process board and asset store.
//!
//! Records every call in order and applies writes to per-board
//! [`DocStore`]s, so tests and the `demo` command can inspect both the
//! traffic and the resulting persisted state. Failures can be injected per
//! operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use canvas::doc::{BoardId, BoardItem, DocStore, ItemId, PartialBoardItem};
use uuid::Uuid;

use super::{AssetStore, AssetUpload, BatchEntry, BoardBackend, RemoteError};

/// Scheme and path of every URL this store issues.
pub const MEMORY_ASSET_PREFIX: &str = "memory://assets/";

/// Operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Load,
    Create,
    Update,
    Batch,
    Delete,
    Upload,
    Release,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load { board: BoardId },
    Create { board: BoardId, item: BoardItem },
    Update { board: BoardId, id: ItemId, partial: PartialBoardItem },
    Batch { board: BoardId, entries: Vec<BatchEntry> },
    Delete { board: BoardId, id: ItemId },
    Upload { file_name: String },
    Release { url: String },
}

impl Call {
    #[must_use]
    pub fn op(&self) -> Op {
        match self {
            Self::Load { .. } => Op::Load,
            Self::Create { .. } => Op::Create,
            Self::Update { .. } => Op::Update,
            Self::Batch { .. } => Op::Batch,
            Self::Delete { .. } => Op::Delete,
            Self::Upload { .. } => Op::Upload,
            Self::Release { .. } => Op::Release,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    boards: HashMap<BoardId, DocStore>,
    assets: HashSet<String>,
    calls: Vec<Call>,
    failures: HashMap<Op, usize>,
    next_asset: u64,
}

impl MemoryState {
    /// Record `call`, then consume one injected failure for its op if any.
    fn record(&mut self, call: Call) -> Result<(), RemoteError> {
        let op = call.op();
        self.calls.push(call);
        match self.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RemoteError::Status { status: 503, body: format!("injected {op:?} failure") })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    assign_ids: bool,
    upload_delay: Duration,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh id on every create instead of keeping the client's.
    #[must_use]
    pub fn with_server_ids(mut self) -> Self {
        self.assign_ids = true;
        self
    }

    /// Delay every upload by `delay` (virtual time under a paused runtime).
    #[must_use]
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    /// Seed a board with items, bypassing the call log.
    pub fn seed(&self, board: BoardId, items: Vec<BoardItem>) {
        let mut store = DocStore::new();
        store.load(items);
        self.lock().boards.insert(board, store);
    }

    /// Make the next `count` calls of `op` fail.
    pub fn fail_next(&self, op: Op, count: usize) {
        self.lock().failures.insert(op, count);
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls of one kind, in order.
    #[must_use]
    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.lock().calls.iter().filter(|c| c.op() == op).cloned().collect()
    }

    /// Persisted items of `board`, in insertion order.
    #[must_use]
    pub fn items(&self, board: BoardId) -> Vec<BoardItem> {
        self.lock().boards.get(&board).map(|s| s.items().cloned().collect()).unwrap_or_default()
    }

    /// URLs of assets uploaded and not yet released.
    #[must_use]
    pub fn live_assets(&self) -> Vec<String> {
        let mut assets: Vec<String> = self.lock().assets.iter().cloned().collect();
        assets.sort();
        assets
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl BoardBackend for MemoryBackend {
    async fn load_items(&self, board: BoardId) -> Result<Vec<BoardItem>, RemoteError> {
        let mut state = self.lock();
        state.record(Call::Load { board })?;
        Ok(state.boards.get(&board).map(|s| s.items().cloned().collect()).unwrap_or_default())
    }

    async fn create_item(&self, board: BoardId, item: &BoardItem) -> Result<ItemId, RemoteError> {
        let mut state = self.lock();
        state.record(Call::Create { board, item: item.clone() })?;
        let mut stored = item.clone();
        if self.assign_ids {
            stored.id = Uuid::new_v4();
        }
        let id = stored.id;
        state.boards.entry(board).or_default().insert(stored);
        Ok(id)
    }

    async fn update_item(&self, board: BoardId, id: ItemId, partial: &PartialBoardItem) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record(Call::Update { board, id, partial: partial.clone() })?;
        let applied = state.boards.get_mut(&board).is_some_and(|s| s.apply(&id, partial));
        if applied { Ok(()) } else { Err(RemoteError::NotFound(format!("item {id}"))) }
    }

    async fn update_items_batch(&self, board: BoardId, entries: &[BatchEntry]) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record(Call::Batch { board, entries: entries.to_vec() })?;
        if let Some(store) = state.boards.get_mut(&board) {
            for entry in entries {
                store.apply(&entry.id, &entry.partial);
            }
        }
        Ok(())
    }

    async fn delete_item(&self, board: BoardId, id: ItemId) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record(Call::Delete { board, id })?;
        match state.boards.get_mut(&board).and_then(|s| s.remove(&id)) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(format!("item {id}"))),
        }
    }
}

#[async_trait::async_trait]
impl AssetStore for MemoryBackend {
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, RemoteError> {
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }
        let mut state = self.lock();
        state.record(Call::Upload { file_name: upload.file_name.clone() })?;
        state.next_asset += 1;
        let url = format!("{MEMORY_ASSET_PREFIX}{}/{}", state.next_asset, upload.file_name);
        state.assets.insert(url.clone());
        Ok(url)
    }

    async fn release_asset(&self, url: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record(Call::Release { url: url.to_owned() })?;
        if state.assets.remove(url) { Ok(()) } else { Err(RemoteError::NotFound(url.to_owned())) }
    }

    fn owns_asset(&self, url: &str) -> bool {
        url.starts_with(MEMORY_ASSET_PREFIX)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
