//! Remote collaborators: the board document store and the asset store.
//!
//! DESIGN
//! ======
//! Both are async traits with `Send + Sync` bounds so a board session can
//! hold them as `Arc<dyn _>` and tests can swap in [`memory::MemoryBackend`].
//! [`http::HttpBackend`] speaks a small REST dialect; the transport is
//! otherwise opaque to the rest of the crate.

pub mod http;
pub mod memory;

use canvas::camera::Point;
use canvas::doc::{BoardId, BoardItem, ChecklistEntry, ItemId, ItemKind, PartialBoardItem, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("http request failed: {0}")]
    Http(String),

    /// The collaborator answered with a non-success status.
    #[error("remote returned status {status}")]
    Status { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// The collaborator refused the write as invalid or conflicting.
    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("response decode failed: {0}")]
    Decode(String),
}

/// One entry of a batched geometry write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: ItemId,
    pub partial: PartialBoardItem,
}

/// Create payload: an item without its client-side id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem<'a> {
    pub board_id: BoardId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<&'a [ChecklistEntry]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
    pub position: Point,
    pub size: Size,
}

impl<'a> From<&'a BoardItem> for NewItem<'a> {
    fn from(item: &'a BoardItem) -> Self {
        Self {
            board_id: item.board_id,
            kind: item.kind,
            content: &item.content,
            items: item.items.as_deref(),
            notes: item.notes.as_deref(),
            position: item.position,
            size: item.size,
        }
    }
}

/// A file to store as a board asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Board document store.
#[async_trait::async_trait]
pub trait BoardBackend: Send + Sync {
    /// Every item on `board`, in insertion order.
    async fn load_items(&self, board: BoardId) -> Result<Vec<BoardItem>, RemoteError>;

    /// Persist a new item. The store may assign a different id; the returned
    /// id is authoritative.
    async fn create_item(&self, board: BoardId, item: &BoardItem) -> Result<ItemId, RemoteError>;

    /// Content-channel write for one item.
    async fn update_item(&self, board: BoardId, id: ItemId, partial: &PartialBoardItem) -> Result<(), RemoteError>;

    /// Geometry-channel batched write.
    async fn update_items_batch(&self, board: BoardId, entries: &[BatchEntry]) -> Result<(), RemoteError>;

    async fn delete_item(&self, board: BoardId, id: ItemId) -> Result<(), RemoteError>;
}

/// Binary asset storage.
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Store a file and return its public URL.
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, RemoteError>;

    /// Release an asset previously returned by `upload_asset`.
    async fn release_asset(&self, url: &str) -> Result<(), RemoteError>;

    /// Whether `url` names an asset this store issued. Anything else (an
    /// external video link, say) is never released.
    fn owns_asset(&self, url: &str) -> bool;
}
