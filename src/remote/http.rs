//! REST client for the board and asset stores.
//!
//! Thin `reqwest` wrapper. Status mapping and body parsing are pure
//! functions so they can be tested without a server.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use canvas::doc::{BoardId, BoardItem, ItemId, PartialBoardItem};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

use super::{AssetStore, AssetUpload, BatchEntry, BoardBackend, NewItem, RemoteError};
use crate::config::ApiConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const FILE_NAME_HEADER: &str = "x-file-name";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    asset_url_prefix: Option<String>,
    /// Asset URLs uploaded through this client.
    issued: Mutex<HashSet<String>>,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`RemoteError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
            asset_url_prefix: config.asset_url_prefix.clone(),
            issued: Mutex::new(HashSet::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn items_url(&self, board: BoardId) -> String {
        self.url(&format!("/boards/{board}/items"))
    }

    fn item_url(&self, board: BoardId, id: ItemId) -> String {
        self.url(&format!("/boards/{board}/items/{id}"))
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String, RemoteError> {
        let request = match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        };
        let response = request.send().await.map_err(|e| RemoteError::Http(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| RemoteError::Http(e.to_string()))?;
        check_status(status, body, what)
    }
}

#[async_trait::async_trait]
impl BoardBackend for HttpBackend {
    async fn load_items(&self, board: BoardId) -> Result<Vec<BoardItem>, RemoteError> {
        let body = self.send(self.http.get(self.items_url(board)), &format!("board {board}")).await?;
        parse_items(&body)
    }

    async fn create_item(&self, board: BoardId, item: &BoardItem) -> Result<ItemId, RemoteError> {
        let payload = NewItem::from(item);
        let body = self.send(self.http.post(self.items_url(board)).json(&payload), &format!("board {board}")).await?;
        parse_created_id(&body)
    }

    async fn update_item(&self, board: BoardId, id: ItemId, partial: &PartialBoardItem) -> Result<(), RemoteError> {
        self.send(self.http.patch(self.item_url(board, id)).json(partial), &format!("item {id}")).await?;
        Ok(())
    }

    async fn update_items_batch(&self, board: BoardId, entries: &[BatchEntry]) -> Result<(), RemoteError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.send(self.http.patch(self.items_url(board)).json(entries), &format!("board {board}")).await?;
        Ok(())
    }

    async fn delete_item(&self, board: BoardId, id: ItemId) -> Result<(), RemoteError> {
        self.send(self.http.delete(self.item_url(board, id)), &format!("item {id}")).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetStore for HttpBackend {
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, RemoteError> {
        let request = self
            .http
            .post(self.url("/assets"))
            .header(CONTENT_TYPE, upload.content_type)
            .header(FILE_NAME_HEADER, upload.file_name.clone())
            .body(upload.bytes);
        let body = self.send(request, &upload.file_name).await?;
        let url = parse_uploaded_url(&body)?;
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).insert(url.clone());
        Ok(url)
    }

    async fn release_asset(&self, url: &str) -> Result<(), RemoteError> {
        let request = self.http.delete(self.url("/assets")).query(&[("url", url)]);
        self.send(request, url).await?;
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).remove(url);
        Ok(())
    }

    fn owns_asset(&self, url: &str) -> bool {
        self.asset_url_prefix.as_deref().is_some_and(|prefix| url.starts_with(prefix))
            || self.issued.lock().unwrap_or_else(PoisonError::into_inner).contains(url)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct CreatedResponse {
    id: ItemId,
}

#[derive(Deserialize)]
struct UploadedResponse {
    url: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn check_status(status: StatusCode, body: String, what: &str) -> Result<String, RemoteError> {
    match status {
        s if s.is_success() => Ok(body),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(what.to_owned())),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(RemoteError::Rejected(body)),
        s => Err(RemoteError::Status { status: s.as_u16(), body }),
    }
}

fn parse_items(json: &str) -> Result<Vec<BoardItem>, RemoteError> {
    serde_json::from_str(json).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn parse_created_id(json: &str) -> Result<ItemId, RemoteError> {
    let created: CreatedResponse = serde_json::from_str(json).map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(created.id)
}

fn parse_uploaded_url(json: &str) -> Result<String, RemoteError> {
    let uploaded: UploadedResponse = serde_json::from_str(json).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let url = uploaded.url.trim();
    if url.is_empty() {
        return Err(RemoteError::Decode("empty asset url".into()));
    }
    Ok(url.to_owned())
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
