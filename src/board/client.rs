//! Board API client
//!
//! The [`Board`] trait is the narrow mutation/query surface the rest of the
//! system depends on; [`HttpBoard`] implements it against a Trello-style REST
//! API. Wire structs live here and never leak past this module.

use super::{BoardItem, Item};
use crate::config::BoardConfig;
use crate::{BoardSyncError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout for the full-board load (can return large result sets)
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for single item fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for create/archive/delete operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Narrow board capability surface consumed by the sync engine and webhook flow
#[async_trait]
pub trait Board: Send + Sync {
    /// Fetch every item on the board, with all labels each item carries
    async fn load_all(&self) -> Result<Vec<BoardItem>>;

    /// Create a new item under its label, placed into the given list
    async fn create(&self, item: &Item, list: &str) -> Result<()>;

    /// Soft-remove an item from the active view
    async fn archive(&self, item: &BoardItem) -> Result<()>;

    /// Permanently delete an item
    async fn delete(&self, item: &BoardItem) -> Result<()>;

    /// Fetch a single item by its board-assigned ID
    async fn get(&self, id: &str) -> Result<BoardItem>;
}

/// Wire representation of a board item
#[derive(Debug, Clone, Deserialize)]
struct ItemWire {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    due: Option<DateTime<Utc>>,
    #[serde(default, rename = "idLabels")]
    labels: Vec<String>,
}

impl From<ItemWire> for BoardItem {
    fn from(wire: ItemWire) -> Self {
        BoardItem {
            id: wire.id,
            name: wire.name,
            description: wire.desc,
            due_date: wire.due,
            labels: wire.labels,
        }
    }
}

/// Wire representation of an item creation request
#[derive(Debug, Serialize)]
struct CreateItemWire<'a> {
    name: &'a str,
    desc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<DateTime<Utc>>,
    #[serde(rename = "idList")]
    list: &'a str,
    #[serde(rename = "idLabels")]
    labels: Vec<&'a str>,
}

/// HTTP client for a Trello-style board REST API
pub struct HttpBoard {
    client: Client,
    base_url: String,
    api_key: String,
    api_token: String,
    board_id: String,
}

impl HttpBoard {
    /// Create a client from board configuration
    pub fn new(config: &BoardConfig) -> Result<Self> {
        Self::with_base_url(config, "https://api.trello.com/1")
    }

    /// Create a client against a custom API base URL (used by tests)
    pub fn with_base_url(config: &BoardConfig, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(BoardSyncError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: config.api_key.clone(),
            api_token: config.api_token.clone(),
            board_id: config.board_id.clone(),
        })
    }

    fn auth_query(&self) -> [(&'static str, &str); 2] {
        [("key", self.api_key.as_str()), ("token", self.api_token.as_str())]
    }
}

#[async_trait]
impl Board for HttpBoard {
    async fn load_all(&self) -> Result<Vec<BoardItem>> {
        let url = format!("{}/boards/{}/cards", self.base_url, self.board_id);

        let response = self
            .client
            .get(&url)
            .query(&self.auth_query())
            .timeout(LOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| BoardSyncError::Snapshot(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(BoardSyncError::Snapshot(format!(
                "board returned status {}",
                response.status()
            )));
        }

        let items: Vec<ItemWire> = response
            .json()
            .await
            .map_err(|e| BoardSyncError::Snapshot(e.to_string()))?;

        Ok(items.into_iter().map(BoardItem::from).collect())
    }

    async fn create(&self, item: &Item, list: &str) -> Result<()> {
        let url = format!("{}/cards", self.base_url);
        let body = CreateItemWire {
            name: &item.name,
            desc: &item.description,
            due: item.due_date,
            list,
            labels: vec![item.label.as_str()],
        };

        let response = self
            .client
            .post(&url)
            .query(&self.auth_query())
            .json(&body)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BoardSyncError::Mutation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BoardSyncError::Mutation(format!(
                "create '{}' returned status {}",
                item.name,
                response.status()
            )));
        }

        Ok(())
    }

    async fn archive(&self, item: &BoardItem) -> Result<()> {
        let url = format!("{}/cards/{}/closed", self.base_url, item.id);

        let response = self
            .client
            .put(&url)
            .query(&self.auth_query())
            .query(&[("value", "true")])
            .timeout(WRITE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BoardSyncError::Mutation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BoardSyncError::Mutation(format!(
                "archive '{}' returned status {}",
                item.name,
                response.status()
            )));
        }

        Ok(())
    }

    async fn delete(&self, item: &BoardItem) -> Result<()> {
        let url = format!("{}/cards/{}", self.base_url, item.id);

        let response = self
            .client
            .delete(&url)
            .query(&self.auth_query())
            .timeout(WRITE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BoardSyncError::Mutation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BoardSyncError::Mutation(format!(
                "delete '{}' returned status {}",
                item.name,
                response.status()
            )));
        }

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<BoardItem> {
        let url = format!("{}/cards/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .query(&self.auth_query())
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BoardSyncError::Other(format!(
                "get item '{}' returned status {}",
                id,
                response.status()
            )));
        }

        let item: ItemWire = response.json().await?;
        Ok(item.into())
    }
}
