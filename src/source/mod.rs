//! Source adapters
//!
//! A source is an external origin of items to mirror onto the board. The
//! [`Source`] trait is a single capability: fetch the source's current items.
//! Scheduling and label metadata live in [`crate::config::SourceConfig`], not on
//! the trait, so adapters stay dumb pipes.

use crate::board::Item;
use crate::{BoardSyncError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout for source fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// An external origin of board items
#[async_trait]
pub trait Source: Send + Sync {
    /// Return the source's current upstream items
    async fn fetch(&self) -> Result<Vec<Item>>;
}

/// Wire representation of an item as returned by a source endpoint
#[derive(Debug, Deserialize)]
struct SourceItemWire {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
}

/// HTTP source adapter: GET an endpoint that returns a JSON array of items
pub struct HttpSource {
    client: Client,
    name: String,
    label: String,
    endpoint: String,
}

impl HttpSource {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().build().map_err(BoardSyncError::Http)?;
        Ok(Self {
            client,
            name: name.into(),
            label: label.into(),
            endpoint: endpoint.into(),
        })
    }

    fn fetch_error(&self, message: impl Into<String>) -> BoardSyncError {
        BoardSyncError::Fetch {
            source_name: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.fetch_error(format!("status {}: {}", status, body)));
        }

        let payloads: Vec<SourceItemWire> = response
            .json()
            .await
            .map_err(|e| self.fetch_error(format!("could not decode items: {}", e)))?;

        let mut items = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let item = Item::new(
                payload.name,
                self.label.clone(),
                payload.description,
                payload.due_date,
            )
            .map_err(|e| self.fetch_error(e.to_string()))?;
            items.push(item);
        }

        Ok(items)
    }
}
