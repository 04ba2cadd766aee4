//! Board data model
//!
//! [`Item`] is the core value type used for reconciliation; [`BoardItem`] is the
//! board API's wire representation. The two are kept separate and converted only
//! at the client boundary. [`BoardStateIndex`] is the per-run snapshot of what
//! already exists on the board, grouped by label.

pub mod client;

pub use client::{Board, HttpBoard};

use crate::{BoardSyncError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An item to be mirrored onto the board
///
/// Value object: within a label's namespace, two items with the same name are
/// considered the same item regardless of other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Item {
    /// Create a new item; name and label are mandatory
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let name = name.into();
        let label = label.into();

        if name.is_empty() {
            return Err(BoardSyncError::Config("item name cannot be blank".into()));
        }
        if label.is_empty() {
            return Err(BoardSyncError::Config("label ID cannot be blank".into()));
        }

        Ok(Self {
            name,
            label,
            description: description.into(),
            due_date,
        })
    }
}

/// An existing item as reported by the board API
///
/// Carries the board-assigned ID needed for archive/delete calls, and every
/// label the item has (an item may belong to several labels at once).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Snapshot of existing board items grouped by label
///
/// Built once at the start of a polling run and read-only afterwards, so it can
/// be shared across concurrent workers without locking. It is deliberately NOT
/// updated as items are created or removed during the run; "existing" means
/// "existing as of load time".
#[derive(Debug, Default)]
pub struct BoardStateIndex {
    by_label: HashMap<String, Vec<BoardItem>>,
}

impl BoardStateIndex {
    /// Load the snapshot from the board for the given labels of interest.
    ///
    /// A load failure is fatal to the polling run: without a snapshot,
    /// reconciliation could create duplicates.
    pub async fn load(board: &dyn Board, labels: &[String]) -> Result<Self> {
        let items = board.load_all().await?;
        Ok(Self::from_items(items, labels))
    }

    /// Group items under every requested label they carry, ignoring items whose
    /// labels do not intersect the requested set.
    pub fn from_items(items: Vec<BoardItem>, labels: &[String]) -> Self {
        let mut by_label: HashMap<String, Vec<BoardItem>> = HashMap::new();
        for label in labels {
            by_label.entry(label.clone()).or_default();
        }

        for item in items {
            for label in &item.labels {
                if let Some(bucket) = by_label.get_mut(label) {
                    bucket.push(item.clone());
                }
            }
        }

        Self { by_label }
    }

    /// Existing items under the given label (empty if the label was not requested)
    pub fn items(&self, label: &str) -> &[BoardItem] {
        self.by_label.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Labels the index was built for
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_item(id: &str, name: &str, labels: &[&str]) -> BoardItem {
        BoardItem {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            due_date: None,
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_item_requires_name_and_label() {
        assert!(Item::new("", "lbl", "", None).is_err());
        assert!(Item::new("task", "", "", None).is_err());

        let item = Item::new("task", "lbl", "", None).unwrap();
        assert_eq!(item.name, "task");
        assert!(item.description.is_empty());
    }

    #[test]
    fn test_index_groups_by_requested_labels() {
        let items = vec![
            board_item("1", "alpha", &["lbl-a"]),
            board_item("2", "beta", &["lbl-a", "lbl-b"]),
            board_item("3", "gamma", &["lbl-c"]),
        ];

        let index =
            BoardStateIndex::from_items(items, &["lbl-a".to_string(), "lbl-b".to_string()]);

        assert_eq!(index.items("lbl-a").len(), 2);
        assert_eq!(index.items("lbl-b").len(), 1);
        assert_eq!(index.items("lbl-b")[0].name, "beta");
        // lbl-c was not requested
        assert!(index.items("lbl-c").is_empty());
    }

    #[test]
    fn test_index_requested_label_with_no_items_is_empty() {
        let index = BoardStateIndex::from_items(Vec::new(), &["lbl-a".to_string()]);
        assert!(index.items("lbl-a").is_empty());
    }
}
