//! Reconciliation: name-keyed symmetric difference within one label's namespace
//!
//! Pure and CPU-only. Re-running with the same fetched set and the same
//! (unmutated) index yields the same result every time.

use crate::board::{BoardItem, BoardStateIndex, Item};
use std::collections::HashSet;

/// Items to act on for one label
#[derive(Debug, Default, Clone)]
pub struct ReconciliationResult {
    /// Fetched items with no existing board item of the same name
    pub to_create: Vec<Item>,

    /// Existing board items no longer present in the fetched set
    pub to_remove: Vec<BoardItem>,
}

/// Compare fetched items against the existing snapshot for `label`.
///
/// A fetched item whose name already exists under the label is fully
/// reconciled; one that doesn't goes into `to_create`. Existing items whose
/// names were not fetched go into `to_remove` (acted on only in strict mode).
pub fn reconcile(
    fetched: Vec<Item>,
    index: &BoardStateIndex,
    label: &str,
) -> ReconciliationResult {
    let existing = index.items(label);
    let existing_names: HashSet<&str> = existing.iter().map(|i| i.name.as_str()).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queued: HashSet<String> = HashSet::new();
    let mut to_create = Vec::new();

    for item in fetched {
        if let Some(name) = existing_names.get(item.name.as_str()) {
            seen.insert(*name);
            continue;
        }
        // a fetched duplicate of an item already queued for creation is skipped
        if queued.contains(item.name.as_str()) {
            continue;
        }
        queued.insert(item.name.clone());
        to_create.push(item);
    }

    let to_remove = existing
        .iter()
        .filter(|i| !seen.contains(i.name.as_str()))
        .cloned()
        .collect();

    ReconciliationResult {
        to_create,
        to_remove,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: &str = "lbl";

    fn fetched(names: &[&str]) -> Vec<Item> {
        names
            .iter()
            .map(|n| Item::new(*n, LABEL, "", None).unwrap())
            .collect()
    }

    fn index(names: &[&str]) -> BoardStateIndex {
        let items = names
            .iter()
            .enumerate()
            .map(|(i, n)| BoardItem {
                id: format!("id-{}", i),
                name: n.to_string(),
                description: String::new(),
                due_date: None,
                labels: vec![LABEL.to_string()],
            })
            .collect();
        BoardStateIndex::from_items(items, &[LABEL.to_string()])
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_round_trip() {
        // existing {a, b}, fetched {a, c} -> create {c}, remove {b}
        let result = reconcile(fetched(&["a", "c"]), &index(&["a", "b"]), LABEL);

        assert_eq!(names(&result.to_create), vec!["c"]);
        assert_eq!(result.to_remove.len(), 1);
        assert_eq!(result.to_remove[0].name, "b");
    }

    #[test]
    fn test_set_difference_sizes() {
        // F = {a, b, c, d}, E = {c, d, e}; common = {c, d}
        let f = ["a", "b", "c", "d"];
        let e = ["c", "d", "e"];
        let result = reconcile(fetched(&f), &index(&e), LABEL);

        let common = 2;
        assert_eq!(result.to_create.len() + common, f.len());
        assert_eq!(result.to_remove.len() + common, e.len());
    }

    #[test]
    fn test_fully_reconciled() {
        let result = reconcile(fetched(&["a", "b"]), &index(&["a", "b"]), LABEL);
        assert!(result.to_create.is_empty());
        assert!(result.to_remove.is_empty());
    }

    #[test]
    fn test_empty_fetch_marks_all_existing_stale() {
        let result = reconcile(Vec::new(), &index(&["a", "b"]), LABEL);
        assert!(result.to_create.is_empty());
        assert_eq!(result.to_remove.len(), 2);
    }

    #[test]
    fn test_empty_existing_creates_everything() {
        let result = reconcile(fetched(&["a", "b"]), &index(&[]), LABEL);
        assert_eq!(result.to_create.len(), 2);
        assert!(result.to_remove.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let idx = index(&["a", "b"]);
        let first = reconcile(fetched(&["a", "c"]), &idx, LABEL);
        let second = reconcile(fetched(&["a", "c"]), &idx, LABEL);

        assert_eq!(names(&first.to_create), names(&second.to_create));
        assert_eq!(first.to_remove, second.to_remove);
    }

    #[test]
    fn test_fetched_duplicates_created_once() {
        let result = reconcile(fetched(&["a", "a"]), &index(&[]), LABEL);
        assert_eq!(result.to_create.len(), 1);
    }
}
