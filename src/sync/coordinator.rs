//! Fan-out coordinator
//!
//! Runs one polling cycle: filters the configured sources down to those due,
//! loads the board snapshot once, then launches one worker per due source.
//! Workers never share mutable state; the board's mutation surface is either
//! serialized through a single consumer (default) or exercised directly by each
//! worker when the client is safe for concurrent writes.
//!
//! A single deadline bounds the whole cycle. When it elapses no new create or
//! remove calls are dispatched; operations already in flight are left to finish.

use super::reconcile::reconcile;
use crate::board::{Board, BoardItem, BoardStateIndex, Item};
use crate::config::{Config, RemovalAction, SourceConfig, Topology};
use crate::source::{HttpSource, Source};
use crate::Result;
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A configured source paired with its fetch adapter
pub struct SourceEntry {
    pub config: SourceConfig,
    pub fetcher: Arc<dyn Source>,
}

/// Summary of one polling cycle
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    /// Number of sources that were due and polled
    pub sources_polled: usize,

    /// Items created on the board
    pub created: usize,

    /// Items archived or deleted from the board
    pub removed: usize,

    /// Errors encountered; per-item and per-source failures are collected here
    /// rather than aborting the cycle
    pub errors: Vec<String>,
}

impl CycleReport {
    /// Check if the cycle encountered any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total number of board changes
    pub fn change_count(&self) -> usize {
        self.created + self.removed
    }
}

/// Actions emitted by workers in the serialized topology
enum Action {
    Create { item: Item, list: String },
    Remove { item: BoardItem },
    Fail(String),
}

/// Per-worker tally in the direct topology
#[derive(Debug, Default)]
struct WorkerReport {
    created: usize,
    removed: usize,
    errors: Vec<String>,
}

/// Build HTTP fetch adapters for every configured source
pub fn http_sources(config: &Config) -> Result<Vec<SourceEntry>> {
    config
        .sources
        .iter()
        .map(|sc| {
            let fetcher: Arc<dyn Source> =
                Arc::new(HttpSource::new(&sc.name, &sc.label, &sc.endpoint)?);
            Ok(SourceEntry {
                config: sc.clone(),
                fetcher,
            })
        })
        .collect()
}

/// Execute one polling cycle against the board.
///
/// Fails only when the board snapshot cannot be loaded; every other failure is
/// isolated to its source or item and collected in the returned report.
pub async fn run_cycle(
    config: &Config,
    board: Arc<dyn Board>,
    sources: Vec<SourceEntry>,
    now: DateTime<FixedOffset>,
) -> Result<CycleReport> {
    let mut report = CycleReport::default();

    let (due, labels) = filter_due(sources, now, &mut report);
    report.sources_polled = due.len();
    if due.is_empty() {
        tracing::debug!("no sources due, skipping cycle");
        return Ok(report);
    }

    // Fatal on failure: reconciling without a snapshot could create duplicates.
    let index = Arc::new(BoardStateIndex::load(board.as_ref(), &labels).await?);

    let deadline = Instant::now() + Duration::from_secs(config.timeout_seconds);

    match config.topology {
        Topology::Serialized => {
            run_serialized(
                board,
                config.board.removal_action,
                due,
                index,
                deadline,
                &mut report,
            )
            .await;
        }
        Topology::Direct => {
            run_direct(
                board,
                config.board.removal_action,
                due,
                index,
                deadline,
                &mut report,
            )
            .await;
        }
    }

    tracing::info!(
        sources = report.sources_polled,
        created = report.created,
        removed = report.removed,
        errors = report.errors.len(),
        "polling cycle complete"
    );

    Ok(report)
}

/// Keep only enabled sources that are due at `now`. Period validation failures
/// are reported and skip the source, never the cycle.
fn filter_due(
    sources: Vec<SourceEntry>,
    now: DateTime<FixedOffset>,
    report: &mut CycleReport,
) -> (Vec<SourceEntry>, Vec<String>) {
    let mut due = Vec::new();
    let mut labels = Vec::new();

    for entry in sources {
        if !entry.config.enabled {
            continue;
        }
        match entry.config.period.is_due(now) {
            Ok(true) => {
                labels.push(entry.config.label.clone());
                due.push(entry);
            }
            Ok(false) => {}
            Err(e) => {
                let msg = format!(
                    "could not check if source '{}' should be polled: {}",
                    entry.config.name, e
                );
                tracing::error!("{}", msg);
                report.errors.push(msg);
            }
        }
    }

    (due, labels)
}

/// Topology (b): workers only compute actions and push them onto a shared
/// queue; a single consumer performs all board mutations, which removes
/// write-write races by construction.
async fn run_serialized(
    board: Arc<dyn Board>,
    removal_action: RemovalAction,
    due: Vec<SourceEntry>,
    index: Arc<BoardStateIndex>,
    deadline: Instant,
    report: &mut CycleReport,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    for entry in due {
        let tx = tx.clone();
        let index = Arc::clone(&index);
        // Detached on purpose: a worker still computing when the deadline fires
        // just finds the receiver gone and exits.
        tokio::spawn(async move {
            compute_actions(entry, index, tx).await;
        });
    }
    drop(tx);

    loop {
        tokio::select! {
            action = rx.recv() => match action {
                Some(Action::Create { item, list }) => match board.create(&item, &list).await {
                    Ok(()) => {
                        tracing::info!(name = %item.name, "created new item");
                        report.created += 1;
                    }
                    Err(e) => {
                        tracing::error!(name = %item.name, error = %e, "could not create item");
                        report.errors.push(e.to_string());
                    }
                },
                Some(Action::Remove { item }) => {
                    match apply_removal(board.as_ref(), removal_action, &item).await {
                        Ok(()) => report.removed += 1,
                        Err(e) => report.errors.push(e.to_string()),
                    }
                }
                Some(Action::Fail(msg)) => {
                    tracing::error!("{}", msg);
                    report.errors.push(msg);
                }
                None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                let msg = "global deadline elapsed before all actions were applied".to_string();
                tracing::warn!("{}", msg);
                report.errors.push(msg);
                break;
            }
        }
    }
}

/// Worker half of the serialized topology: fetch, reconcile, emit actions.
/// Creates are emitted before removals so a name collision is never removed
/// while its replacement is still pending.
async fn compute_actions(
    entry: SourceEntry,
    index: Arc<BoardStateIndex>,
    tx: mpsc::UnboundedSender<Action>,
) {
    let fetched = match entry.fetcher.fetch().await {
        Ok(items) => items,
        Err(e) => {
            let _ = tx.send(Action::Fail(e.to_string()));
            return;
        }
    };

    let result = reconcile(fetched, index.as_ref(), &entry.config.label);

    for item in result.to_create {
        let _ = tx.send(Action::Create {
            item,
            list: entry.config.list.clone(),
        });
    }

    if !entry.config.strict {
        return;
    }

    for item in result.to_remove {
        let _ = tx.send(Action::Remove { item });
    }
}

/// Topology (a): each worker mutates the board directly. Requires the board
/// client to be safe for concurrent use.
async fn run_direct(
    board: Arc<dyn Board>,
    removal_action: RemovalAction,
    due: Vec<SourceEntry>,
    index: Arc<BoardStateIndex>,
    deadline: Instant,
    report: &mut CycleReport,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<WorkerReport>();
    let worker_count = due.len();

    for entry in due {
        let tx = tx.clone();
        let board = Arc::clone(&board);
        let index = Arc::clone(&index);
        tokio::spawn(async move {
            let worker_report = direct_worker(entry, board, removal_action, index, deadline).await;
            let _ = tx.send(worker_report);
        });
    }
    drop(tx);

    let mut received = 0;
    while received < worker_count {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(worker_report) => {
                    report.created += worker_report.created;
                    report.removed += worker_report.removed;
                    report.errors.extend(worker_report.errors);
                    received += 1;
                }
                None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                let msg = "global deadline elapsed before all workers finished".to_string();
                tracing::warn!("{}", msg);
                report.errors.push(msg);
                break;
            }
        }
    }
}

async fn direct_worker(
    entry: SourceEntry,
    board: Arc<dyn Board>,
    removal_action: RemovalAction,
    index: Arc<BoardStateIndex>,
    deadline: Instant,
) -> WorkerReport {
    let mut report = WorkerReport::default();

    let fetched = match entry.fetcher.fetch().await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(source = %entry.config.name, error = %e, "fetch failed");
            report.errors.push(e.to_string());
            return report;
        }
    };

    let result = reconcile(fetched, index.as_ref(), &entry.config.label);

    for item in result.to_create {
        if Instant::now() >= deadline {
            report.errors.push(format!(
                "deadline elapsed, skipping remaining actions for source '{}'",
                entry.config.name
            ));
            return report;
        }
        match board.create(&item, &entry.config.list).await {
            Ok(()) => {
                tracing::info!(name = %item.name, "created new item");
                report.created += 1;
            }
            Err(e) => {
                tracing::error!(name = %item.name, error = %e, "could not create item");
                report.errors.push(e.to_string());
            }
        }
    }

    if !entry.config.strict {
        return report;
    }

    for item in result.to_remove {
        if Instant::now() >= deadline {
            report.errors.push(format!(
                "deadline elapsed, skipping remaining actions for source '{}'",
                entry.config.name
            ));
            return report;
        }
        match apply_removal(board.as_ref(), removal_action, &item).await {
            Ok(()) => report.removed += 1,
            Err(e) => report.errors.push(e.to_string()),
        }
    }

    report
}

/// Remove a stale item according to the configured removal semantics
async fn apply_removal(board: &dyn Board, action: RemovalAction, item: &BoardItem) -> Result<()> {
    let outcome = match action {
        RemovalAction::Archive => board.archive(item).await,
        RemovalAction::Delete => board.delete(item).await,
    };

    match &outcome {
        Ok(()) => tracing::info!(name = %item.name, action = ?action, "removed stale item"),
        Err(e) => tracing::error!(name = %item.name, error = %e, "could not remove stale item"),
    }

    outcome
}
