//! boardsync - Task Board Synchronization Service
//!
//! boardsync keeps a task board in sync with any number of external sources
//! (issue trackers, habit spreadsheets, to-do services) on a recurring
//! schedule, and reacts to board change events by notifying downstream
//! services.
//!
//! # Architecture
//!
//! - **config**: YAML configuration (board credentials, sources, services)
//! - **schedule**: pure polling-period predicate
//! - **board**: item data model, per-run board snapshot, HTTP board client
//! - **source**: fetch adapters for external item sources
//! - **sync**: reconciliation engine and the concurrent fan-out coordinator
//! - **webhook**: HMAC signature verification and event parsing
//! - **notify**: notification fan-out to downstream services
//! - **server**: HTTP entry points (poll trigger, webhook receiver)

// Core modules
pub mod board;
pub mod config;
pub mod error;
pub mod schedule;
pub mod source;
pub mod sync;

// Components
pub mod logging;
pub mod notify;
pub mod server;
pub mod webhook;

// Re-exports
pub use error::{BoardSyncError, Result};
