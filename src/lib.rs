//! Offline-first client for an incremental task-sync API.
//!
//! A [`Client`] owns a local [`Cache`] of projects, items, labels and notes,
//! a [`CommandQueue`] of pending writes, and the temp-id mappings returned by
//! the server. [`StateStore`] persists the cache between runs so the next
//! pull is incremental.

pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod domain;
pub mod id;
pub mod query;
pub mod store;
pub mod sync;
pub mod transport;

pub use cache::{Cache, CacheTable, FULL_SYNC_TOKEN};
pub use client::{Client, DEFAULT_ENDPOINT};
pub use commands::{Command, CommandError, CommandKind, CommandQueue, Reorder};
pub use config::{ClientConfig, ConfigError};
pub use domain::{
    Due, Entity, InvalidPatch, Item, ItemPatch, Label, LabelPatch, Note, NotePatch, Project,
    ProjectPatch, ResourceType,
};
pub use id::{Id, IdError};
pub use query::Scan;
pub use store::{StateStore, StoreError};
pub use sync::{CommandFailure, PullOutcome, PullSummary, PushSummary, SyncError};
pub use transport::{
    Clock, HttpTransport, SystemClock, Transport, TransportError, TransportResponse, WireLog,
};
