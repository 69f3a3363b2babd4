//! Auris storage crate - SQLite persistence and the remote slot source.
//!
//! Provides the two collaborator implementations the aggregation pipeline
//! consumes:
//! - `SlotEventRepository` / `RemoteSlotSource` as `SlotSource`
//! - `SummaryRepository` as `SummarySink`

pub mod db;
pub mod migrations;
pub mod remote;
pub mod repository;

pub use db::Database;
pub use remote::{RemoteSlotSource, RemoteSourceConfig};
pub use repository::{SlotEventRepository, SummaryRepository};
