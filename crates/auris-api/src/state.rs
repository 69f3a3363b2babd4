//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use auris_aggregate::Pipeline;
use auris_core::config::AurisConfig;
use auris_storage::Database;

use crate::registry::RunRegistry;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, read-only after startup.
    pub config: Arc<AurisConfig>,
    /// SQLite database for slot rows and persisted summaries.
    pub database: Arc<Database>,
    /// The configured aggregation pipeline.
    pub pipeline: Arc<Pipeline>,
    /// Registry of analysis runs started through the API.
    pub registry: Arc<RunRegistry>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(config: AurisConfig, database: Arc<Database>, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            database,
            pipeline: Arc::new(pipeline),
            registry: Arc::new(RunRegistry::new()),
            start_time: Instant::now(),
        }
    }
}
