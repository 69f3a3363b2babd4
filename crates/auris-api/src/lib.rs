//! Auris API crate - REST surface for starting and polling analysis runs.

pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use registry::{ProgressReporter, RunRecord, RunRegistry, RunStatus};
pub use routes::{create_router, start_server};
pub use state::AppState;
