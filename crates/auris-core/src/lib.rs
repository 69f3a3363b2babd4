pub mod config;
pub mod error;
pub mod types;

pub use config::AurisConfig;
pub use error::{AurisError, Result};
pub use types::*;
