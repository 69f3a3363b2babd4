use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AurisError, Result};
use crate::types::Category;

/// Top-level configuration for the Auris application.
///
/// Loaded from `~/.auris/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AurisConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AurisConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AurisConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AurisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// API server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 8010,
            log_level: "info".to_string(),
        }
    }
}

/// Which day-wide ranking policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingPolicyKind {
    /// Top-N labels plus a synthetic overflow entry.
    FlatTopN,
    /// Category-bucketed, biometric uncapped, hard global cap.
    CategoryPriority,
}

/// Aggregation engine settings: ranking policy and normalization tables.
///
/// The label lists here extend the built-in tables; an empty list means
/// "use the built-ins unchanged".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Ranking policy. `category-priority` is the default; `flat-top-n` is
    /// the historical alternative and must be selected explicitly.
    pub ranking_policy: RankingPolicyKind,
    /// Entry count for the flat policy, overflow excluded.
    pub top_n: usize,
    /// Hard entry cap for the category policy. Biometric events are exempt.
    pub cap: usize,
    /// Translate canonical labels to localized display names.
    pub translate: bool,
    /// Category order used to fill the capped ranking, highest first.
    pub category_priority: Vec<Category>,
    /// Raw labels dropped from all aggregation.
    pub excluded_events: Vec<String>,
    /// Raw label -> canonical label merges, applied before translation.
    pub consolidation: BTreeMap<String, String>,
    /// Additional category membership, merged over the built-in lists.
    pub categories: CategoryListConfig,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            ranking_policy: RankingPolicyKind::CategoryPriority,
            top_n: 5,
            cap: 10,
            translate: true,
            category_priority: vec![
                Category::Biometric,
                Category::Voice,
                Category::DailyLife,
                Category::Other,
            ],
            excluded_events: Vec::new(),
            consolidation: BTreeMap::new(),
            categories: CategoryListConfig::default(),
        }
    }
}

/// Per-category label membership lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryListConfig {
    pub biometric: Vec<String>,
    pub voice: Vec<String>,
    pub daily_life: Vec<String>,
}

/// How raw per-slot payloads are sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// One batched query against local storage.
    Batch,
    /// Per-slot requests against a remote endpoint, bounded fan-out.
    Remote,
}

/// Data-source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub mode: FetchMode,
    /// Base URL for the remote per-slot endpoint.
    pub remote_base_url: String,
    /// Maximum concurrent per-slot requests in remote mode.
    pub fan_out: usize,
    /// Per-request timeout in seconds, remote mode only.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Batch,
            remote_base_url: "http://127.0.0.1:9000".to_string(),
            fan_out: 8,
            timeout_secs: 10,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path.
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.auris/data/auris.db".to_string(),
        }
    }
}
