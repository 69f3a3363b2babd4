//! Remote per-slot data source.
//!
//! Alternative to the batched SQLite fetch: each slot is requested from a
//! remote endpoint individually. Requests run concurrently, bounded by a
//! semaphore so a day's fan-out cannot overwhelm the data source. Each
//! request carries its own timeout and fails in isolation; a slot that
//! cannot be fetched is simply absent from the result, which downstream
//! classifies as `Unknown`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use auris_aggregate::SlotSource;
use auris_core::config::FetchConfig;
use auris_core::error::AurisError;
use auris_core::types::TimeSlot;

/// Connection settings for the remote slot endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSourceConfig {
    /// Base URL, e.g. `http://127.0.0.1:9000`.
    pub base_url: String,
    /// Maximum concurrent slot requests.
    pub fan_out: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteSourceConfig {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            base_url: config.remote_base_url.trim_end_matches('/').to_string(),
            fan_out: config.fan_out.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// SlotSource that issues one HTTP GET per slot.
pub struct RemoteSlotSource {
    client: reqwest::Client,
    config: RemoteSourceConfig,
    limiter: Arc<Semaphore>,
}

impl RemoteSlotSource {
    pub fn new(config: RemoteSourceConfig) -> Result<Self, AurisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AurisError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        let limiter = Arc::new(Semaphore::new(config.fan_out));
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// URL of one slot's payload.
    fn slot_url(&self, device_id: &str, date: NaiveDate, slot: TimeSlot) -> String {
        format!(
            "{}/devices/{}/days/{}/slots/{}",
            self.config.base_url,
            device_id,
            date.format("%Y-%m-%d"),
            slot.as_str()
        )
    }
}

/// Fetch one slot. `None` means "no data" (404) or an isolated failure.
async fn fetch_one(client: reqwest::Client, url: String, slot: TimeSlot) -> Option<Value> {
    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(slot = slot.as_str(), error = %e, "slot fetch failed");
            return None;
        }
    };
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        debug!(slot = slot.as_str(), "no data for slot");
        return None;
    }
    if !response.status().is_success() {
        warn!(
            slot = slot.as_str(),
            status = %response.status(),
            "slot fetch returned error status"
        );
        return None;
    }
    match response.json::<Value>().await {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(slot = slot.as_str(), error = %e, "slot payload was not valid JSON");
            None
        }
    }
}

#[async_trait]
impl SlotSource for RemoteSlotSource {
    async fn fetch(
        &self,
        device_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<TimeSlot, Value>, AurisError> {
        let mut requests = JoinSet::new();
        for slot in TimeSlot::all() {
            let client = self.client.clone();
            let limiter = Arc::clone(&self.limiter);
            let url = self.slot_url(device_id, date, slot);
            requests.spawn(async move {
                // Closed only on runtime shutdown; treat as a failed slot.
                let _permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (slot, None),
                };
                (slot, fetch_one(client, url, slot).await)
            });
        }

        let mut day = BTreeMap::new();
        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok((slot, Some(payload))) => {
                    day.insert(slot, payload);
                }
                Ok((_, None)) => {}
                Err(e) => warn!(error = %e, "slot fetch task panicked"),
            }
        }
        Ok(day)
    }
}
