//! Repository implementations for SQLite-backed persistence.
//!
//! Provides SlotEventRepository (the batch SlotSource) and
//! SummaryRepository (the SummarySink) operating on the Database struct
//! with raw SQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use serde_json::Value;
use tracing::warn;

use auris_aggregate::{SlotSource, SummarySink};
use auris_core::error::AurisError;
use auris_core::types::{AggregationResult, RankedEvent, SlotSummary, TimeSlot};

use crate::db::Database;

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Repository for raw per-slot detector rows.
pub struct SlotEventRepository {
    db: Arc<Database>,
}

impl SlotEventRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store (or replace) one slot's raw payload.
    pub fn save_slot(
        &self,
        device_id: &str,
        date: NaiveDate,
        slot: TimeSlot,
        events: &Value,
    ) -> Result<(), AurisError> {
        let payload = serde_json::to_string(events)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO slot_events (device_id, date, time_block, events)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (device_id, date, time_block)
                 DO UPDATE SET events = excluded.events",
                rusqlite::params![device_id, date_key(date), slot.as_str(), payload],
            )
            .map_err(|e| AurisError::Storage(format!("Failed to save slot: {}", e)))?;
            Ok(())
        })
    }

    /// Fetch every stored slot for one day.
    ///
    /// Returns only slots that have rows; an absent key means no data was
    /// recorded for that slot. Rows with an unparseable payload degrade to
    /// a null payload rather than aborting the day.
    pub fn fetch_day(
        &self,
        device_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<TimeSlot, Value>, AurisError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT time_block, events FROM slot_events
                     WHERE device_id = ?1 AND date = ?2",
                )
                .map_err(|e| AurisError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![device_id, date_key(date)], |row| {
                    let time_block: String = row.get(0)?;
                    let events: String = row.get(1)?;
                    Ok((time_block, events))
                })
                .map_err(|e| AurisError::Storage(e.to_string()))?;

            let mut day = BTreeMap::new();
            for row in rows {
                let (time_block, events) =
                    row.map_err(|e| AurisError::Storage(e.to_string()))?;
                let Some(slot) = TimeSlot::parse(&time_block) else {
                    warn!(time_block, "skipping row with unknown time_block");
                    continue;
                };
                let payload = match serde_json::from_str(&events) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(time_block, error = %e, "malformed slot payload");
                        Value::Null
                    }
                };
                day.insert(slot, payload);
            }
            Ok(day)
        })
    }
}

#[async_trait]
impl SlotSource for SlotEventRepository {
    async fn fetch(
        &self,
        device_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<TimeSlot, Value>, AurisError> {
        self.fetch_day(device_id, date)
    }
}

/// Repository for persisted daily aggregation results.
pub struct SummaryRepository {
    db: Arc<Database>,
}

impl SummaryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upsert the result for `(device_id, date)`.
    ///
    /// Last write wins; repeating an identical call is a no-op apart from
    /// the timestamp, so persistence is safe to retry.
    pub fn upsert_summary(
        &self,
        device_id: &str,
        date: NaiveDate,
        result: &AggregationResult,
    ) -> Result<(), AurisError> {
        let ranking = serde_json::to_string(&result.summary_ranking)?;
        let time_blocks = serde_json::to_string(&result.time_blocks)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO daily_summary (device_id, date, summary_ranking, time_blocks, updated_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))
                 ON CONFLICT (device_id, date)
                 DO UPDATE SET summary_ranking = excluded.summary_ranking,
                               time_blocks = excluded.time_blocks,
                               updated_at = excluded.updated_at",
                rusqlite::params![device_id, date_key(date), ranking, time_blocks],
            )
            .map_err(|e| AurisError::Storage(format!("Failed to upsert summary: {}", e)))?;
            Ok(())
        })
    }

    /// Load the persisted result for `(device_id, date)`, if any.
    pub fn find(
        &self,
        device_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AggregationResult>, AurisError> {
        let row: Option<(String, String)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT summary_ranking, time_blocks FROM daily_summary
                 WHERE device_id = ?1 AND date = ?2",
                rusqlite::params![device_id, date_key(date)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| AurisError::Storage(e.to_string()))
        })?;

        match row {
            None => Ok(None),
            Some((ranking, time_blocks)) => {
                let summary_ranking: Vec<RankedEvent> = serde_json::from_str(&ranking)?;
                let time_blocks: BTreeMap<TimeSlot, SlotSummary> =
                    serde_json::from_str(&time_blocks)?;
                Ok(Some(AggregationResult {
                    time_blocks,
                    summary_ranking,
                }))
            }
        }
    }
}

#[async_trait]
impl SummarySink for SummaryRepository {
    async fn upsert(
        &self,
        device_id: &str,
        date: NaiveDate,
        result: &AggregationResult,
    ) -> Result<(), AurisError> {
        self.upsert_summary(device_id, date, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auris_core::types::{Category, EventCount};
    use serde_json::json;

    fn setup() -> (Arc<Database>, SlotEventRepository, SummaryRepository) {
        let db = Arc::new(Database::in_memory().unwrap());
        (
            Arc::clone(&db),
            SlotEventRepository::new(Arc::clone(&db)),
            SummaryRepository::new(db),
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 26).unwrap()
    }

    fn slot(s: &str) -> TimeSlot {
        TimeSlot::parse(s).unwrap()
    }

    #[test]
    fn test_fetch_day_returns_only_stored_slots() {
        let (_, slots, _) = setup();
        slots
            .save_slot(
                "d1",
                date(),
                slot("09-00"),
                &json!([{"label": "Speech", "prob": 0.9}]),
            )
            .unwrap();
        slots
            .save_slot("d1", date(), slot("21-30"), &json!([]))
            .unwrap();

        let day = slots.fetch_day("d1", date()).unwrap();
        assert_eq!(day.len(), 2);
        assert!(day.contains_key(&slot("09-00")));
        assert!(day.contains_key(&slot("21-30")));
        assert!(!day.contains_key(&slot("00-00")));
    }

    #[test]
    fn test_fetch_day_empty_for_unknown_key() {
        let (_, slots, _) = setup();
        let day = slots.fetch_day("nobody", date()).unwrap();
        assert!(day.is_empty());
    }

    #[test]
    fn test_fetch_day_is_scoped_to_device_and_date() {
        let (_, slots, _) = setup();
        slots
            .save_slot("d1", date(), slot("09-00"), &json!([]))
            .unwrap();
        slots
            .save_slot("d2", date(), slot("10-00"), &json!([]))
            .unwrap();

        let day = slots.fetch_day("d1", date()).unwrap();
        assert_eq!(day.len(), 1);
        let other_day = slots
            .fetch_day("d1", NaiveDate::from_ymd_opt(2025, 9, 27).unwrap())
            .unwrap();
        assert!(other_day.is_empty());
    }

    #[test]
    fn test_save_slot_replaces_existing_payload() {
        let (_, slots, _) = setup();
        slots
            .save_slot("d1", date(), slot("09-00"), &json!([{"label": "A", "prob": 0.1}]))
            .unwrap();
        slots
            .save_slot("d1", date(), slot("09-00"), &json!([{"label": "B", "prob": 0.2}]))
            .unwrap();

        let day = slots.fetch_day("d1", date()).unwrap();
        assert_eq!(day[&slot("09-00")][0]["label"], "B");
    }

    fn sample_result() -> AggregationResult {
        let mut time_blocks: BTreeMap<TimeSlot, SlotSummary> = TimeSlot::all()
            .map(|s| (s, SlotSummary::Unknown))
            .collect();
        time_blocks.insert(
            slot("09-00"),
            SlotSummary::Events(vec![EventCount {
                event: "Speech".into(),
                count: 4,
            }]),
        );
        time_blocks.insert(slot("09-30"), SlotSummary::Empty);
        AggregationResult {
            time_blocks,
            summary_ranking: vec![RankedEvent {
                event: "Speech".into(),
                count: 4,
                category: Some(Category::Voice),
            }],
        }
    }

    #[test]
    fn test_upsert_and_find_roundtrip() {
        let (_, _, summaries) = setup();
        let result = sample_result();
        summaries.upsert_summary("d1", date(), &result).unwrap();

        let loaded = summaries.find("d1", date()).unwrap().unwrap();
        assert_eq!(loaded, result);
        assert_eq!(loaded.time_blocks.len(), 48);
    }

    #[test]
    fn test_upsert_is_idempotent_and_last_write_wins() {
        let (_, _, summaries) = setup();
        let result = sample_result();
        summaries.upsert_summary("d1", date(), &result).unwrap();
        summaries.upsert_summary("d1", date(), &result).unwrap();

        let mut changed = result.clone();
        changed.summary_ranking[0].count = 9;
        summaries.upsert_summary("d1", date(), &changed).unwrap();

        let loaded = summaries.find("d1", date()).unwrap().unwrap();
        assert_eq!(loaded.summary_ranking[0].count, 9);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let (_, _, summaries) = setup();
        assert!(summaries.find("d1", date()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repositories_serve_as_pipeline_collaborators() {
        let (_, slots, summaries) = setup();
        slots
            .save_slot(
                "d1",
                date(),
                slot("12-00"),
                &json!([{"label": "Speech", "prob": 0.9}]),
            )
            .unwrap();

        let fetched = SlotSource::fetch(&slots, "d1", date()).await.unwrap();
        assert_eq!(fetched.len(), 1);

        let result = sample_result();
        SummarySink::upsert(&summaries, "d1", date(), &result)
            .await
            .unwrap();
        assert!(summaries.find("d1", date()).unwrap().is_some());
    }

    #[test]
    fn test_malformed_stored_payload_degrades_to_null() {
        let (db, slots, _) = setup();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO slot_events (device_id, date, time_block, events)
                 VALUES ('d1', '2025-09-26', '09-00', 'not json')",
                [],
            )
            .map_err(|e| AurisError::Storage(e.to_string()))?;
            Ok(())
        })
        .unwrap();

        let day = slots.fetch_day("d1", date()).unwrap();
        assert_eq!(day[&slot("09-00")], Value::Null);
    }
}
