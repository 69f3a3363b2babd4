//! Database schema migrations.
//!
//! Applies the initial schema: raw per-slot detector rows, persisted daily
//! summaries, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use auris_core::error::AurisError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), AurisError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| AurisError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| AurisError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), AurisError> {
    conn.execute_batch(
        "
        -- Raw detector output, one row per (device, date, slot).
        -- events holds the slot's payload as JSON text; its shape varies
        -- by detector generation and is classified at read time.
        CREATE TABLE IF NOT EXISTS slot_events (
            device_id   TEXT NOT NULL,
            date        TEXT NOT NULL,
            time_block  TEXT NOT NULL,
            events      TEXT NOT NULL DEFAULT '[]',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (device_id, date, time_block)
        );

        CREATE INDEX IF NOT EXISTS idx_slot_events_device_date
            ON slot_events (device_id, date);

        -- Persisted aggregation results, one row per (device, date).
        CREATE TABLE IF NOT EXISTS daily_summary (
            device_id       TEXT NOT NULL,
            date            TEXT NOT NULL,
            summary_ranking TEXT NOT NULL DEFAULT '[]',
            time_blocks     TEXT NOT NULL DEFAULT '{}',
            updated_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (device_id, date)
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| AurisError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}
