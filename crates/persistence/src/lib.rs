#![deny(warnings)]

//! Persistence layer: schema-versioned game-state blobs in SQLite.
//!
//! Each save slot holds one JSON document of the whole [`GameState`]. Blobs
//! written by older versions load with missing fields defaulted; blobs from a
//! newer schema are refused.

use serde::Serialize;
use sim_core::{Catalogs, GameState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Version written with every save.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS saves (
    slot TEXT PRIMARY KEY NOT NULL,
    schema_version INTEGER NOT NULL,
    day INTEGER NOT NULL,
    payload TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("state blob is not valid: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("save uses schema {found}, newest supported is {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },
    #[error("cannot prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

/// Create the parent directory of a file-backed SQLite URL.
pub fn ensure_db_dir(url: &str) -> Result<(), PersistenceError> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .map(|p| p.split('?').next().unwrap_or(p));
    match path {
        Some(path) if !path.is_empty() && !path.starts_with(":memory:") => {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Summary row of a save slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub slot: String,
    pub schema_version: i64,
    pub day: i64,
    pub updated_at: String,
}

/// Open (creating if needed) the database at `url` and ensure the schema.
pub async fn init_db(url: &str) -> Result<SqlitePool, PersistenceError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // One connection: an in-memory database lives and dies with it.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    info!(url, "database ready");
    Ok(pool)
}

pub fn encode_state(state: &GameState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a blob written with `schema_version` and repair it against the
/// catalogs. The result is always paused.
pub fn decode_state(
    schema_version: i64,
    payload: &str,
    catalogs: &Catalogs,
) -> Result<GameState, PersistenceError> {
    if schema_version > SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedSchema {
            found: schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    let state: GameState = serde_json::from_str(payload)?;
    Ok(state.normalize(catalogs))
}

/// Insert or overwrite `slot`.
pub async fn save_state(
    pool: &SqlitePool,
    slot: &str,
    state: &GameState,
) -> Result<(), PersistenceError> {
    let payload = encode_state(state)?;
    sqlx::query(
        "INSERT INTO saves (slot, schema_version, day, payload, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(slot) DO UPDATE SET
             schema_version = excluded.schema_version,
             day = excluded.day,
             payload = excluded.payload,
             updated_at = excluded.updated_at",
    )
    .bind(slot)
    .bind(SCHEMA_VERSION)
    .bind(i64::from(state.day))
    .bind(payload.as_str())
    .execute(pool)
    .await?;
    info!(slot, day = state.day, bytes = payload.len(), "game saved");
    Ok(())
}

/// Load `slot`, or `None` when it does not exist.
pub async fn load_state(
    pool: &SqlitePool,
    slot: &str,
    catalogs: &Catalogs,
) -> Result<Option<GameState>, PersistenceError> {
    let row = sqlx::query("SELECT schema_version, payload FROM saves WHERE slot = ?1")
        .bind(slot)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let version: i64 = row.try_get("schema_version")?;
    let payload: String = row.try_get("payload")?;
    if version < SCHEMA_VERSION {
        warn!(slot, version, "loading save from an older schema");
    }
    let state = decode_state(version, &payload, catalogs)?;
    info!(slot, day = state.day, "game loaded");
    Ok(Some(state))
}

pub async fn list_slots(pool: &SqlitePool) -> Result<Vec<SlotInfo>, PersistenceError> {
    let rows = sqlx::query(
        "SELECT slot, schema_version, day, updated_at FROM saves ORDER BY updated_at DESC, slot",
    )
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            Ok(SlotInfo {
                slot: row.try_get("slot")?,
                schema_version: row.try_get("schema_version")?,
                day: row.try_get("day")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .collect()
}

/// Remove `slot`; returns whether it existed.
pub async fn delete_slot(pool: &SqlitePool, slot: &str) -> Result<bool, PersistenceError> {
    let done = sqlx::query("DELETE FROM saves WHERE slot = ?1")
        .bind(slot)
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use sim_core::ResearchId;

    async fn memory_db() -> SqlitePool {
        init_db("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[test]
    fn memory_url_needs_no_directory() {
        ensure_db_dir("sqlite::memory:").unwrap();
    }

    #[tokio::test]
    async fn save_then_load_restores_paused_state() {
        let pool = memory_db().await;
        let catalogs = Catalogs::standard();
        let mut state = GameState::new_game(&catalogs);
        state.day = 42;
        state.cash = Decimal::new(123_456, 2);
        state.paused = false;
        state.research.insert(ResearchId::from("seo_mastery"));
        save_state(&pool, "main", &state).await.unwrap();

        let loaded = load_state(&pool, "main", &catalogs).await.unwrap().unwrap();
        assert_eq!(loaded.day, 42);
        assert_eq!(loaded.cash, state.cash);
        assert!(loaded.paused);
        assert_eq!(loaded.research, state.research);
        assert_eq!(loaded.plans, state.plans);
    }

    #[tokio::test]
    async fn saving_twice_overwrites_slot() {
        let pool = memory_db().await;
        let catalogs = Catalogs::standard();
        let mut state = GameState::new_game(&catalogs);
        save_state(&pool, "main", &state).await.unwrap();
        state.day = 9;
        save_state(&pool, "main", &state).await.unwrap();
        save_state(&pool, "backup", &state).await.unwrap();

        let slots = list_slots(&pool).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.day == 9 && s.schema_version == SCHEMA_VERSION));

        assert!(delete_slot(&pool, "backup").await.unwrap());
        assert!(!delete_slot(&pool, "backup").await.unwrap());
        assert!(load_state(&pool, "backup", &catalogs).await.unwrap().is_none());
    }

    #[test]
    fn newer_schema_refused() {
        let catalogs = Catalogs::standard();
        let err = decode_state(SCHEMA_VERSION + 1, "{}", &catalogs).unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedSchema { found: 2, .. }));
    }

    #[test]
    fn sparse_blob_gets_defaults_and_catalog_milestones() {
        let catalogs = Catalogs::standard();
        let state = decode_state(
            1,
            r#"{"day": 15, "research": ["churn_algo", "retired_item"]}"#,
            &catalogs,
        )
        .unwrap();
        assert_eq!(state.day, 15);
        assert_eq!(state.milestones.len(), catalogs.milestones.len());
        assert_eq!(state.research.len(), 1);
        assert_eq!(state.cash, Decimal::from(sim_core::INITIAL_CASH_USD));
    }

    #[test]
    fn garbage_blob_is_an_error() {
        let catalogs = Catalogs::standard();
        assert!(matches!(
            decode_state(1, "not json", &catalogs),
            Err(PersistenceError::Codec(_))
        ));
    }

    proptest! {
        #[test]
        fn loaded_reputation_is_clamped(rep in -1000.0f64..1000.0, day in 1u32..10_000) {
            let catalogs = Catalogs::standard();
            let blob = format!(r#"{{"day": {day}, "reputation": {rep}}}"#);
            let state = decode_state(1, &blob, &catalogs).unwrap();
            prop_assert!((0.0..=100.0).contains(&state.reputation));
            prop_assert_eq!(state.day, day);
        }
    }
}
