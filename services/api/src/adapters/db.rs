//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StateStore` port from the `core` crate. The persisted shape is a
//! key-value table in a local SQLite file: three JSON records under fixed keys,
//! each overwritten wholesale on every mutation.
//!
//! The keys are the ones the original web client used in localStorage, so an
//! exported browser profile can be imported as-is.

use async_trait::async_trait;
use nyaya_core::domain::{AppSettings, ChatSession, UserState};
use nyaya_core::ports::{PortError, PortResult, StateStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

const USER_STATE_KEY: &str = "ns_userState";
const SETTINGS_KEY: &str = "ns_settings";
const SESSIONS_KEY: &str = "ns_sessions";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite-backed adapter that implements the `StateStore` port.
#[derive(Clone)]
pub struct SqliteStateAdapter {
    pool: SqlitePool,
}

impl SqliteStateAdapter {
    /// Creates a new `SqliteStateAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to create the key-value table at startup.
    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Reads and deserializes one record. Absent and unparseable records both
    /// come back as `None`: the caller falls back to defaults, matching the
    /// original client's behavior for corrupt localStorage entries.
    async fn load_record<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_state WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match row {
            None => Ok(None),
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(key, error = %e, "discarding unparseable persisted record");
                    Ok(None)
                }
            },
        }
    }

    /// Serializes and upserts one record, replacing any previous value.
    async fn save_record<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO app_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `StateStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StateStore for SqliteStateAdapter {
    async fn load_user_state(&self) -> PortResult<Option<UserState>> {
        self.load_record(USER_STATE_KEY).await
    }

    async fn save_user_state(&self, state: &UserState) -> PortResult<()> {
        self.save_record(USER_STATE_KEY, state).await
    }

    async fn load_settings(&self) -> PortResult<Option<AppSettings>> {
        self.load_record(SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: &AppSettings) -> PortResult<()> {
        self.save_record(SETTINGS_KEY, settings).await
    }

    async fn load_sessions(&self) -> PortResult<Option<Vec<ChatSession>>> {
        self.load_record(SESSIONS_KEY).await
    }

    async fn save_sessions(&self, sessions: &[ChatSession]) -> PortResult<()> {
        self.save_record(SESSIONS_KEY, &sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nyaya_core::domain::{Complexity, Language, Message, SubscriptionTier};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn adapter() -> SqliteStateAdapter {
        // A single connection so the in-memory database is shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let adapter = SqliteStateAdapter::new(pool);
        adapter.create_schema().await.unwrap();
        adapter
    }

    #[tokio::test]
    async fn absent_records_load_as_none() {
        let db = adapter().await;
        assert!(db.load_user_state().await.unwrap().is_none());
        assert!(db.load_settings().await.unwrap().is_none());
        assert!(db.load_sessions().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_state_round_trips() {
        let db = adapter().await;
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 9, 0, 0).unwrap();
        let mut state = UserState::new(now);
        state.upgrade_tier(SubscriptionTier::Pro);
        state.purchase_one_time_feature("Scenario Simulator");
        state.daily_queries_used = 12;

        db.save_user_state(&state).await.unwrap();
        let loaded = db.load_user_state().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let db = adapter().await;
        let settings = AppSettings {
            language: Language::Hinglish,
            complexity: Complexity::Legal,
        };
        db.save_settings(&settings).await.unwrap();
        assert_eq!(db.load_settings().await.unwrap().unwrap(), settings);
    }

    #[tokio::test]
    async fn sessions_round_trip_and_saves_overwrite() {
        let db = adapter().await;
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 9, 0, 0).unwrap();
        let sessions = vec![ChatSession {
            id: "default".into(),
            title: "New Conversation".into(),
            messages: vec![Message::user("What is anticipatory bail?", now)],
            updated_at: now,
        }];
        db.save_sessions(&sessions).await.unwrap();
        assert_eq!(db.load_sessions().await.unwrap().unwrap(), sessions);

        // A later save replaces the record wholesale.
        db.save_sessions(&[]).await.unwrap();
        let reloaded = db.load_sessions().await.unwrap().unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn unparseable_records_fall_back_to_none() {
        let db = adapter().await;
        sqlx::query("INSERT INTO app_state (key, value) VALUES ('ns_userState', 'not json')")
            .execute(&db.pool)
            .await
            .unwrap();
        assert!(db.load_user_state().await.unwrap().is_none());
    }
}
