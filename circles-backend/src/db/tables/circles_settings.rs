//! Circles settings persistence on top of the preferences store
//!
//! The record lives under a fixed key as JSON. Reads never fail: a missing
//! or undecodable entry yields the default record. Updates follow the
//! replace-and-merge pattern: start from a fresh default, copy every field
//! of the stored record onto it, hand that to the caller's closure, then
//! write the result back wholesale.

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::CirclesSettings;

/// Fixed preferences key for the circles settings record
pub const CIRCLES_SETTINGS_KEY: &str = "circles_settings";

impl Database {
    /// Get the circles settings, falling back to defaults
    pub fn get_circles_settings(&self) -> SqliteResult<CirclesSettings> {
        let stored = self.get_preference(CIRCLES_SETTINGS_KEY)?;
        Ok(stored
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default())
    }

    /// Update the circles settings through a replace-and-merge closure.
    /// The connection lock is held across the read, the closure and the
    /// write-back so concurrent updates serialize instead of clobbering
    /// each other's committed record.
    pub fn update_circles_settings<F>(&self, f: F) -> SqliteResult<CirclesSettings>
    where
        F: FnOnce(CirclesSettings) -> CirclesSettings,
    {
        let conn = self.conn.lock().unwrap();

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [CIRCLES_SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let old: CirclesSettings = stored
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();

        let mut merged = CirclesSettings::default();
        merged.token = old.token;
        merged.bot_peer_id = old.bot_peer_id;
        merged.dev = old.dev;
        merged.group_names = old.group_names;
        merged.remote_inclusions = old.remote_inclusions;
        merged.local_inclusions = old.local_inclusions;
        merged.index = old.index;

        let updated = f(merged);
        let json = serde_json::to_string(&updated)
            .unwrap_or_else(|_| "{}".to_string());
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            [CIRCLES_SETTINGS_KEY, json.as_str(), now.as_str()],
        )?;
        Ok(updated)
    }
}
