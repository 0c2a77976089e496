//! Generic preferences store operations
//!
//! Small key/value table holding JSON documents. The circles settings
//! record is one entry; nothing here knows its shape.

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;

impl Database {
    /// Get a raw preference value by key
    pub fn get_preference(&self, key: &str) -> SqliteResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
    }

    /// Set a preference value, replacing any previous entry
    pub fn set_preference(&self, key: &str, value: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            [key, value, &now],
        )?;
        Ok(())
    }
}
