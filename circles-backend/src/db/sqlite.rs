//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//!
//! All table operations are in the tables/ subdirectory.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// Main database wrapper with connection pooling via Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize all database tables
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        // Generic preferences store (the circles settings record lives here)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Known peers, mirrored from the host app (bot-API ids)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS peers (
                peer_id INTEGER PRIMARY KEY,
                title TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Member lists per group/channel chat, mirrored from the host app
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_members (
                chat_id INTEGER NOT NULL,
                member_id INTEGER NOT NULL,
                UNIQUE(chat_id, member_id)
            )",
            [],
        )?;

        // Chat-list group assignment per peer
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_list (
                peer_id INTEGER PRIMARY KEY,
                group_id INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}
