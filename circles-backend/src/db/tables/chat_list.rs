//! Chat-list mirror operations
//!
//! Local mirror of the host app's peer table, per-chat member lists and
//! chat-list group assignments. The host feeds peers and members; the sync
//! engine reads members and writes group assignments.

use chrono::Utc;
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::peers::{PeerGroupId, PeerId};

impl Database {
    /// Insert or refresh a known peer
    pub fn upsert_peer(&self, peer: PeerId, title: Option<&str>) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO peers (peer_id, title, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(peer_id) DO UPDATE SET title = ?2, updated_at = ?3",
            rusqlite::params![peer.to_bot_api(), title, now],
        )?;
        Ok(())
    }

    /// Whether the peer is known to the chat-list mirror
    pub fn peer_known(&self, peer: PeerId) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM peers WHERE peer_id = ?1",
            [peer.to_bot_api()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Replace the member list of a group/channel chat
    pub fn replace_chat_members(&self, chat: PeerId, members: &[PeerId]) -> SqliteResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM chat_members WHERE chat_id = ?1",
            [chat.to_bot_api()],
        )?;
        for member in members {
            tx.execute(
                "INSERT OR IGNORE INTO chat_members (chat_id, member_id) VALUES (?1, ?2)",
                [chat.to_bot_api(), member.to_bot_api()],
            )?;
        }
        tx.commit()
    }

    /// Member list of a group/channel chat, empty when unknown
    pub fn chat_members(&self, chat: PeerId) -> SqliteResult<Vec<PeerId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT member_id FROM chat_members WHERE chat_id = ?1 ORDER BY member_id",
        )?;
        let rows = stmt.query_map([chat.to_bot_api()], |row| {
            let api_id: i64 = row.get(0)?;
            Ok(PeerId::from_bot_api(api_id))
        })?;
        rows.collect()
    }

    /// Assign a peer to a chat-list group
    pub fn set_chat_list_group(&self, peer: PeerId, group: PeerGroupId) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO chat_list (peer_id, group_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(peer_id) DO UPDATE SET group_id = ?2, updated_at = ?3",
            rusqlite::params![peer.to_bot_api(), group.0, now],
        )?;
        Ok(())
    }

    /// Current chat-list group assignment of a peer
    pub fn chat_list_group(&self, peer: PeerId) -> SqliteResult<Option<PeerGroupId>> {
        use rusqlite::OptionalExtension;
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT group_id FROM chat_list WHERE peer_id = ?1",
            [peer.to_bot_api()],
            |row| {
                let group: i32 = row.get(0)?;
                Ok(PeerGroupId(group))
            },
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_peer_known() {
        let (_dir, db) = test_db();
        let peer = PeerId::user(7);
        assert!(!db.peer_known(peer).unwrap());
        db.upsert_peer(peer, Some("Alice")).unwrap();
        assert!(db.peer_known(peer).unwrap());
    }

    #[test]
    fn test_chat_members_replace() {
        let (_dir, db) = test_db();
        let chat = PeerId::group(100);
        db.replace_chat_members(chat, &[PeerId::user(1), PeerId::user(2)])
            .unwrap();
        assert_eq!(
            db.chat_members(chat).unwrap(),
            vec![PeerId::user(1), PeerId::user(2)]
        );

        db.replace_chat_members(chat, &[PeerId::user(3)]).unwrap();
        assert_eq!(db.chat_members(chat).unwrap(), vec![PeerId::user(3)]);
    }

    #[test]
    fn test_chat_members_unknown_chat_is_empty() {
        let (_dir, db) = test_db();
        assert!(db.chat_members(PeerId::channel(5)).unwrap().is_empty());
    }

    #[test]
    fn test_chat_list_assignment() {
        let (_dir, db) = test_db();
        let peer = PeerId::user(42);
        assert_eq!(db.chat_list_group(peer).unwrap(), None);

        db.set_chat_list_group(peer, PeerGroupId(2)).unwrap();
        assert_eq!(db.chat_list_group(peer).unwrap(), Some(PeerGroupId(2)));

        db.set_chat_list_group(peer, PeerGroupId(3)).unwrap();
        assert_eq!(db.chat_list_group(peer).unwrap(), Some(PeerGroupId(3)));
    }
}
