//! Host application seams
//!
//! The peer/messaging protocol and the host's own store are external
//! systems; the sync engine only needs two narrow views of them: member
//! lookup for group/channel chats and chat-list group assignment. The
//! binary wires both to the SQLite mirror tables the host feeds.

use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Database;
use crate::peers::{PeerGroupId, PeerId, PeerNamespace};

/// Member lookup for group and channel chats
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Members of a group or channel chat. Lookups are single-shot; a
    /// failure is reported, the caller degrades to an empty list.
    async fn chat_members(&self, chat: PeerId) -> Result<Vec<PeerId>, String>;
}

/// Chat-list view: which peers exist and which group they sit in
pub trait ChatList: Send + Sync {
    fn peer_known(&self, peer: PeerId) -> Result<bool, String>;
    fn set_group(&self, peer: PeerId, group: PeerGroupId) -> Result<(), String>;
}

/// Directory over the `chat_members` mirror table
pub struct SqlitePeerDirectory {
    db: Arc<Database>,
}

impl SqlitePeerDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PeerDirectory for SqlitePeerDirectory {
    async fn chat_members(&self, chat: PeerId) -> Result<Vec<PeerId>, String> {
        if chat.namespace == PeerNamespace::User {
            return Ok(Vec::new());
        }
        self.db
            .chat_members(chat)
            .map_err(|e| format!("chat member lookup failed for {}: {}", chat, e))
    }
}

/// Chat list over the `peers` and `chat_list` mirror tables
pub struct SqliteChatList {
    db: Arc<Database>,
}

impl SqliteChatList {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ChatList for SqliteChatList {
    fn peer_known(&self, peer: PeerId) -> Result<bool, String> {
        self.db
            .peer_known(peer)
            .map_err(|e| format!("peer lookup failed for {}: {}", peer, e))
    }

    fn set_group(&self, peer: PeerId, group: PeerGroupId) -> Result<(), String> {
        self.db
            .set_chat_list_group(peer, group)
            .map_err(|e| format!("chat list update failed for {}: {}", peer, e))
    }
}

/// A message the host relays for token intake
#[derive(Debug, Clone)]
pub struct HostMessage {
    pub id: i64,
    pub from: Option<PeerId>,
    pub text: String,
}
