//! Circles synchronization engine
//!
//! The full pipeline is fetch -> push members -> apply inclusions. Each
//! network call is single-shot: a failure is broadcast as a notification
//! and the pipeline continues with empty results, so callers never see
//! transport errors (only database errors propagate).

pub mod reconcile;
pub mod token;

use futures_util::future::join_all;
use rusqlite::Result as SqliteResult;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::gateway::{CirclesEvent, EventBroadcaster};
use crate::host::{ChatList, HostMessage, PeerDirectory};
use crate::models::CirclesSettings;
use crate::peers::{PeerGroupId, PeerId, PeerNamespace};
use crate::remote::{ApiError, CirclesApi, CollectedCircle};

/// Outcome of one full synchronization run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sync_id: String,
    pub circle_count: usize,
    pub inclusions_applied: usize,
}

pub struct SyncService {
    db: Arc<Database>,
    broadcaster: Arc<EventBroadcaster>,
    /// Overrides the settings-derived base URL (staging, tests)
    api_base_override: Option<String>,
}

impl SyncService {
    pub fn new(db: Arc<Database>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            db,
            broadcaster,
            api_base_override: None,
        }
    }

    pub fn with_api_base(mut self, base_url: Option<String>) -> Self {
        self.api_base_override = base_url;
        self
    }

    /// Client for the current settings, None without a token
    fn api_for(&self, settings: &CirclesSettings) -> Option<CirclesApi> {
        let token = settings.token.as_deref()?;
        let base = self
            .api_base_override
            .as_deref()
            .unwrap_or_else(|| settings.api_base_url());
        Some(CirclesApi::new(base, token))
    }

    fn report_api_error(&self, operation: &str, err: &ApiError) {
        log::warn!("Circles API {} failed: {}", operation, err);
        let event = match err {
            ApiError::Connection(detail) => CirclesEvent::connection_error(operation, detail),
            ApiError::Auth(status) => CirclesEvent::auth_error(operation, *status),
            ApiError::Server(status) => {
                CirclesEvent::server_error(operation, &format!("status {}", status))
            }
            ApiError::Decode(detail) => CirclesEvent::server_error(operation, detail),
        };
        self.broadcaster.broadcast(event);
    }

    /// Fetch the circle document and rebuild the remote side of the
    /// settings record. Without a token this is a no-op. Returns the
    /// number of circles now known.
    pub async fn fetch(&self, user: PeerId) -> SqliteResult<usize> {
        let settings = self.db.get_circles_settings()?;
        let api = match self.api_for(&settings) {
            Some(api) => api,
            None => return Ok(settings.group_names.len()),
        };

        let mut circles = match api.fetch_circles().await {
            Ok(circles) => circles,
            Err(e) => {
                self.report_api_error("fetch", &e);
                Vec::new()
            }
        };
        reconcile::dedupe_circle_peers(&mut circles);

        let updated = self.db.update_circles_settings(|mut s| {
            reconcile::apply_fetched(&mut s, &circles, user);
            s
        })?;

        self.broadcaster
            .broadcast(CirclesEvent::circles_updated(updated.group_names.len()));
        Ok(updated.group_names.len())
    }

    /// Collect member lists of every group/channel chat assigned to a
    /// circle. A failed lookup degrades to an empty list.
    pub async fn collect_members(
        &self,
        directory: &dyn PeerDirectory,
    ) -> SqliteResult<HashMap<PeerGroupId, HashMap<PeerId, Vec<PeerId>>>> {
        let settings = self.db.get_circles_settings()?;

        let mut collected: HashMap<PeerGroupId, HashMap<PeerId, Vec<PeerId>>> = HashMap::new();
        for circle in settings.group_names.keys().copied() {
            let chats: Vec<PeerId> = settings
                .remote_inclusions
                .iter()
                .filter(|(peer, group)| {
                    **group == circle && peer.namespace != PeerNamespace::User
                })
                .map(|(peer, _)| *peer)
                .collect();

            let lookups = chats.iter().map(|chat| directory.chat_members(*chat));
            let results = join_all(lookups).await;

            let mut members_by_chat: HashMap<PeerId, Vec<PeerId>> = HashMap::new();
            for (chat, result) in chats.into_iter().zip(results) {
                let members = match result {
                    Ok(members) => members,
                    Err(e) => {
                        log::warn!("Member lookup for {} failed: {}", chat, e);
                        Vec::new()
                    }
                };
                members_by_chat.insert(chat, members);
            }
            collected.insert(circle, members_by_chat);
        }
        Ok(collected)
    }

    /// Upload collected chat members and merge them back as inclusions.
    /// The merge runs regardless of upload success: the collected members
    /// are authoritative locally either way.
    pub async fn push_members(
        &self,
        directory: &dyn PeerDirectory,
        user: PeerId,
    ) -> SqliteResult<()> {
        let settings = self.db.get_circles_settings()?;
        let api = match self.api_for(&settings) {
            Some(api) => api,
            None => return Ok(()),
        };

        let collected = self.collect_members(directory).await?;
        let payload: Vec<CollectedCircle> = reconcile::build_payload(&collected);

        if let Err(e) = api.send_members(&payload).await {
            self.report_api_error("push", &e);
        }

        self.db.update_circles_settings(|mut s| {
            reconcile::merge_pushed(&mut s, &payload, user);
            s
        })?;
        Ok(())
    }

    /// Apply the effective inclusions to the host chat list. Unknown
    /// peers are skipped and picked up on a later run.
    pub fn apply_inclusions(&self, chat_list: &dyn ChatList) -> SqliteResult<usize> {
        let settings = self.db.get_circles_settings()?;

        let mut applied = 0;
        for (peer, group) in settings.inclusions() {
            match chat_list.peer_known(peer) {
                Ok(true) => match chat_list.set_group(peer, group) {
                    Ok(()) => applied += 1,
                    Err(e) => log::warn!("Chat list update for {} failed: {}", peer, e),
                },
                Ok(false) => {}
                Err(e) => log::warn!("Peer lookup for {} failed: {}", peer, e),
            }
        }
        Ok(applied)
    }

    /// Full pipeline: fetch, push members, apply inclusions
    pub async fn synchronize(
        &self,
        directory: &dyn PeerDirectory,
        chat_list: &dyn ChatList,
        user: PeerId,
    ) -> SqliteResult<SyncReport> {
        let sync_id = Uuid::new_v4().to_string();
        self.broadcaster
            .broadcast(CirclesEvent::sync_started(&sync_id));

        let circle_count = self.fetch(user).await?;
        self.push_members(directory, user).await?;
        let inclusions_applied = self.apply_inclusions(chat_list)?;

        self.broadcaster.broadcast(CirclesEvent::sync_completed(
            &sync_id,
            circle_count,
            inclusions_applied,
        ));
        log::info!(
            "Sync {} done: {} circles, {} inclusions applied",
            sync_id,
            circle_count,
            inclusions_applied
        );

        Ok(SyncReport {
            sync_id,
            circle_count,
            inclusions_applied,
        })
    }

    /// Token intake from relayed host messages. A token message from the
    /// configured bot stores the new token and triggers a full sync; any
    /// other bot message triggers a sync. Returns ids of handshake and
    /// token messages the host should purge.
    pub async fn handle_messages(
        &self,
        messages: &[HostMessage],
        directory: &dyn PeerDirectory,
        chat_list: &dyn ChatList,
        user: PeerId,
    ) -> SqliteResult<Vec<i64>> {
        let settings = self.db.get_circles_settings()?;
        let bot = match settings.bot_peer_id {
            Some(bot) => bot,
            None => return Ok(Vec::new()),
        };

        let incoming_token = messages
            .iter()
            .find_map(|m| token::extract_token(&settings, m))
            .map(str::to_owned);

        if let Some(new_token) = incoming_token {
            self.db.update_circles_settings(|mut s| {
                s.token = Some(new_token.clone());
                s
            })?;
            self.broadcaster.broadcast(CirclesEvent::token_received());
            log::info!("Received new Circles API token from {}", settings.bot_name());

            self.synchronize(directory, chat_list, user).await?;

            let purge: Vec<i64> = messages
                .iter()
                .filter(|m| token::is_purgeable(&settings, m))
                .map(|m| m.id)
                .collect();
            return Ok(purge);
        }

        if messages.iter().any(|m| m.from == Some(bot)) {
            self.synchronize(directory, chat_list, user).await?;
        }
        Ok(Vec::new())
    }
}
