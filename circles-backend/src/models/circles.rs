use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::peers::{PeerGroupId, PeerId};

/// Production Circles API base URL
pub const BASE_API_URL: &str = "https://api.circles.is/";
/// Development Circles API base URL
pub const BASE_DEV_API_URL: &str = "https://api.dev.randomcoffee.us/";

/// Admin bot handing out auth tokens (production)
pub const BOT_NAME: &str = "@circlesadminbot";
/// Admin bot handing out auth tokens (development)
pub const BOT_NAME_DEV: &str = "@circlesdevbot";

/// The one persisted Circles record: auth token, bot peer, circle names,
/// peer-to-circle assignments and per-circle ordering.
///
/// Stored as JSON in the preferences table under a fixed key. Reads never
/// fail: a missing or undecodable value yields the default record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirclesSettings {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub bot_peer_id: Option<PeerId>,
    #[serde(default)]
    pub dev: bool,
    #[serde(default)]
    pub group_names: HashMap<PeerGroupId, String>,
    /// Server-assigned peer -> circle, rebuilt wholesale on every fetch
    #[serde(default)]
    pub remote_inclusions: HashMap<PeerId, PeerGroupId>,
    /// Locally pinned peer -> circle, survives fetches
    #[serde(default)]
    pub local_inclusions: HashMap<PeerId, PeerGroupId>,
    /// Ordering index per circle; missing entries sort as 0
    #[serde(default)]
    pub index: HashMap<PeerGroupId, i32>,
}

impl Default for CirclesSettings {
    fn default() -> Self {
        Self {
            token: None,
            bot_peer_id: None,
            dev: false,
            group_names: HashMap::new(),
            remote_inclusions: HashMap::new(),
            local_inclusions: HashMap::new(),
            index: HashMap::new(),
        }
    }
}

impl CirclesSettings {
    /// Effective peer -> circle assignments: remote merged with local,
    /// local wins on conflict.
    pub fn inclusions(&self) -> HashMap<PeerId, PeerGroupId> {
        let mut merged = self.remote_inclusions.clone();
        for (peer, group) in &self.local_inclusions {
            merged.insert(*peer, *group);
        }
        merged
    }

    pub fn api_base_url(&self) -> &'static str {
        if self.dev {
            BASE_DEV_API_URL
        } else {
            BASE_API_URL
        }
    }

    pub fn bot_name(&self) -> &'static str {
        if self.dev {
            BOT_NAME_DEV
        } else {
            BOT_NAME
        }
    }

    /// Ordering index for a circle, 0 when the server sent none
    pub fn index_of(&self, group: PeerGroupId) -> i32 {
        self.index.get(&group).copied().unwrap_or(0)
    }

    /// Circle ids ordered by index, circle id as tiebreaker
    pub fn sorted_circle_ids(&self) -> Vec<PeerGroupId> {
        let mut ids: Vec<PeerGroupId> = self.group_names.keys().copied().collect();
        ids.sort_by_key(|id| (self.index_of(*id), id.0));
        ids
    }

    /// Peers currently assigned to the given circle
    pub fn peers_in_circle(&self, group: PeerGroupId) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .inclusions()
            .into_iter()
            .filter(|(_, g)| *g == group)
            .map(|(p, _)| p)
            .collect();
        peers.sort();
        peers
    }
}

/// One row of the circles listing exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct CircleSummary {
    pub id: PeerGroupId,
    pub name: String,
    pub index: i32,
    pub peer_count: usize,
}

/// Request type for updating circles settings; absent fields keep their
/// stored value (the update itself is a full-record replace-and-merge).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCirclesSettingsRequest {
    pub token: Option<String>,
    pub bot_peer_id: Option<PeerId>,
    pub dev: Option<bool>,
    pub local_inclusions: Option<HashMap<PeerId, PeerGroupId>>,
}
