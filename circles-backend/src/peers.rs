//! Peer and circle identifiers
//!
//! The host chat app addresses peers as (namespace, id) pairs; the Circles
//! service speaks bot-API signed integers. Users map to their positive id,
//! basic groups to the negated id, and channels to -(10^12 + id).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Channel ids live above this offset in the bot-API encoding
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

/// Namespace of a peer in the host chat application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeerNamespace {
    User,
    Group,
    Channel,
}

impl PeerNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Channel => "channel",
        }
    }
}

/// Identifier for a user, group, or channel in the host chat application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId {
    pub namespace: PeerNamespace,
    pub id: i64,
}

impl PeerId {
    pub fn user(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::User,
            id,
        }
    }

    pub fn group(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::Group,
            id,
        }
    }

    pub fn channel(id: i64) -> Self {
        Self {
            namespace: PeerNamespace::Channel,
            id,
        }
    }

    /// Decode a signed bot-API id into a namespaced peer. Only positive
    /// ids are users; zero falls into the group branch.
    pub fn from_bot_api(api_id: i64) -> Self {
        if api_id > 0 {
            Self::user(api_id)
        } else if -api_id < CHANNEL_ID_OFFSET {
            Self::group(-api_id)
        } else {
            Self::channel(-api_id - CHANNEL_ID_OFFSET)
        }
    }

    /// Encode this peer as a signed bot-API id
    pub fn to_bot_api(&self) -> i64 {
        match self.namespace {
            PeerNamespace::User => self.id,
            PeerNamespace::Group => -self.id,
            PeerNamespace::Channel => -(CHANNEL_ID_OFFSET + self.id),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.id)
    }
}

// Peers serialize as their bot-API integer so peer-keyed maps stay plain
// JSON objects and the wire payloads need no conversion layer.
impl Serialize for PeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_bot_api())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let api_id = i64::deserialize(deserializer)?;
        Ok(PeerId::from_bot_api(api_id))
    }
}

/// Identifier of a circle (chat-list group) assignment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerGroupId(pub i32);

impl fmt::Display for PeerGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_bot_api_roundtrip() {
        let cases = [
            PeerId::user(137145876),
            PeerId::group(4123),
            PeerId::channel(1289),
            PeerId::group(0),
        ];
        for peer in cases {
            assert_eq!(PeerId::from_bot_api(peer.to_bot_api()), peer);
        }
    }

    #[test]
    fn test_zero_decodes_as_group() {
        assert_eq!(PeerId::from_bot_api(0), PeerId::group(0));
    }

    #[test]
    fn test_bot_api_encoding() {
        assert_eq!(PeerId::user(42).to_bot_api(), 42);
        assert_eq!(PeerId::group(42).to_bot_api(), -42);
        assert_eq!(PeerId::channel(42).to_bot_api(), -1_000_000_000_042);
    }

    #[test]
    fn test_bot_api_decoding_boundary() {
        // Just below the channel offset decodes as a group
        assert_eq!(
            PeerId::from_bot_api(-(CHANNEL_ID_OFFSET - 1)),
            PeerId::group(CHANNEL_ID_OFFSET - 1)
        );
        // At the offset it is channel 0
        assert_eq!(PeerId::from_bot_api(-CHANNEL_ID_OFFSET), PeerId::channel(0));
    }

    #[test]
    fn test_peer_keyed_map_serializes_as_json_object() {
        let mut map: HashMap<PeerId, PeerGroupId> = HashMap::new();
        map.insert(PeerId::group(77), PeerGroupId(3));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"-77":3}"#);

        let back: HashMap<PeerId, PeerGroupId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&PeerId::group(77)), Some(&PeerGroupId(3)));
    }
}
