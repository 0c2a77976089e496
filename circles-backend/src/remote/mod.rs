//! Circles HTTP API client
//!
//! Bearer-token calls against the configured base URL, path `tgfork`:
//! GET returns the circle document, POST uploads collected chat members.
//! Errors are classified so the sync layer can broadcast the right
//! notification before swallowing them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::peers::{PeerGroupId, PeerId};

/// Path of the sync endpoint under the API base URL
const SYNC_PATH: &str = "tgfork";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Classified failure of a Circles API call
#[derive(Debug)]
pub enum ApiError {
    /// Could not reach the service (DNS, TCP, TLS, timeout)
    Connection(String),
    /// The service rejected the token (401/403)
    Auth(u16),
    /// The service failed (5xx or other non-success status)
    Server(u16),
    /// Response body did not decode
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(detail) => write!(f, "connection failed: {}", detail),
            Self::Auth(status) => write!(f, "authorization rejected (status {})", status),
            Self::Server(status) => write!(f, "server error (status {})", status),
            Self::Decode(detail) => write!(f, "malformed response: {}", detail),
        }
    }
}

impl ApiError {
    fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth(status),
            other => Self::Server(other),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Wire shape of the fetched circle document. Entries stay raw JSON so a
/// single malformed circle drops out instead of failing the whole fetch.
#[derive(Debug, Deserialize)]
struct CirclesDocument {
    #[serde(default)]
    circles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CircleEntry {
    id: i32,
    name: String,
    #[serde(default)]
    peers: Vec<i64>,
    #[serde(default)]
    members: Vec<i64>,
}

/// One fetched circle with its peers decoded and its document position
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCircle {
    pub id: PeerGroupId,
    pub name: String,
    pub peers: Vec<PeerId>,
    pub index: usize,
}

/// Member list of one chat, as uploaded to the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub chat: PeerId,
    pub members: Vec<PeerId>,
}

/// Collected member lists of one circle, as uploaded to the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedCircle {
    pub circle: PeerGroupId,
    pub connections: Vec<Connection>,
}

/// Client for one token/base-URL pair; cheap to construct per call
pub struct CirclesApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl CirclesApi {
    pub fn new(base_url: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }

    fn sync_url(&self) -> String {
        match url::Url::parse(&self.base_url).and_then(|base| base.join(SYNC_PATH)) {
            Ok(joined) => joined.to_string(),
            Err(_) => format!("{}{}", self.base_url, SYNC_PATH),
        }
    }

    /// Fetch the circle document
    pub async fn fetch_circles(&self) -> Result<Vec<ApiCircle>, ApiError> {
        let response = self
            .client
            .get(self.sync_url())
            .header("Authorization", &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }

        let document: CirclesDocument = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(decode_document(document))
    }

    /// Upload collected per-circle chat member lists
    pub async fn send_members(&self, payload: &[CollectedCircle]) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.sync_url())
            .header("Authorization", &self.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }
        Ok(())
    }
}

/// Decode the wire document: `peers` and `members` concatenate into one
/// peer list, document position becomes the ordering index.
fn decode_document(document: CirclesDocument) -> Vec<ApiCircle> {
    document
        .circles
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let entry: CircleEntry = serde_json::from_value(value).ok()?;
            Some(ApiCircle {
                id: PeerGroupId(entry.id),
                name: entry.name,
                peers: entry
                    .peers
                    .iter()
                    .chain(entry.members.iter())
                    .map(|api_id| PeerId::from_bot_api(*api_id))
                    .collect(),
                index,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_document() {
        let document: CirclesDocument = serde_json::from_str(
            r#"{"circles": [
                {"id": 2, "name": "Work", "peers": [10, -20], "members": [-1000000000005]},
                {"id": 7, "name": "Family", "peers": [], "members": [11]}
            ]}"#,
        )
        .unwrap();

        let circles = decode_document(document);
        assert_eq!(circles.len(), 2);

        assert_eq!(circles[0].id, PeerGroupId(2));
        assert_eq!(circles[0].index, 0);
        assert_eq!(
            circles[0].peers,
            vec![PeerId::user(10), PeerId::group(20), PeerId::channel(5)]
        );

        assert_eq!(circles[1].id, PeerGroupId(7));
        assert_eq!(circles[1].index, 1);
        assert_eq!(circles[1].peers, vec![PeerId::user(11)]);
    }

    #[test]
    fn test_decode_empty_document() {
        let document: CirclesDocument = serde_json::from_str("{}").unwrap();
        assert!(decode_document(document).is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let document: CirclesDocument = serde_json::from_str(
            r#"{"circles": [
                {"id": 1, "peers": [10]},
                {"id": 2, "name": "Ok", "peers": [], "members": []}
            ]}"#,
        )
        .unwrap();

        let circles = decode_document(document);
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].id, PeerGroupId(2));
        // Document position is preserved even when earlier entries drop out
        assert_eq!(circles[0].index, 1);
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = vec![CollectedCircle {
            circle: PeerGroupId(3),
            connections: vec![Connection {
                chat: PeerId::group(40),
                members: vec![PeerId::user(1), PeerId::user(2)],
            }],
        }];

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"circle": 3, "connections": [{"chat": -40, "members": [1, 2]}]}
            ])
        );
    }

    #[test]
    fn test_sync_url_joins_base() {
        let api = CirclesApi::new("https://api.circles.is/", "t");
        assert_eq!(api.sync_url(), "https://api.circles.is/tgfork");
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(ApiError::from_status(401), ApiError::Auth(401)));
        assert!(matches!(ApiError::from_status(403), ApiError::Auth(403)));
        assert!(matches!(ApiError::from_status(500), ApiError::Server(500)));
        assert!(matches!(ApiError::from_status(404), ApiError::Server(404)));
    }
}
