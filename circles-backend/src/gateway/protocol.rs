use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types for sync notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Sync lifecycle
    SyncStarted,
    SyncCompleted,
    CirclesUpdated,
    // Token intake
    TokenReceived,
    // Failure notifications
    ConnectionError,
    AuthError,
    ServerError,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyncStarted => "sync.started",
            Self::SyncCompleted => "sync.completed",
            Self::CirclesUpdated => "circles.updated",
            Self::TokenReceived => "token.received",
            Self::ConnectionError => "connection.error",
            Self::AuthError => "auth.error",
            Self::ServerError => "server.error",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server-push notification to all subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirclesEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub event: String,
    pub data: Value,
}

impl CirclesEvent {
    pub fn new(event: EventType, data: Value) -> Self {
        Self {
            type_: "event".to_string(),
            event: event.as_str().to_string(),
            data,
        }
    }

    pub fn sync_started(sync_id: &str) -> Self {
        Self::new(
            EventType::SyncStarted,
            serde_json::json!({
                "sync_id": sync_id,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
    }

    pub fn sync_completed(sync_id: &str, circle_count: usize, inclusion_count: usize) -> Self {
        Self::new(
            EventType::SyncCompleted,
            serde_json::json!({
                "sync_id": sync_id,
                "circle_count": circle_count,
                "inclusion_count": inclusion_count,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
    }

    pub fn circles_updated(circle_count: usize) -> Self {
        Self::new(
            EventType::CirclesUpdated,
            serde_json::json!({
                "circle_count": circle_count
            }),
        )
    }

    pub fn token_received() -> Self {
        Self::new(
            EventType::TokenReceived,
            serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
    }

    pub fn connection_error(operation: &str, detail: &str) -> Self {
        Self::new(
            EventType::ConnectionError,
            serde_json::json!({
                "operation": operation,
                "detail": detail
            }),
        )
    }

    pub fn auth_error(operation: &str, status: u16) -> Self {
        Self::new(
            EventType::AuthError,
            serde_json::json!({
                "operation": operation,
                "status": status
            }),
        )
    }

    pub fn server_error(operation: &str, detail: &str) -> Self {
        Self::new(
            EventType::ServerError,
            serde_json::json!({
                "operation": operation,
                "detail": detail
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(EventType::SyncStarted.as_str(), "sync.started");
        assert_eq!(EventType::AuthError.as_str(), "auth.error");
    }

    #[test]
    fn test_event_shape() {
        let event = CirclesEvent::auth_error("fetch", 401);
        assert_eq!(event.type_, "event");
        assert_eq!(event.event, "auth.error");
        assert_eq!(event.data["operation"], "fetch");
        assert_eq!(event.data["status"], 401);
    }
}
