//! Auth token intake from bot messages
//!
//! The admin bot delivers the API token as a bare message after the
//! `/start api` handshake. A token message is the entire text matching the
//! token alphabet at 100+ characters, sent by the configured bot peer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::host::HostMessage;
use crate::models::CirclesSettings;

/// Handshake command whose messages get purged along with the token
pub const START_API_COMMAND: &str = "/start api";

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z._-]{100,}$").unwrap());

/// Extract an auth token from a message, if it is one
pub fn extract_token<'a>(
    settings: &CirclesSettings,
    message: &'a HostMessage,
) -> Option<&'a str> {
    let bot = settings.bot_peer_id?;
    if message.from != Some(bot) {
        return None;
    }
    if TOKEN_PATTERN.is_match(&message.text) {
        Some(&message.text)
    } else {
        None
    }
}

/// Whether the message is part of the token handshake and should be purged
pub fn is_purgeable(settings: &CirclesSettings, message: &HostMessage) -> bool {
    message.text == START_API_COMMAND || extract_token(settings, message).is_some()
}
