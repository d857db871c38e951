//! Data types for the Stalker portal client
//!
//! Channel and programme records deserialize straight from the portal's
//! JSON payloads; everything here also serializes back to JSON.

use serde::{Deserialize, Serialize};

use crate::response::{lenient_i64, lenient_string};

/// Authentication state of a client.
///
/// A token is never refreshed on its own. A token can go stale on the
/// server while still being held here, so callers that see
/// [`StalkerError::is_unauthorized`](crate::StalkerError::is_unauthorized)
/// must reset the session explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// No handshake has succeeded yet, or the session was invalidated
    #[default]
    Unauthenticated,
    /// Bearer token from the last successful handshake
    Authenticated(String),
}

impl Session {
    /// Bearer token, if authenticated
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Authenticated(token) => Some(token),
            Session::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// Server quirks discovered by probing.
///
/// Both flags default to `false`. The values are best-effort guesses with no
/// confidence attached; see [`StalkerClient::probe`](crate::StalkerClient::probe).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Server compresses `get_all_channels` when asked to
    pub supports_gzip: bool,
    /// Channel commands must go through `create_link` before playback
    pub requires_link_indirection: bool,
}

/// A live channel as listed by `get_all_channels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Portal channel id
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Stream URL, or an opaque command needing `create_link`
    #[serde(default, deserialize_with = "lenient_string")]
    pub cmd: String,
    /// Logo path (usually relative to the portal) or absolute URL
    #[serde(default, deserialize_with = "lenient_string")]
    pub logo: String,
}

/// One EPG programme entry as delivered by `get_epg`.
///
/// `start < stop` is expected but not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    #[serde(rename = "ch_id", default, deserialize_with = "lenient_string")]
    pub channel_id: String,
    #[serde(rename = "name", default, deserialize_with = "lenient_string")]
    pub title: String,
    /// UNIX seconds, 0 when the portal omits it
    #[serde(rename = "start_timestamp", default, deserialize_with = "lenient_i64")]
    pub start: i64,
    /// UNIX seconds, 0 when the portal omits it
    #[serde(rename = "stop_timestamp", default, deserialize_with = "lenient_i64")]
    pub stop: i64,
    #[serde(rename = "descr", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_default_is_unauthenticated() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_session_token() {
        let session = Session::Authenticated("ABC123".to_string());
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("ABC123"));
    }

    #[test]
    fn test_server_profile_default() {
        let profile = ServerProfile::default();
        assert!(!profile.supports_gzip);
        assert!(!profile.requires_link_indirection);
    }

    #[test]
    fn test_channel_record_numeric_id() {
        let json = r#"{"id":42,"name":"News","cmd":"ffrt http://s/42","logo":""}"#;
        let channel: ChannelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(channel.id, "42");
        assert_eq!(channel.cmd, "ffrt http://s/42");
    }

    #[test]
    fn test_channel_record_missing_optional_fields() {
        let channel: ChannelRecord = serde_json::from_str(r#"{"id":"7"}"#).unwrap();
        assert_eq!(channel.id, "7");
        assert!(channel.name.is_empty());
        assert!(channel.cmd.is_empty());
        assert!(channel.logo.is_empty());
    }

    #[test]
    fn test_program_entry_wire_names() {
        let json = r#"{
            "ch_id": "9",
            "name": "Evening News",
            "start_timestamp": 1700000000,
            "stop_timestamp": "1700003600",
            "descr": "Headlines",
            "category": "News"
        }"#;
        let program: ProgramEntry = serde_json::from_str(json).unwrap();
        assert_eq!(program.channel_id, "9");
        assert_eq!(program.title, "Evening News");
        assert_eq!(program.start, 1_700_000_000);
        assert_eq!(program.stop, 1_700_003_600);
        assert_eq!(program.description, "Headlines");
        assert_eq!(program.category, "News");
    }

    #[test]
    fn test_channel_record_missing_id() {
        let channel: ChannelRecord = serde_json::from_str(r#"{"name":"B"}"#).unwrap();
        assert!(channel.id.is_empty());
        assert_eq!(channel.name, "B");
    }

    #[test]
    fn test_program_entry_missing_timestamps_are_zero() {
        let program: ProgramEntry =
            serde_json::from_str(r#"{"ch_id":"1","name":"x","stop_timestamp":null}"#).unwrap();
        assert_eq!(program.start, 0);
        assert_eq!(program.stop, 0);
        assert_eq!(program.title, "x");
    }
}
