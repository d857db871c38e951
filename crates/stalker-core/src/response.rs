//! Wire envelopes returned by `load.php`
//!
//! Every action answers `{"js": <payload>}`. Portals disagree on whether ids
//! and timestamps are JSON strings or numbers, so the field helpers here
//! accept both.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{Operation, Result, StalkerError};
use crate::types::{ChannelRecord, ProgramEntry};

/// Longest body excerpt written to debug logs on decode failure
const LOGGED_BODY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub js: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HandshakePayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsPayload {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub channels: Vec<ChannelRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateLinkPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cmd: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpgPayload {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub programs: Vec<ProgramEntry>,
}

/// Decode `{"js": T}` and return the payload
pub(crate) fn decode_envelope<T: DeserializeOwned>(operation: Operation, body: &[u8]) -> Result<T> {
    serde_json::from_slice::<Envelope<T>>(body)
        .map(|envelope| envelope.js)
        .map_err(|e| {
            let text = String::from_utf8_lossy(body);
            let excerpt: String = text.chars().take(LOGGED_BODY_CHARS).collect();
            debug!(%operation, body = %excerpt, "Undecodable portal response");
            StalkerError::decode(operation, e.to_string())
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Accept a string, number, bool or null and produce a `String` (null becomes empty)
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Int(n)) => n.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        Some(Scalar::Bool(b)) => b.to_string(),
    })
}

/// Accept an integer or a numeric string (null becomes 0)
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Scalar::Int(n)) => Ok(n),
        Some(Scalar::Float(f)) if f.is_finite() => Ok(f.trunc() as i64),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid timestamp {:?}", s))),
        Some(_) => Err(D::Error::custom("expected a UNIX timestamp")),
    }
}

/// A JSON array, with `null` read as empty
fn nullable_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_handshake() {
        let body = br#"{"js":{"token":"8F0E3A"}}"#;
        let payload: HandshakePayload = decode_envelope(Operation::Handshake, body).unwrap();
        assert_eq!(payload.token, "8F0E3A");
    }

    #[test]
    fn test_decode_channels_verbatim() {
        let body =
            br#"{"js":{"channels":[{"id":"1","name":"A","cmd":"http://x","logo":"/l.png"}]}}"#;
        let payload: ChannelsPayload = decode_envelope(Operation::GetChannels, body).unwrap();
        assert_eq!(
            payload.channels,
            vec![ChannelRecord {
                id: "1".to_string(),
                name: "A".to_string(),
                cmd: "http://x".to_string(),
                logo: "/l.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_decode_channels_empty_and_missing() {
        let payload: ChannelsPayload =
            decode_envelope(Operation::GetChannels, br#"{"js":{"channels":[]}}"#).unwrap();
        assert!(payload.channels.is_empty());

        let payload: ChannelsPayload =
            decode_envelope(Operation::GetChannels, br#"{"js":{}}"#).unwrap();
        assert!(payload.channels.is_empty());
    }

    #[test]
    fn test_decode_null_lists() {
        let payload: ChannelsPayload =
            decode_envelope(Operation::GetChannels, br#"{"js":{"channels":null}}"#).unwrap();
        assert!(payload.channels.is_empty());

        let payload: EpgPayload =
            decode_envelope(Operation::GetEpg, br#"{"js":{"programs":null}}"#).unwrap();
        assert!(payload.programs.is_empty());
    }

    #[test]
    fn test_decode_channels_keeps_record_without_id() {
        let body = br#"{"js":{"channels":[{"id":"1","name":"A"},{"name":"B"}]}}"#;
        let payload: ChannelsPayload = decode_envelope(Operation::GetChannels, body).unwrap();
        assert_eq!(payload.channels.len(), 2);
        assert_eq!(payload.channels[0].id, "1");
        assert!(payload.channels[1].id.is_empty());
        assert_eq!(payload.channels[1].name, "B");
    }

    #[test]
    fn test_decode_programs_without_timestamps() {
        let body = br#"{"js":{"programs":[{"ch_id":"1","name":"News"},{"ch_id":"1","name":"Late","start_timestamp":10,"stop_timestamp":20}]}}"#;
        let payload: EpgPayload = decode_envelope(Operation::GetEpg, body).unwrap();
        assert_eq!(payload.programs.len(), 2);
        assert_eq!((payload.programs[0].start, payload.programs[0].stop), (0, 0));
        assert_eq!((payload.programs[1].start, payload.programs[1].stop), (10, 20));
    }

    #[test]
    fn test_decode_missing_envelope() {
        let result: Result<ChannelsPayload> =
            decode_envelope(Operation::GetChannels, br#"{"channels":[]}"#);
        match result {
            Err(StalkerError::Decode { operation, .. }) => {
                assert_eq!(operation, Operation::GetChannels)
            }
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_not_json() {
        let result: Result<CreateLinkPayload> =
            decode_envelope(Operation::CreateLink, b"<html>Forbidden</html>");
        assert!(matches!(result, Err(StalkerError::Decode { .. })));
    }

    #[test]
    fn test_decode_null_cmd() {
        let payload: CreateLinkPayload =
            decode_envelope(Operation::CreateLink, br#"{"js":{"cmd":null}}"#).unwrap();
        assert!(payload.cmd.is_empty());
    }

    #[test]
    fn test_lenient_timestamp_rejects_garbage() {
        let body = br#"{"js":{"programs":[{"ch_id":"1","start_timestamp":"soon","stop_timestamp":1}]}}"#;
        let result: Result<EpgPayload> = decode_envelope(Operation::GetEpg, body);
        assert!(matches!(result, Err(StalkerError::Decode { .. })));
    }
}
