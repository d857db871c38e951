//! Programme guide: `get_epg` and timezone handling
//!
//! Timestamps are UNIX seconds as sent by the portal. They are read as
//! instants in the configured zone and re-expressed in that same zone, which
//! leaves the value unchanged. The portal's own zone is not tracked
//! separately from the viewer's, so no real conversion happens here.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{Operation, Result, StalkerError};
use crate::portal::StalkerClient;
use crate::request::Action;
use crate::response::{decode_envelope, EpgPayload};
use crate::types::ProgramEntry;

/// Resolve an IANA timezone identifier such as `Europe/Prague`.
///
/// Shared by EPG normalization and XMLTV conversion so both agree on the
/// zone.
///
/// # Examples
/// ```
/// use stalker_core::epg::resolve_timezone;
///
/// assert!(resolve_timezone("America/New_York").is_ok());
/// assert!(resolve_timezone("Mars/Olympus").is_err());
/// ```
pub fn resolve_timezone(zone: &str) -> Result<Tz> {
    zone.trim()
        .parse::<Tz>()
        .map_err(|_| StalkerError::Timezone {
            zone: zone.to_string(),
        })
}

/// Instant for a UNIX timestamp, expressed in `tz`
pub(crate) fn local_instant(tz: Tz, epoch: i64, operation: Operation) -> Result<DateTime<Tz>> {
    tz.timestamp_opt(epoch, 0)
        .single()
        .ok_or_else(|| StalkerError::decode(operation, format!("timestamp {} out of range", epoch)))
}

fn normalize(tz: Tz, mut program: ProgramEntry) -> Result<ProgramEntry> {
    program.start = local_instant(tz, program.start, Operation::GetEpg)?.timestamp();
    program.stop = local_instant(tz, program.stop, Operation::GetEpg)?.timestamp();
    Ok(program)
}

impl StalkerClient {
    /// Fetch the programme guide for one channel.
    ///
    /// Authenticates first if needed. Entries come back in server order with
    /// no sorting or deduplication.
    ///
    /// # Errors
    /// * `StalkerError::Auth` if the implicit handshake fails
    /// * `StalkerError::Transport` / `Status` / `Unauthorized` / `Decode`
    ///   tagged with [`Operation::GetEpg`]
    /// * `StalkerError::Timezone` if the configured zone is unknown
    pub async fn get_epg(&mut self, channel_id: &str) -> Result<Vec<ProgramEntry>> {
        let tz = resolve_timezone(&self.config.timezone)?;
        self.ensure_authenticated().await?;

        let response = self.execute(Action::GetEpg { channel_id }, false).await?;
        response.ensure_success()?;

        let payload: EpgPayload = decode_envelope(Operation::GetEpg, &response.into_decoded_body()?)?;

        let programs = payload
            .programs
            .into_iter()
            .map(|program| normalize(tz, program))
            .collect::<Result<Vec<_>>>()?;

        debug!(channel_id, count = programs.len(), "Fetched EPG");
        Ok(programs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::test_support::{authenticated_client, client_for};
    use crate::request::LOAD_PATH;
    use serde_json::json;
    use wiremock::matchers::{any, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn programs_body() -> serde_json::Value {
        json!({"js": {"programs": [
            {"ch_id": "5", "name": "Late Show", "start_timestamp": 1700003600,
             "stop_timestamp": 1700007200, "descr": "", "category": "Talk"},
            {"ch_id": "5", "name": "News", "start_timestamp": 1700000000,
             "stop_timestamp": 1700003600, "descr": "Headlines", "category": "News"}
        ]}})
    }

    async fn mount_epg(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(LOAD_PATH))
            .and(query_param("action", "get_epg"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(resolve_timezone("UTC").unwrap(), chrono_tz::UTC);
        assert_eq!(
            resolve_timezone("America/New_York").unwrap(),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn test_resolve_timezone_unknown() {
        match resolve_timezone("Europe/Atlantis") {
            Err(StalkerError::Timezone { zone }) => assert_eq!(zone, "Europe/Atlantis"),
            other => panic!("Expected Timezone error, got {:?}", other),
        }
        assert!(resolve_timezone("").is_err());
    }

    #[test]
    fn test_normalize_keeps_instant() {
        let program = ProgramEntry {
            channel_id: "1".to_string(),
            title: "t".to_string(),
            start: 1_700_000_000,
            stop: 1_700_003_600,
            description: String::new(),
            category: String::new(),
        };
        let normalized = normalize(chrono_tz::Asia::Tokyo, program.clone()).unwrap();
        assert_eq!(normalized, program);
    }

    #[test]
    fn test_local_instant_out_of_range() {
        let result = local_instant(chrono_tz::UTC, i64::MAX, Operation::GetEpg);
        assert!(matches!(result, Err(StalkerError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_get_epg_preserves_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LOAD_PATH))
            .and(query_param("type", "itv"))
            .and(query_param("action", "get_epg"))
            .and(query_param("ch_id", "5"))
            .and(header("Authorization", "Bearer TOKEN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(programs_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = authenticated_client(&server, "America/New_York");
        let programs = client.get_epg("5").await.unwrap();

        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].title, "Late Show");
        assert_eq!(programs[0].start, 1_700_003_600);
        assert_eq!(programs[1].title, "News");
        assert_eq!(programs[1].description, "Headlines");
    }

    #[tokio::test]
    async fn test_get_epg_empty() {
        let server = MockServer::start().await;
        mount_epg(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"js": {"programs": []}})),
        )
        .await;

        let mut client = authenticated_client(&server, "UTC");
        assert!(client.get_epg("5").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_epg_unknown_timezone_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(programs_body()))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = client_for(&server, "Nowhere/Special");
        assert!(matches!(
            client.get_epg("5").await,
            Err(StalkerError::Timezone { .. })
        ));
        assert!(!client.is_authenticated());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_epg_decode_error() {
        let server = MockServer::start().await;
        mount_epg(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"js": {"programs": "none"}})),
        )
        .await;

        let mut client = authenticated_client(&server, "UTC");
        match client.get_epg("5").await {
            Err(StalkerError::Decode { operation, .. }) => assert_eq!(operation, Operation::GetEpg),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_epg_authenticates_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LOAD_PATH))
            .and(query_param("action", "handshake"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"js": {"token": "E"}})))
            .expect(1)
            .mount(&server)
            .await;
        mount_epg(&server, ResponseTemplate::new(200).set_body_json(programs_body())).await;

        let mut client = client_for(&server, "UTC");
        client.get_epg("5").await.unwrap();
        assert_eq!(client.session().token(), Some("E"));
    }
}
