//! Main Stalker portal API
//!
//! [`StalkerClient`] owns the portal identity, the session token and the
//! probed [`ServerProfile`]. Operations live in their own modules:
//! - `session`: handshake and token state
//! - `probe`: capability detection
//! - `catalog`: channel list and playback links
//! - `epg`: programme guide
//! - `logo`: logo download
//!
//! A client instance is not internally synchronized. Mutating operations take
//! `&mut self`; share an instance behind a `tokio::sync::Mutex` if needed.

use crate::client::{ClientConfig, PortalClient, PortalResponse};
use crate::error::{Result, StalkerError};
use crate::request::{Action, RequestBuilder};
use crate::types::{ServerProfile, Session};

/// Client for a single Stalker portal and device identity
///
/// # Example
/// ```no_run
/// use stalker_core::{ClientConfig, StalkerClient};
///
/// # async fn example() -> Result<(), stalker_core::StalkerError> {
/// let config = ClientConfig::new("http://portal.example.com", "00:1A:79:12:34:56", "Europe/Prague");
/// let mut client = StalkerClient::new(config)?;
/// client.probe().await;
///
/// for channel in client.get_channels().await? {
///     let url = client.resolve_playback_url(&channel.cmd).await?;
///     println!("{} -> {}", channel.name, url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct StalkerClient {
    pub(crate) config: ClientConfig,
    pub(crate) http: PortalClient,
    pub(crate) session: Session,
    pub(crate) profile: ServerProfile,
}

impl StalkerClient {
    /// Create an unauthenticated client with an all-false server profile.
    ///
    /// # Errors
    /// * `StalkerError::Config` if the portal URL or MAC is empty
    /// * `StalkerError::InvalidUrl` if the portal URL cannot be parsed
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        let portal_url = config.portal_url.trim().trim_end_matches('/').to_string();
        if portal_url.is_empty() {
            return Err(StalkerError::Config("portal URL cannot be empty".to_string()));
        }
        url::Url::parse(&portal_url)
            .map_err(|e| StalkerError::InvalidUrl(format!("{}: {}", portal_url, e)))?;
        if config.mac.trim().is_empty() {
            return Err(StalkerError::Config("MAC address cannot be empty".to_string()));
        }
        config.portal_url = portal_url;

        let http = PortalClient::new(&config)?;
        Ok(Self {
            config,
            http,
            session: Session::Unauthenticated,
            profile: ServerProfile::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Capabilities found by the last [`probe`](Self::probe)
    pub fn server_profile(&self) -> ServerProfile {
        self.profile
    }

    /// Override the probed capabilities, e.g. with values cached by the caller
    pub fn set_server_profile(&mut self, profile: ServerProfile) {
        self.profile = profile;
    }

    pub(crate) fn requests(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(
            &self.config.portal_url,
            &self.config.mac,
            &self.config.timezone,
            &self.config.user_agent,
        )
    }

    /// Build and send `action` with the current token, without status checks
    pub(crate) async fn execute(&self, action: Action<'_>, accept_gzip: bool) -> Result<PortalResponse> {
        let request = self
            .requests()
            .build(action, self.session.token(), accept_gzip);
        self.http.send(&request).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StalkerClient::new(ClientConfig::new(
            "http://portal.example.com/",
            "00:1A:79:00:00:01",
            "UTC",
        ))
        .unwrap();
        assert_eq!(client.config().portal_url, "http://portal.example.com");
        assert_eq!(client.session(), &Session::Unauthenticated);
        assert_eq!(client.server_profile(), ServerProfile::default());
    }

    #[test]
    fn test_empty_portal_url() {
        let result = StalkerClient::new(ClientConfig::new("  ", "00:1A:79:00:00:01", "UTC"));
        match result {
            Err(StalkerError::Config(msg)) => assert!(msg.contains("portal URL")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_unparseable_portal_url() {
        let result = StalkerClient::new(ClientConfig::new("not a url", "00:1A:79:00:00:01", "UTC"));
        assert!(matches!(result, Err(StalkerError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_mac() {
        let result = StalkerClient::new(ClientConfig::new("http://p.example", "", "UTC"));
        match result {
            Err(StalkerError::Config(msg)) => assert!(msg.contains("MAC")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_set_server_profile() {
        let mut client =
            StalkerClient::new(ClientConfig::new("http://p.example", "m", "UTC")).unwrap();
        let profile = ServerProfile {
            supports_gzip: true,
            requires_link_indirection: false,
        };
        client.set_server_profile(profile);
        assert_eq!(client.server_profile(), profile);
    }
}
