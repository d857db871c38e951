//! Server capability probing
//!
//! The protocol has no capability negotiation, so two trial requests are
//! used to guess how a portal behaves:
//!
//! - **gzip**: ask for the channel list with `gzip=true` and
//!   `Accept-Encoding: gzip`; the server supports it iff the response
//!   comes back with `Content-Encoding: gzip`.
//! - **link indirection**: send `create_link` with a placeholder command; a
//!   200 with a non-empty `cmd` means every channel command is assumed to
//!   need `create_link`.
//!
//! The indirection check is an approximation. A portal that answers any
//! input with a non-empty command is flagged even if only some channel types
//! need it, and a portal that errors gracefully on bad input can be a false
//! positive. Probe requests that fail in transport leave the previous flag
//! untouched and are only logged at debug level.

use tracing::debug;

use crate::error::Operation;
use crate::portal::StalkerClient;
use crate::request::Action;
use crate::response::{decode_envelope, CreateLinkPayload};
use crate::types::ServerProfile;

/// Placeholder command sent by the indirection probe
pub const PROBE_COMMAND: &str = "test_channel";

impl StalkerClient {
    /// Probe the portal and update the stored [`ServerProfile`].
    ///
    /// Never fails. Each flag is re-derived from its trial response,
    /// overwriting the previous value; a flag whose trial request could not
    /// be completed keeps its previous value (initially `false`). Calling this
    /// repeatedly against an unchanged server yields the same profile.
    ///
    /// The bearer token is attached if the client is already authenticated,
    /// but probing never triggers a handshake.
    pub async fn probe(&mut self) -> ServerProfile {
        if let Some(supports_gzip) = self.probe_gzip().await {
            self.profile.supports_gzip = supports_gzip;
        }
        if let Some(requires_link_indirection) = self.probe_link_indirection().await {
            self.profile.requires_link_indirection = requires_link_indirection;
        }

        debug!(
            supports_gzip = self.profile.supports_gzip,
            requires_link_indirection = self.profile.requires_link_indirection,
            "Server probe finished"
        );
        self.profile
    }

    async fn probe_gzip(&self) -> Option<bool> {
        match self.execute(Action::GetAllChannels { gzip: true }, true).await {
            Ok(response) => Some(response.is_gzip()),
            Err(e) => {
                debug!(error = %e, "gzip probe request failed, keeping previous value");
                None
            }
        }
    }

    async fn probe_link_indirection(&self) -> Option<bool> {
        let action = Action::CreateLink { cmd: PROBE_COMMAND };
        let response = match self.execute(action, false).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "create_link probe request failed, keeping previous value");
                return None;
            }
        };

        if response.status != 200 {
            debug!(status = response.status, "create_link probe rejected");
            return Some(false);
        }

        let payload = response
            .into_decoded_body()
            .and_then(|body| decode_envelope::<CreateLinkPayload>(Operation::CreateLink, &body));
        match payload {
            Ok(payload) => Some(!payload.cmd.is_empty()),
            Err(e) => {
                debug!(error = %e, "create_link probe returned no usable command");
                Some(false)
            }
        }
    }
}
