//! Channel catalog: `get_all_channels` and `create_link`

use tracing::debug;

use crate::error::{Operation, Result, StalkerError};
use crate::portal::StalkerClient;
use crate::request::Action;
use crate::response::{decode_envelope, ChannelsPayload, CreateLinkPayload};
use crate::types::ChannelRecord;

impl StalkerClient {
    /// Fetch every live channel.
    ///
    /// Authenticates first if needed. Gzip is requested only when the probed
    /// profile says the server supports it, but a gzip body is inflated
    /// whenever the response header announces one. An empty list is not an
    /// error.
    ///
    /// # Errors
    /// * `StalkerError::Auth` if the implicit handshake fails
    /// * `StalkerError::Transport` / `Status` / `Unauthorized` / `Decode`
    ///   tagged with [`Operation::GetChannels`]
    pub async fn get_channels(&mut self) -> Result<Vec<ChannelRecord>> {
        self.ensure_authenticated().await?;

        let gzip = self.profile.supports_gzip;
        let response = self.execute(Action::GetAllChannels { gzip }, gzip).await?;
        response.ensure_success()?;

        let payload: ChannelsPayload =
            decode_envelope(Operation::GetChannels, &response.into_decoded_body()?)?;
        debug!(count = payload.channels.len(), "Fetched channel list");
        Ok(payload.channels)
    }

    /// Turn a channel command into a playable URL.
    ///
    /// Without link indirection the command is already a URL and is returned
    /// unchanged with no network call. Otherwise a `create_link` request is
    /// made (authenticating first if needed) and its `cmd` is returned.
    ///
    /// # Errors
    /// * `StalkerError::Auth` if the implicit handshake fails
    /// * `StalkerError::Transport` / `Status` / `Unauthorized` / `Decode`
    ///   tagged with [`Operation::CreateLink`]; an empty resolved command is
    ///   a decode failure
    pub async fn resolve_playback_url(&mut self, cmd: &str) -> Result<String> {
        if !self.profile.requires_link_indirection {
            return Ok(cmd.to_string());
        }

        self.ensure_authenticated().await?;

        let response = self.execute(Action::CreateLink { cmd }, false).await?;
        response.ensure_success()?;

        let payload: CreateLinkPayload =
            decode_envelope(Operation::CreateLink, &response.into_decoded_body()?)?;
        if payload.cmd.is_empty() {
            return Err(StalkerError::decode(
                Operation::CreateLink,
                "create_link returned an empty command",
            ));
        }
        Ok(payload.cmd)
    }
}
