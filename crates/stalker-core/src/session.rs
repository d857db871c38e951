//! Session handling: the `stb/handshake` action and token state

use tracing::info;

use crate::error::{Operation, Result, StalkerError};
use crate::portal::StalkerClient;
use crate::request::Action;
use crate::response::{decode_envelope, HandshakePayload};
use crate::types::Session;

impl StalkerClient {
    /// Current authentication state
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Drop the current token so the next operation performs a new handshake.
    ///
    /// Call this after an operation fails with
    /// [`StalkerError::is_unauthorized`]; the client never does it on its own.
    pub fn invalidate_session(&mut self) {
        self.session = Session::Unauthenticated;
    }

    /// Perform the handshake and store the returned bearer token.
    ///
    /// Sends the identity cookie and set-top box User-Agent, then reads
    /// `{"js":{"token":...}}`. Nothing is retried, and the stored session is
    /// only replaced on success.
    ///
    /// # Errors
    /// `StalkerError::Auth` wrapping the transport, status or decode failure.
    pub async fn authenticate(&mut self) -> Result<()> {
        let token = self
            .handshake()
            .await
            .map_err(|e| StalkerError::Auth(Box::new(e)))?;

        info!(portal = %self.config.portal_url, "Authenticated with portal");
        self.session = Session::Authenticated(token);
        Ok(())
    }

    /// Authenticate once if there is no token yet
    pub(crate) async fn ensure_authenticated(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            self.authenticate().await?;
        }
        Ok(())
    }

    async fn handshake(&self) -> Result<String> {
        let request = self.requests().build(Action::Handshake, None, false);
        let response = self.http.send(&request).await?;
        response.ensure_success()?;

        let payload: HandshakePayload =
            decode_envelope(Operation::Handshake, &response.into_decoded_body()?)?;
        if payload.token.is_empty() {
            return Err(StalkerError::decode(
                Operation::Handshake,
                "handshake returned an empty token",
            ));
        }
        Ok(payload.token)
    }
}
