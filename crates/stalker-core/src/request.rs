//! Request construction for the portal's `load.php` endpoint
//!
//! Pure string assembly: turns an [`Action`] plus session identity into a URL
//! and header list. Nothing here touches the network.

use crate::error::Operation;

/// Path of the single API endpoint under the portal base
pub const LOAD_PATH: &str = "/stalker_portal/server/load.php";

/// User-Agent of the MAG set-top box firmware; portals check for it
pub const STB_USER_AGENT: &str = "Mozilla/5.0 (QtEmbedded; U; Linux; C)";

/// Every action asks for the XML-flavoured JSON wrapper
const JS_HTTP_REQUEST: &str = "1-xml";

/// Language sent in the identity cookie
const STB_LANG: &str = "en";

/// A portal action and its action-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Handshake,
    GetAllChannels {
        /// Add the advisory `gzip=true` parameter
        gzip: bool,
    },
    CreateLink {
        cmd: &'a str,
    },
    GetEpg {
        channel_id: &'a str,
    },
}

impl Action<'_> {
    /// Operation reported in errors and logs
    pub fn operation(&self) -> Operation {
        match self {
            Action::Handshake => Operation::Handshake,
            Action::GetAllChannels { .. } => Operation::GetChannels,
            Action::CreateLink { .. } => Operation::CreateLink,
            Action::GetEpg { .. } => Operation::GetEpg,
        }
    }

    /// Whether the portal expects the set-top box User-Agent for this action
    pub fn requires_stb_user_agent(&self) -> bool {
        matches!(self, Action::Handshake | Action::CreateLink { .. })
    }

    /// Query parameters in wire order
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        match *self {
            Action::Handshake => vec![
                ("type", "stb"),
                ("action", "handshake"),
                ("JsHttpRequest", JS_HTTP_REQUEST),
            ],
            Action::GetAllChannels { gzip } => {
                let mut params = vec![("type", "itv"), ("action", "get_all_channels")];
                if gzip {
                    params.push(("gzip", "true"));
                }
                params.push(("JsHttpRequest", JS_HTTP_REQUEST));
                params
            }
            Action::CreateLink { cmd } => vec![
                ("type", "itv"),
                ("action", "create_link"),
                ("cmd", cmd),
                ("forced_storage", "undefined"),
                ("disable_ad", "0"),
                ("JsHttpRequest", JS_HTTP_REQUEST),
            ],
            Action::GetEpg { channel_id } => vec![
                ("type", "itv"),
                ("action", "get_epg"),
                ("ch_id", channel_id),
                ("JsHttpRequest", JS_HTTP_REQUEST),
            ],
        }
    }
}

/// A fully built GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub operation: Operation,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl PortalRequest {
    /// Look up a header value by (case-sensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Builds requests for one portal identity
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    portal_url: &'a str,
    mac: &'a str,
    timezone: &'a str,
    user_agent: &'a str,
}

impl<'a> RequestBuilder<'a> {
    /// `portal_url` must already be trimmed of trailing slashes
    pub fn new(portal_url: &'a str, mac: &'a str, timezone: &'a str, user_agent: &'a str) -> Self {
        Self {
            portal_url,
            mac,
            timezone,
            user_agent,
        }
    }

    /// Identity cookie sent with every request
    pub fn cookie(&self) -> String {
        format!(
            "mac={}; stb_lang={}; timezone={}",
            self.mac, STB_LANG, self.timezone
        )
    }

    /// Build a request for `action`.
    ///
    /// # Arguments
    /// * `token` - Bearer token to attach, if any
    /// * `accept_gzip` - Send `Accept-Encoding: gzip`
    pub fn build(&self, action: Action<'_>, token: Option<&str>, accept_gzip: bool) -> PortalRequest {
        let query = action
            .query_params()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let mut headers = vec![("Cookie", self.cookie())];
        if let Some(token) = token {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        if action.requires_stb_user_agent() {
            headers.push(("User-Agent", self.user_agent.to_string()));
        }
        if accept_gzip {
            headers.push(("Accept-Encoding", "gzip".to_string()));
        }

        PortalRequest {
            operation: action.operation(),
            url: format!("{}{}?{}", self.portal_url, LOAD_PATH, query),
            headers,
        }
    }
}
