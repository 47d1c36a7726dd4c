//! Backend endpoint addressing.
//!
//! The backend listens on the same host as the page that serves the client,
//! on a fixed port, with a WebSocket scheme whose security level mirrors the
//! page's scheme.

use std::fmt;

use url::Url;

use crate::error::ClientError;

/// Port the backend listens on.
pub const DEFAULT_BACKEND_PORT: u16 = 5000;

/// WebSocket URL of the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Derives the endpoint from a page origin such as
    /// `https://demo.example.com:8443`.
    ///
    /// `https`/`wss` origins map to `wss`, `http`/`ws` to `ws`. The host is
    /// kept, the origin's port and path are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if the origin does not parse,
    /// has no host, or uses another scheme.
    pub fn from_origin(origin: &str, port: u16) -> Result<Self, ClientError> {
        let origin = Url::parse(origin)
            .map_err(|err| ClientError::InvalidEndpoint(format!("{origin}: {err}")))?;
        let scheme = match origin.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(ClientError::InvalidEndpoint(format!(
                    "unsupported origin scheme `{other}`"
                )));
            }
        };
        let host = origin
            .host_str()
            .ok_or_else(|| ClientError::InvalidEndpoint(format!("{origin} has no host")))?;

        Self::parse(&format!("{scheme}://{host}:{port}/"))
    }

    /// Parses an explicit WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] unless the URL parses and
    /// uses `ws` or `wss`.
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let url =
            Url::parse(url).map_err(|err| ClientError::InvalidEndpoint(format!("{url}: {err}")))?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self(url)),
            other => Err(ClientError::InvalidEndpoint(format!(
                "expected ws or wss, got `{other}`"
            ))),
        }
    }

    /// Returns `true` for `wss` endpoints.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
