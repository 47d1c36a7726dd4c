//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use crate::domain::ImageRef;
use crate::error::ClientError;
use crate::ws::endpoint::{DEFAULT_BACKEND_PORT, Endpoint};

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the backend.
    pub endpoint: Endpoint,

    /// Image selected before the first question, if any.
    pub initial_image: Option<ImageRef>,

    /// Capacity of the observer broadcast channel.
    pub update_bus_capacity: usize,

    /// Capacity of the queue between handles and the session loop.
    pub action_queue_capacity: usize,
}

impl ClientConfig {
    /// Creates a configuration for `endpoint` with default capacities.
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            initial_image: None,
            update_bus_capacity: 1024,
            action_queue_capacity: 64,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `VLM_BACKEND_URL` wins if set; otherwise the endpoint is derived from
    /// `VLM_ORIGIN` (default `http://localhost`) and `VLM_BACKEND_PORT`
    /// (default 5000). Calls `dotenvy::dotenv().ok()` to optionally load a
    /// `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if the URL or origin cannot
    /// be turned into a WebSocket endpoint.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let endpoint = match std::env::var("VLM_BACKEND_URL") {
            Ok(url) => Endpoint::parse(&url)?,
            Err(_) => {
                let origin = std::env::var("VLM_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost".to_string());
                let port = parse_env("VLM_BACKEND_PORT", DEFAULT_BACKEND_PORT);
                Endpoint::from_origin(&origin, port)?
            }
        };

        let initial_image = std::env::var("VLM_IMAGE")
            .ok()
            .filter(|image| !image.is_empty())
            .map(ImageRef::from);

        let update_bus_capacity = parse_env("UPDATE_BUS_CAPACITY", 1024);
        let action_queue_capacity = parse_env("ACTION_QUEUE_CAPACITY", 64);

        Ok(Self {
            endpoint,
            initial_image,
            update_bus_capacity,
            action_queue_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_capacities() {
        let Ok(endpoint) = Endpoint::parse("ws://localhost:5000/") else {
            panic!("parse failed");
        };
        let config = ClientConfig::new(endpoint);
        assert_eq!(config.update_bus_capacity, 1024);
        assert_eq!(config.action_queue_capacity, 64);
        assert!(config.initial_image.is_none());
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("VLM_DIALOG_TEST_UNSET_KEY", 5000_u16), 5000);
    }
}
