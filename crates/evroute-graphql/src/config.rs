//! Client configuration
//!
//! Resolution order: defaults, then a TOML file, then `EVROUTE_*`
//! environment variables, then whatever the caller sets with `with_*`.

use crate::error::GraphqlError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Public HTTP endpoint
pub const DEFAULT_HTTP_URL: &str = "https://api.chargetrip.io/graphql";
/// Public WebSocket endpoint
pub const DEFAULT_WS_URL: &str = "wss://api.chargetrip.io/graphql";

/// Connection settings for the GraphQL API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphqlConfig {
    /// Endpoint for queries and mutations
    pub http_url: String,
    /// Endpoint for subscriptions
    pub ws_url: String,
    /// Sent as `x-client-id`
    pub client_id: String,
    /// Sent as `x-app-id`, when set
    pub app_id: Option<String>,
    /// How long to wait for `connection_ack`
    pub ack_timeout_ms: u64,
    /// Timeout for a single HTTP request
    pub request_timeout_ms: u64,
}

impl GraphqlConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// `GraphqlError::ConfigParse` if the document is not valid TOML for this type
    pub fn from_toml_str(source: &str) -> Result<Self, GraphqlError> {
        toml::from_str(source).map_err(GraphqlError::ConfigParse)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// `GraphqlError::ConfigIo` if the file cannot be read,
    /// `GraphqlError::ConfigParse` if it cannot be parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphqlError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GraphqlError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `EVROUTE_HTTP_URL`, `EVROUTE_WS_URL`, `EVROUTE_CLIENT_ID` and
    /// `EVROUTE_APP_ID` when set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("EVROUTE_HTTP_URL") {
            self.http_url = v;
        }
        if let Some(v) = lookup("EVROUTE_WS_URL") {
            self.ws_url = v;
        }
        if let Some(v) = lookup("EVROUTE_CLIENT_ID") {
            self.client_id = v;
        }
        if let Some(v) = lookup("EVROUTE_APP_ID") {
            self.app_id = Some(v);
        }
        self
    }

    /// With HTTP endpoint
    #[inline]
    #[must_use]
    pub fn with_http_url(mut self, url: impl Into<String>) -> Self {
        self.http_url = url.into();
        self
    }

    /// With WebSocket endpoint
    #[inline]
    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// With client id
    #[inline]
    #[must_use]
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// With app id
    #[inline]
    #[must_use]
    pub fn with_app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = Some(id.into());
        self
    }

    /// With acknowledgement timeout
    #[inline]
    #[must_use]
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With HTTP request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Acknowledgement timeout
    #[inline]
    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// HTTP request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Authentication headers, sent with every HTTP request and as the
    /// WebSocket `connection_init` payload
    #[must_use]
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("x-client-id", self.client_id.clone())];
        if let Some(app_id) = &self.app_id {
            headers.push(("x-app-id", app_id.clone()));
        }
        headers
    }

    /// Check that the configuration can be used
    ///
    /// # Errors
    /// `GraphqlError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<(), GraphqlError> {
        if self.client_id.trim().is_empty() {
            return Err(GraphqlError::Config("client_id must not be empty".into()));
        }
        if !self.http_url.starts_with("http://") && !self.http_url.starts_with("https://") {
            return Err(GraphqlError::Config(format!(
                "http_url '{}' is not an http(s) URL",
                self.http_url
            )));
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(GraphqlError::Config(format!(
                "ws_url '{}' is not a ws(s) URL",
                self.ws_url
            )));
        }
        if self.ack_timeout_ms == 0 {
            return Err(GraphqlError::Config("ack_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            http_url: DEFAULT_HTTP_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            client_id: String::new(),
            app_id: None,
            ack_timeout_ms: 4_000,
            request_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GraphqlConfig::from_toml_str(
            r#"
            client_id = "5ed1175bad06853b3aa1e492"
            app_id = "623998b2c35130073829b2d2"
            "#,
        )
        .unwrap();
        assert_eq!(config.http_url, DEFAULT_HTTP_URL);
        assert_eq!(config.ack_timeout(), Duration::from_secs(4));
        assert_eq!(config.app_id.as_deref(), Some("623998b2c35130073829b2d2"));
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_win_over_file() {
        let env: HashMap<&str, &str> = [
            ("EVROUTE_CLIENT_ID", "from-env"),
            ("EVROUTE_WS_URL", "ws://127.0.0.1:9000/graphql"),
        ]
        .into_iter()
        .collect();
        let config = GraphqlConfig::new()
            .with_client_id("from-file")
            .with_overrides_from(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.client_id, "from-env");
        assert_eq!(config.ws_url, "ws://127.0.0.1:9000/graphql");
        assert_eq!(config.http_url, DEFAULT_HTTP_URL);
    }

    #[test]
    fn validation() {
        assert!(GraphqlConfig::new().validate().is_err());
        let bad_ws = GraphqlConfig::new()
            .with_client_id("id")
            .with_ws_url("https://api.chargetrip.io/graphql");
        assert!(matches!(bad_ws.validate(), Err(GraphqlError::Config(_))));
    }

    #[test]
    fn headers_include_app_id_only_when_set() {
        let config = GraphqlConfig::new().with_client_id("c");
        assert_eq!(config.auth_headers(), vec![("x-client-id", "c".to_string())]);
        let config = config.with_app_id("a");
        assert_eq!(config.auth_headers().len(), 2);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evroute.toml");
        std::fs::write(&path, "client_id = \"abc\"\nack_timeout_ms = 1000\n").unwrap();
        let config = GraphqlConfig::load(&path).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.ack_timeout_ms, 1000);
        assert!(matches!(
            GraphqlConfig::load(dir.path().join("missing.toml")),
            Err(GraphqlError::ConfigIo { .. })
        ));
    }
}
