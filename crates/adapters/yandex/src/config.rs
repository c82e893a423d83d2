//! Yandex client configuration.

use std::time::Duration;

use serde::Deserialize;
use yhk_domain::credentials::Credentials;

pub const DEFAULT_API_URL: &str = "https://api.iot.yandex.net/v1.0";
pub const DEFAULT_OAUTH_URL: &str = "https://oauth.yandex.ru";

/// OAuth client and endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YandexConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Base URL of the IoT API.
    pub api_url: String,
    /// Base URL of the OAuth server.
    pub oauth_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl YandexConfig {
    /// Unauthorized credentials for the configured client.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.client_id, &self.client_secret)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP client shared by the API and OAuth calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout()).build()
    }
}

pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_public_endpoints() {
        let config: YandexConfig = toml::from_str(r#"client_id = "abc""#).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.oauth_url, DEFAULT_OAUTH_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_join_without_double_slash() {
        assert_eq!(join("http://host/v1.0/", "/user/info"), "http://host/v1.0/user/info");
        assert_eq!(join("http://host", "/token"), "http://host/token");
    }

    #[test]
    fn should_build_unauthorized_credentials() {
        let config = YandexConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..YandexConfig::default()
        };
        assert!(!config.credentials().is_authorized());
        assert_eq!(config.credentials().client_secret, "secret");
    }
}
