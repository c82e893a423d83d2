//! OAuth token endpoint: token refresh and device-code authorization.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use yhk_domain::credentials::Credentials;

use crate::client::decode;
use crate::config::{YandexConfig, join};
use crate::error::YandexError;

/// Token endpoint errors that mean "ask again later".
const PENDING: &[&str] = &["authorization_pending", "slow_down"];

/// A successful token endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token, in seconds.
    pub expires_in: i64,
}

impl TokenResponse {
    /// Store the token pair in `credentials`, expiring relative to `now_ms`.
    pub fn apply(self, credentials: &mut Credentials, now_ms: i64) {
        credentials.authorize(self.access_token, self.refresh_token, self.expires_in, now_ms);
    }
}

/// A pending device-code authorization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    /// Code the user types on the verification page.
    pub user_code: String,
    pub verification_url: String,
    /// Polling interval, in seconds.
    pub interval: u64,
    /// Lifetime of the code, in seconds.
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenRejection {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

enum TokenOutcome {
    Issued(TokenResponse),
    Rejected(TokenRejection),
}

/// Client for the OAuth server.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &YandexConfig) -> Self {
        Self {
            http,
            base_url: config.oauth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    async fn token(&self, form: &[(&str, &str)]) -> Result<TokenOutcome, YandexError> {
        let response = self
            .http
            .post(join(&self.base_url, "/token"))
            .form(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(TokenOutcome::Issued(serde_json::from_slice(&body)?));
        }
        match serde_json::from_slice::<TokenRejection>(&body) {
            Ok(rejection) if status.is_client_error() => Ok(TokenOutcome::Rejected(rejection)),
            _ => Err(YandexError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns [`YandexError::Unauthorized`] if the server rejects the
    /// refresh token, or a transport error.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, YandexError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        match self.token(&form).await? {
            TokenOutcome::Issued(token) => Ok(token),
            TokenOutcome::Rejected(rejection) => {
                tracing::warn!(
                    error = %rejection.error,
                    description = rejection.error_description.as_deref().unwrap_or_default(),
                    "refresh token rejected"
                );
                Err(YandexError::Unauthorized(Some(rejection.error)))
            }
        }
    }

    /// Start a device-code authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer cannot be decoded.
    #[tracing::instrument(skip_all)]
    pub async fn request_device_code(&self) -> Result<DeviceCode, YandexError> {
        let response = self
            .http
            .post(join(&self.base_url, "/device/code"))
            .form(&[("client_id", self.client_id.as_str())])
            .send()
            .await?;
        decode(response).await
    }

    /// Ask once whether the user confirmed `device_code`.
    ///
    /// Returns `None` while the authorization is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`YandexError::Unauthorized`] if the code was denied or is
    /// invalid, or a transport error.
    pub async fn poll_token(&self, device_code: &str) -> Result<Option<TokenResponse>, YandexError> {
        let form = [
            ("grant_type", "device_code"),
            ("code", device_code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        match self.token(&form).await? {
            TokenOutcome::Issued(token) => Ok(Some(token)),
            TokenOutcome::Rejected(rejection) if PENDING.contains(&rejection.error.as_str()) => {
                Ok(None)
            }
            TokenOutcome::Rejected(rejection) => Err(YandexError::Unauthorized(Some(rejection.error))),
        }
    }

    /// Poll the token endpoint every `code.interval` seconds until the user
    /// confirms the code or it expires.
    ///
    /// # Errors
    ///
    /// Returns [`YandexError::AuthorizationExpired`] once the code expired,
    /// or any error from [`Self::poll_token`].
    #[tracing::instrument(skip_all, fields(user_code = %code.user_code))]
    pub async fn authorize_device(&self, code: &DeviceCode) -> Result<TokenResponse, YandexError> {
        let deadline = Instant::now() + Duration::from_secs(code.expires_in);
        let interval = Duration::from_secs(code.interval.max(1));
        loop {
            if let Some(token) = self.poll_token(&code.device_code).await? {
                tracing::info!("device authorized");
                return Ok(token);
            }
            if Instant::now() + interval > deadline {
                return Err(YandexError::AuthorizationExpired);
            }
            tracing::debug!("authorization pending");
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn client(server: &mockito::Server) -> OAuthClient {
        let config = YandexConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            oauth_url: server.url(),
            timeout_secs: 5,
            ..YandexConfig::default()
        };
        OAuthClient::new(config.http_client().unwrap(), &config)
    }

    fn pending() -> &'static str {
        r#"{"error": "authorization_pending", "error_description": "User has not yet authorized"}"#
    }

    #[tokio::test]
    async fn should_request_device_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/device/code")
            .match_body(Matcher::UrlEncoded("client_id".into(), "id".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"device_code": "dc", "user_code": "uc", "verification_url": "https://ya.ru/device",
                    "interval": 5, "expires_in": 300}"#,
            )
            .create_async()
            .await;

        let code = client(&server).request_device_code().await.unwrap();

        mock.assert_async().await;
        assert_eq!(code.user_code, "uc");
        assert_eq!(code.interval, 5);
    }

    #[tokio::test]
    async fn should_report_pending_authorization() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "device_code".into()),
                Matcher::UrlEncoded("code".into(), "dc".into()),
            ]))
            .with_status(400)
            .with_body(pending())
            .create_async()
            .await;

        assert_eq!(client(&server).poll_token("dc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_fail_on_denied_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let err = client(&server).poll_token("dc").await.unwrap_err();
        assert!(matches!(err, YandexError::Unauthorized(Some(ref code)) if code == "invalid_grant"));
    }

    #[tokio::test]
    async fn should_return_token_once_authorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token": "a", "refresh_token": "r", "expires_in": 3600, "token_type": "bearer"}"#)
            .create_async()
            .await;
        let code = DeviceCode {
            device_code: "dc".into(),
            user_code: "uc".into(),
            verification_url: "https://ya.ru/device".into(),
            interval: 1,
            expires_in: 60,
        };

        let token = client(&server).authorize_device(&code).await.unwrap();

        let mut credentials = Credentials::new("id", "secret");
        token.apply(&mut credentials, 0);
        assert_eq!(credentials.access_token.as_deref(), Some("a"));
        assert_eq!(credentials.expires_at, Some(3_600_000));
    }

    #[tokio::test]
    async fn should_stop_polling_when_code_expires() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(pending())
            .create_async()
            .await;
        let code = DeviceCode {
            device_code: "dc".into(),
            user_code: "uc".into(),
            verification_url: "https://ya.ru/device".into(),
            interval: 5,
            expires_in: 0,
        };

        let err = client(&server).authorize_device(&code).await.unwrap_err();
        assert!(matches!(err, YandexError::AuthorizationExpired));
    }

    #[tokio::test]
    async fn should_reject_invalid_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant", "error_description": "expired"}"#)
            .create_async()
            .await;

        let err = client(&server).refresh("stale").await.unwrap_err();
        assert!(matches!(err, YandexError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn should_surface_server_errors_as_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = client(&server).refresh("r").await.unwrap_err();
        assert!(matches!(err, YandexError::Status { status: 503, .. }));
    }
}
