//! OAuth client credentials and the tokens obtained with them.

use serde::{Deserialize, Serialize};

/// Client credentials plus the current token pair, if authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry of the access token, in Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Credentials {
    /// Unauthorized credentials for a client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether `other` was issued to the same client.
    #[must_use]
    pub fn same_client(&self, other: &Self) -> bool {
        self.client_id == other.client_id && self.client_secret == other.client_secret
    }

    /// Store a freshly issued token pair valid for `expires_in` seconds from `now_ms`.
    pub fn authorize(
        &mut self,
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        now_ms: i64,
    ) {
        self.access_token = Some(access_token);
        self.refresh_token = Some(refresh_token);
        self.expires_at = Some(now_ms + expires_in * 1000);
    }
}
