//! Yandex adapter error types.

use yhk_domain::error::YhkError;

/// Errors specific to the Yandex adapter.
#[derive(Debug, thiserror::Error)]
pub enum YandexError {
    /// No access token is available yet.
    #[error("Yandex client is not authorized")]
    NotConfigured,

    /// The token could not be refreshed; a new authorization is required.
    #[error("Yandex authorization rejected")]
    Unauthorized(Option<String>),

    /// The device code expired before the user confirmed it.
    #[error("device code expired")]
    AuthorizationExpired,

    /// Transport failure.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response")]
    Decode(#[from] serde_json::Error),

    /// A domain-level error (credential persistence, etc.).
    #[error("domain error")]
    Domain(#[source] YhkError),
}

impl YandexError {
    /// Convert into a [`YhkError`] for propagation across port boundaries.
    #[must_use]
    pub fn into_domain(self) -> YhkError {
        match self {
            Self::NotConfigured => YhkError::NotConfigured,
            Self::Unauthorized(_) => YhkError::Unauthorized,
            Self::Domain(err) => err,
            other => YhkError::Remote(Box::new(other)),
        }
    }
}

impl From<YandexError> for YhkError {
    fn from(err: YandexError) -> Self {
        err.into_domain()
    }
}
