//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`YhkError`]
//! at port boundaries.

/// Top-level error shared by ports and services.
#[derive(Debug, thiserror::Error)]
pub enum YhkError {
    /// Remote credentials are missing; raised on the startup path and never retried.
    #[error("remote platform is not configured")]
    NotConfigured,

    /// The remote platform rejected the access token.
    #[error("unauthorized")]
    Unauthorized,

    /// A local value did not have the shape a binding expects.
    #[error("invalid local value")]
    InvalidValue(#[from] InvalidValueError),

    /// Transient failure talking to the remote platform.
    #[error("remote platform error")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persistence failure.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A characteristic write carried a value of an unexpected kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected a {expected} value, got {got}")]
pub struct InvalidValueError {
    pub expected: &'static str,
    pub got: &'static str,
}
