//! # yhk-adapter-yandex
//!
//! Remote platform adapter for the Yandex smart-home IoT API.
//!
//! ## Responsibilities
//! - Fetch the device listing (`GET /user/info`)
//! - Send capability actions (`POST /devices/actions`)
//! - Refresh the access token once when the API answers 401, and persist the
//!   new token pair through the credential store
//! - Run the OAuth device-code authorization used by the console prompt
//!
//! ## Dependency rule
//! Depends on `yhk-app` and `yhk-domain`. Never imported by `app` or `domain`.

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;

pub use client::YandexClient;
pub use config::YandexConfig;
pub use error::YandexError;
pub use oauth::{DeviceCode, OAuthClient, TokenResponse};
