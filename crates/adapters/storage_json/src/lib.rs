//! # yhk-adapter-storage-json
//!
//! JSON file persistence adapter.
//!
//! ## Responsibilities
//! - Implement the store port traits defined in `yhk-app::ports::storage`
//! - Keep one JSON document per store inside a data directory
//!   (`devices.json` for the device snapshot, `yandex.json` for credentials)
//! - Treat a missing or unreadable document as "nothing stored yet"
//!
//! ## Dependency rule
//! Depends on `yhk-app` (for port traits) and `yhk-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod credentials;
pub mod error;
pub mod file;
pub mod snapshot;

pub use credentials::JsonCredentialStore;
pub use snapshot::JsonSnapshotStore;
