//! # yhk-adapter-accessory-memory
//!
//! In-memory accessory host.
//!
//! ## Responsibilities
//! - Implement the `AccessoryHost` port defined in `yhk-app::ports`
//! - Keep the accessory → service → characteristic tree and stored values
//! - Broadcast value notifications to subscribed observers
//! - Act as a local controller: forward reads and writes on bound
//!   characteristics to the core as `LocalRequest` messages
//!
//! The pairing and transport layer of a real accessory protocol is out of
//! scope; this host is what the daemon runs against and what tests drive.
//!
//! ## Dependency rule
//! Depends on `yhk-app` (port traits) and `yhk-domain` only.

pub mod error;
pub mod host;

pub use error::HostError;
pub use host::{CharacteristicEvent, InMemoryAccessoryHost};
