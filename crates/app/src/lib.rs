//! # yhk-app
//!
//! Application layer — bindings, reconciliation and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RemotePlatform` — fetch the device listing, send capability actions
//!   - `AccessoryHost` — the local accessory tree
//!   - `SnapshotStore` — persist the device registry
//!   - `CredentialStore` — persist OAuth credentials
//! - Bind remote capabilities and properties to local characteristics
//!   (`CapabilityBinding`, `PropertyBinding`)
//! - Keep one device's bindings in line with its listing (`DeviceSynchronizer`)
//! - Own the device registry and its event loop (`ReconciliationController`)
//!
//! ## Dependency rule
//! Depends on `yhk-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bindings;
pub mod controller;
pub mod debounce;
pub mod ports;
pub mod synchronizer;

#[cfg(test)]
mod testing;
