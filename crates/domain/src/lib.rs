//! # yhk-domain
//!
//! Pure domain model for the yhk bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **remote device model** (devices, rooms, capabilities,
//!   properties, outbound actions, snapshots, credentials)
//! - Define the **local accessory model** (services, characteristics,
//!   local values, accessory metadata)
//! - Provide the **adapters** that transcode values between the two
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod accessory;
pub mod adapter;
pub mod credentials;
pub mod device;
