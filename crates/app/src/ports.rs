//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod accessory_host;
pub mod remote;
pub mod storage;

pub use accessory_host::{Access, AccessoryHost, LocalRequest};
pub use remote::RemotePlatform;
pub use storage::{CredentialStore, SnapshotStore};
