//! Storage ports — device snapshots and OAuth credentials.

use std::future::Future;

use yhk_domain::credentials::Credentials;
use yhk_domain::device::DeviceSnapshot;
use yhk_domain::error::YhkError;

/// Persisted projection of the device registry.
pub trait SnapshotStore {
    /// Read the last written snapshot, `None` when there is none.
    fn load(&self) -> impl Future<Output = Result<Option<Vec<DeviceSnapshot>>, YhkError>> + Send;

    /// Replace the snapshot.
    fn save(&self, snapshots: &[DeviceSnapshot]) -> impl Future<Output = Result<(), YhkError>> + Send;
}

/// Persisted client credentials and tokens.
pub trait CredentialStore {
    /// Read the stored credentials, `None` when there are none.
    fn load(&self) -> impl Future<Output = Result<Option<Credentials>, YhkError>> + Send;

    /// Replace the stored credentials.
    fn save(&self, credentials: &Credentials) -> impl Future<Output = Result<(), YhkError>> + Send;
}

impl<T: SnapshotStore + Send + Sync> SnapshotStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<Vec<DeviceSnapshot>>, YhkError>> + Send {
        (**self).load()
    }

    fn save(&self, snapshots: &[DeviceSnapshot]) -> impl Future<Output = Result<(), YhkError>> + Send {
        (**self).save(snapshots)
    }
}

impl<T: CredentialStore + Send + Sync> CredentialStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<Credentials>, YhkError>> + Send {
        (**self).load()
    }

    fn save(&self, credentials: &Credentials) -> impl Future<Output = Result<(), YhkError>> + Send {
        (**self).save(credentials)
    }
}
