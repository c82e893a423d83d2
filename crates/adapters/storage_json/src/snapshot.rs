//! Device snapshot store backed by `devices.json`.

use std::future::Future;
use std::path::Path;

use yhk_app::ports::SnapshotStore;
use yhk_domain::device::DeviceSnapshot;
use yhk_domain::error::YhkError;

use crate::file::{JsonFile, encode};

const FILE_NAME: &str = "devices.json";

/// Persists the device registry as a flat array of `{device, room}` pairs.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    file: JsonFile,
}

impl JsonSnapshotStore {
    /// Store the snapshot in `dir/devices.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            file: JsonFile::new(dir.join(FILE_NAME)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> impl Future<Output = Result<Option<Vec<DeviceSnapshot>>, YhkError>> + Send {
        let file = self.file.clone();
        async move { Ok(file.read().await?) }
    }

    fn save(
        &self,
        snapshots: &[DeviceSnapshot],
    ) -> impl Future<Output = Result<(), YhkError>> + Send {
        let file = self.file.clone();
        let encoded = encode(snapshots);
        async move {
            file.write(encoded?).await?;
            tracing::debug!(path = %file.path().display(), "device snapshot saved");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yhk_domain::device::{Device, DeviceType, Room};

    #[tokio::test]
    async fn should_round_trip_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::in_dir(dir.path());
        let snapshots = vec![DeviceSnapshot {
            device: Device::new("lamp", "Lamp", DeviceType::Light).with_room("r1"),
            room: Some(Room::new("r1", "Kitchen")),
        }];

        store.save(&snapshots).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshots));
        assert!(store.path().ends_with("devices.json"));
    }

    #[tokio::test]
    async fn should_load_nothing_from_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::in_dir(dir.path());

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_write_flat_array_of_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::in_dir(dir.path());
        let snapshots = vec![DeviceSnapshot {
            device: Device::new("plug", "Plug", DeviceType::Socket),
            room: None,
        }];

        store.save(&snapshots).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw[0]["device"]["type"], "devices.types.socket");
        assert!(raw[0]["room"].is_null());
    }
}
