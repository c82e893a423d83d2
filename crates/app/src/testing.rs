//! In-memory fakes for the ports, shared by the unit tests of this crate.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use yhk_domain::accessory::{
    AccessoryInfo, CharacteristicHandle, CharacteristicKind, LocalValue, ServiceHandle,
    ServiceKind,
};
use yhk_domain::device::{DeviceActions, DeviceSnapshot, UserInfo};
use yhk_domain::error::YhkError;
use yhk_domain::id::DeviceId;

use crate::ports::{Access, AccessoryHost, RemotePlatform, SnapshotStore};

#[derive(Debug, Default)]
pub struct HostState {
    pub accessories: BTreeMap<DeviceId, AccessoryInfo>,
    pub services: BTreeSet<ServiceHandle>,
    pub values: HashMap<CharacteristicHandle, LocalValue>,
    /// Every notifying update, in order.
    pub updates: Vec<(CharacteristicHandle, LocalValue)>,
    pub bound: HashMap<CharacteristicHandle, Access>,
    pub publishes: usize,
    pub binds: usize,
    pub unbinds: usize,
    pub removed_services: usize,
}

/// Accessory host that records every call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    pub fn value_of(
        &self,
        accessory: &str,
        service: ServiceKind,
        characteristic: CharacteristicKind,
    ) -> Option<LocalValue> {
        let handle = ServiceHandle {
            accessory: DeviceId::from(accessory),
            kind: service,
        }
        .characteristic(characteristic);
        self.state().values.get(&handle).cloned()
    }

    pub fn has_service(&self, accessory: &str, service: ServiceKind) -> bool {
        self.state().services.contains(&ServiceHandle {
            accessory: DeviceId::from(accessory),
            kind: service,
        })
    }

    pub fn updates_len(&self) -> usize {
        self.state().updates.len()
    }
}

impl AccessoryHost for RecordingHost {
    fn publish_accessory(&self, info: &AccessoryInfo) {
        let mut state = self.state();
        state.publishes += 1;
        state.accessories.insert(info.id.clone(), info.clone());
    }

    fn remove_accessory(&self, accessory: &DeviceId) {
        let mut state = self.state();
        state.accessories.remove(accessory);
        state.services.retain(|service| &service.accessory != accessory);
        state
            .values
            .retain(|characteristic, _| characteristic.accessory() != accessory);
        state
            .bound
            .retain(|characteristic, _| characteristic.accessory() != accessory);
    }

    fn set_service(&self, accessory: &DeviceId, kind: ServiceKind) -> ServiceHandle {
        let handle = ServiceHandle {
            accessory: accessory.clone(),
            kind,
        };
        self.state().services.insert(handle.clone());
        handle
    }

    fn remove_service(&self, service: &ServiceHandle) {
        let mut state = self.state();
        state.removed_services += 1;
        state.services.remove(service);
        state
            .values
            .retain(|characteristic, _| &characteristic.service != service);
    }

    fn characteristic(
        &self,
        service: &ServiceHandle,
        kind: CharacteristicKind,
    ) -> CharacteristicHandle {
        service.characteristic(kind)
    }

    fn set_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        self.state().values.insert(characteristic.clone(), value);
    }

    fn update_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        if value.is_null() {
            return;
        }
        let mut state = self.state();
        state.values.insert(characteristic.clone(), value.clone());
        state.updates.push((characteristic.clone(), value));
    }

    fn value(&self, characteristic: &CharacteristicHandle) -> Option<LocalValue> {
        self.state().values.get(characteristic).cloned()
    }

    fn bind(&self, characteristic: &CharacteristicHandle, access: Access) {
        let mut state = self.state();
        state.binds += 1;
        state.bound.insert(characteristic.clone(), access);
    }

    fn unbind(&self, characteristic: &CharacteristicHandle) {
        let mut state = self.state();
        state.unbinds += 1;
        state.bound.remove(characteristic);
    }
}

/// Remote platform replaying queued listings and recording sent actions.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    listings: Mutex<VecDeque<UserInfo>>,
    send_delays: Mutex<VecDeque<Duration>>,
    failing_sends: Mutex<usize>,
    pub sent: Mutex<Vec<Vec<DeviceActions>>>,
}

impl ScriptedRemote {
    pub fn push_listing(&self, listing: UserInfo) {
        self.listings.lock().unwrap().push_back(listing);
    }

    /// Make the next `send_actions` call take `delay` before it is recorded.
    pub fn delay_next_send(&self, delay: Duration) {
        self.send_delays.lock().unwrap().push_back(delay);
    }

    /// Reject the next `send_actions` call with `Unauthorized`.
    pub fn fail_next_send(&self) {
        *self.failing_sends.lock().unwrap() += 1;
    }

    pub fn sent(&self) -> Vec<Vec<DeviceActions>> {
        self.sent.lock().unwrap().clone()
    }
}

impl RemotePlatform for ScriptedRemote {
    fn user_info(&self) -> impl Future<Output = Result<UserInfo, YhkError>> + Send {
        let next = self.listings.lock().unwrap().pop_front();
        async move { next.ok_or(YhkError::NotConfigured) }
    }

    fn send_actions(
        &self,
        devices: Vec<DeviceActions>,
    ) -> impl Future<Output = Result<(), YhkError>> + Send {
        let delay = self.send_delays.lock().unwrap().pop_front();
        let fail = {
            let mut failing = self.failing_sends.lock().unwrap();
            let fail = *failing > 0;
            *failing = failing.saturating_sub(1);
            fail
        };
        async move {
            if fail {
                return Err(YhkError::Unauthorized);
            }
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().unwrap().push(devices);
            Ok(())
        }
    }
}

/// Snapshot store keeping the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    pub saved: Mutex<Option<Vec<DeviceSnapshot>>>,
    pub saves: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn with_snapshot(snapshot: Vec<DeviceSnapshot>) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    pub fn last(&self) -> Option<Vec<DeviceSnapshot>> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> impl Future<Output = Result<Option<Vec<DeviceSnapshot>>, YhkError>> + Send {
        let saved = self.saved.lock().unwrap().clone();
        async { Ok(saved) }
    }

    fn save(&self, snapshot: &[DeviceSnapshot]) -> impl Future<Output = Result<(), YhkError>> + Send {
        *self.saved.lock().unwrap() = Some(snapshot.to_vec());
        *self.saves.lock().unwrap() += 1;
        async { Ok(()) }
    }
}
