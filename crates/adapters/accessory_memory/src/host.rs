//! The in-memory accessory tree.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc, oneshot};

use yhk_app::ports::{Access, AccessoryHost, LocalRequest};
use yhk_domain::accessory::{
    AccessoryInfo, CharacteristicHandle, CharacteristicKind, LocalValue, ServiceHandle,
    ServiceKind,
};
use yhk_domain::id::DeviceId;

use crate::error::HostError;

const EVENT_CAPACITY: usize = 64;

/// A value notification pushed to subscribed controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicEvent {
    pub characteristic: CharacteristicHandle,
    pub value: LocalValue,
}

#[derive(Debug, Default)]
struct Characteristic {
    value: Option<LocalValue>,
    access: Option<Access>,
}

#[derive(Debug)]
struct Accessory {
    info: AccessoryInfo,
    services: BTreeMap<ServiceKind, BTreeMap<CharacteristicKind, Characteristic>>,
}

/// Accessory host keeping everything in memory.
///
/// Local reads and writes on bound characteristics are forwarded to the
/// core through the [`LocalRequest`] channel given at construction.
pub struct InMemoryAccessoryHost {
    accessories: Mutex<BTreeMap<DeviceId, Accessory>>,
    events: broadcast::Sender<CharacteristicEvent>,
    requests: mpsc::Sender<LocalRequest>,
}

impl InMemoryAccessoryHost {
    #[must_use]
    pub fn new(requests: mpsc::Sender<LocalRequest>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accessories: Mutex::new(BTreeMap::new()),
            events,
            requests,
        }
    }

    /// Create a host along with the receiving end of its request channel.
    #[must_use]
    pub fn with_channel(capacity: usize) -> (Self, mpsc::Receiver<LocalRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Subscribe to value notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<DeviceId, Accessory>> {
        self.accessories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with_characteristic<T>(
        &self,
        handle: &CharacteristicHandle,
        f: impl FnOnce(&mut Characteristic) -> T,
    ) -> Option<T> {
        let mut accessories = self.lock();
        let characteristic = accessories
            .get_mut(handle.accessory())?
            .services
            .get_mut(&handle.service.kind)?
            .get_mut(&handle.kind)?;
        Some(f(characteristic))
    }

    /// Metadata of every published accessory.
    #[must_use]
    pub fn accessories(&self) -> Vec<AccessoryInfo> {
        self.lock()
            .values()
            .map(|accessory| accessory.info.clone())
            .collect()
    }

    /// Services present on an accessory.
    #[must_use]
    pub fn services(&self, accessory: &DeviceId) -> Vec<ServiceKind> {
        self.lock()
            .get(accessory)
            .map(|accessory| accessory.services.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Read a characteristic as a local controller would.
    ///
    /// Bound characteristics are answered by the core; unbound ones return
    /// the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownCharacteristic`] if the characteristic
    /// does not exist and [`HostError::Closed`] if the core stopped.
    pub async fn read(
        &self,
        characteristic: &CharacteristicHandle,
    ) -> Result<Option<LocalValue>, HostError> {
        let (bound, stored) = self
            .with_characteristic(characteristic, |entry| {
                (entry.access.is_some(), entry.value.clone())
            })
            .ok_or_else(|| HostError::unknown(characteristic))?;
        if !bound {
            return Ok(stored);
        }
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(LocalRequest::Read {
                characteristic: characteristic.clone(),
                reply,
            })
            .await
            .map_err(|_| HostError::Closed)?;
        answer.await.map_err(|_| HostError::Closed)
    }

    /// Write a characteristic as a local controller would, and wait until
    /// the core applied it. The value is stored only once the core accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ReadOnly`] unless the characteristic is bound
    /// for writing, [`HostError::UnknownCharacteristic`] if it does not
    /// exist, [`HostError::Rejected`] if the binding refused the value and
    /// [`HostError::Closed`] if the core stopped.
    pub async fn write(
        &self,
        characteristic: &CharacteristicHandle,
        value: LocalValue,
    ) -> Result<(), HostError> {
        let writable = self
            .with_characteristic(characteristic, |entry| entry.access == Some(Access::ReadWrite))
            .ok_or_else(|| HostError::unknown(characteristic))?;
        if !writable {
            return Err(HostError::ReadOnly(characteristic.kind));
        }
        let (ack, applied) = oneshot::channel();
        self.requests
            .send(LocalRequest::Write {
                characteristic: characteristic.clone(),
                value: value.clone(),
                ack,
            })
            .await
            .map_err(|_| HostError::Closed)?;
        applied
            .await
            .map_err(|_| HostError::Closed)?
            .map_err(HostError::Rejected)?;
        self.with_characteristic(characteristic, |entry| entry.value = Some(value));
        Ok(())
    }
}

impl AccessoryHost for InMemoryAccessoryHost {
    fn publish_accessory(&self, info: &AccessoryInfo) {
        let mut accessories = self.lock();
        match accessories.get_mut(&info.id) {
            Some(accessory) => {
                accessory.info = info.clone();
                tracing::debug!(accessory = %info.id, name = %info.name, "accessory updated");
            }
            None => {
                accessories.insert(
                    info.id.clone(),
                    Accessory {
                        info: info.clone(),
                        services: BTreeMap::new(),
                    },
                );
                tracing::info!(
                    accessory = %info.id,
                    name = %info.name,
                    category = ?info.category,
                    pin = %info.pin,
                    "accessory published"
                );
            }
        }
    }

    fn remove_accessory(&self, accessory: &DeviceId) {
        if self.lock().remove(accessory).is_some() {
            tracing::info!(accessory = %accessory, "accessory removed");
        }
    }

    fn set_service(&self, accessory: &DeviceId, kind: ServiceKind) -> ServiceHandle {
        match self.lock().get_mut(accessory) {
            Some(entry) => {
                entry.services.entry(kind).or_default();
            }
            None => tracing::warn!(accessory = %accessory, service = ?kind, "service on unknown accessory"),
        }
        ServiceHandle {
            accessory: accessory.clone(),
            kind,
        }
    }

    fn remove_service(&self, service: &ServiceHandle) {
        if let Some(accessory) = self.lock().get_mut(&service.accessory) {
            accessory.services.remove(&service.kind);
        }
    }

    fn characteristic(
        &self,
        service: &ServiceHandle,
        kind: CharacteristicKind,
    ) -> CharacteristicHandle {
        if let Some(characteristics) = self
            .lock()
            .get_mut(&service.accessory)
            .and_then(|accessory| accessory.services.get_mut(&service.kind))
        {
            characteristics.entry(kind).or_default();
        }
        service.characteristic(kind)
    }

    fn set_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        self.with_characteristic(characteristic, |entry| entry.value = Some(value));
    }

    fn update_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        if value.is_null() {
            return;
        }
        let stored = self.with_characteristic(characteristic, |entry| {
            entry.value = Some(value.clone());
        });
        if stored.is_some() {
            tracing::trace!(characteristic = ?characteristic.kind, value = ?value, "value updated");
            // no subscribers is fine
            let _ = self.events.send(CharacteristicEvent {
                characteristic: characteristic.clone(),
                value,
            });
        }
    }

    fn value(&self, characteristic: &CharacteristicHandle) -> Option<LocalValue> {
        self.with_characteristic(characteristic, |entry| entry.value.clone())
            .flatten()
    }

    fn bind(&self, characteristic: &CharacteristicHandle, access: Access) {
        self.with_characteristic(characteristic, |entry| entry.access = Some(access));
    }

    fn unbind(&self, characteristic: &CharacteristicHandle) {
        self.with_characteristic(characteristic, |entry| entry.access = None);
    }
}
