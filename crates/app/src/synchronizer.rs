//! Device synchronizer — one device's accessory and its bindings.

use std::collections::{BTreeMap, BTreeSet};

use tokio::time::Instant;

use yhk_domain::accessory::{AccessoryInfo, CharacteristicHandle, LocalValue, ServiceHandle};
use yhk_domain::device::{CapabilityAction, CapabilityKey, DeviceSnapshot, PropertyKey};
use yhk_domain::error::YhkError;
use yhk_domain::id::DeviceId;

use crate::bindings::{CapabilityBinding, DeviceContext, PropertyBinding};
use crate::debounce::DebounceConfig;
use crate::ports::AccessoryHost;

/// Binding churn caused by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
}

impl ReconcileReport {
    /// Whether bindings were added or removed.
    #[must_use]
    pub fn changed_shape(&self) -> bool {
        self.created > 0 || self.destroyed > 0
    }
}

/// Keeps the accessory of one device in line with its remote listing.
///
/// Holds at most one binding per capability key and per property key.
/// Capability and property types without a local counterpart are skipped.
#[derive(Debug)]
pub struct DeviceSynchronizer {
    snapshot: DeviceSnapshot,
    info: AccessoryInfo,
    capabilities: BTreeMap<CapabilityKey, CapabilityBinding>,
    properties: BTreeMap<PropertyKey, PropertyBinding>,
    debounce: DebounceConfig,
}

impl DeviceSynchronizer {
    /// Publish the accessory for `snapshot` and bind everything it supports.
    pub fn new(snapshot: DeviceSnapshot, host: &dyn AccessoryHost, debounce: DebounceConfig) -> Self {
        let info = AccessoryInfo::for_device(&snapshot.device, snapshot.room.as_ref());
        host.publish_accessory(&info);
        let mut synchronizer = Self {
            snapshot,
            info,
            capabilities: BTreeMap::new(),
            properties: BTreeMap::new(),
            debounce,
        };
        let created = synchronizer.add_all(host);
        tracing::info!(
            device = %synchronizer.id(),
            name = %synchronizer.info.name,
            bindings = created,
            "accessory published"
        );
        synchronizer
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.snapshot.device.id
    }

    #[must_use]
    pub fn accessory_info(&self) -> &AccessoryInfo {
        &self.info
    }

    /// Create a binding for every supported capability and property of the
    /// held device that is not bound yet. Returns how many were created.
    pub fn add_all(&mut self, host: &dyn AccessoryHost) -> usize {
        let device = &self.snapshot.device;
        let ctx = DeviceContext {
            host,
            accessory: &device.id,
            device_type: device.device_type,
            debounce: self.debounce,
        };
        let mut created = 0;
        for capability in &device.capabilities {
            let key = capability.key();
            if self.capabilities.contains_key(&key) {
                continue;
            }
            if let Some(binding) = CapabilityBinding::create(capability, &ctx) {
                self.capabilities.insert(key, binding);
                created += 1;
            }
        }
        for property in device.effective_properties() {
            let key = property.key();
            if self.properties.contains_key(&key) {
                continue;
            }
            if let Some(binding) = PropertyBinding::create(&property, &ctx) {
                self.properties.insert(key, binding);
                created += 1;
            }
        }
        created
    }

    /// Bring the bindings in line with a fresh listing of the device.
    ///
    /// Existing bindings receive the new values, new capability and property
    /// keys get bindings, and bindings whose key disappeared are destroyed.
    /// Services left without any binding are removed from the accessory.
    #[tracing::instrument(skip_all, fields(device = %snapshot.device.id))]
    pub fn reconcile(
        &mut self,
        snapshot: DeviceSnapshot,
        host: &dyn AccessoryHost,
        now_ms: i64,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let info = AccessoryInfo::for_device(&snapshot.device, snapshot.room.as_ref());
        if info != self.info {
            tracing::debug!(name = %info.name, "accessory information changed");
            host.publish_accessory(&info);
            self.info = info;
        }

        let device = &snapshot.device;
        let ctx = DeviceContext {
            host,
            accessory: &device.id,
            device_type: device.device_type,
            debounce: self.debounce,
        };
        let mut released = Vec::new();

        let mut seen = BTreeSet::new();
        for capability in &device.capabilities {
            let key = capability.key();
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Some(binding) = self.capabilities.get_mut(&key) {
                binding.update(capability, host, now_ms);
                report.updated += 1;
            } else if let Some(binding) = CapabilityBinding::create(capability, &ctx) {
                self.capabilities.insert(key, binding);
                report.created += 1;
            }
        }
        let gone: Vec<CapabilityKey> = self
            .capabilities
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        for key in gone {
            if let Some(binding) = self.capabilities.remove(&key) {
                binding.destroy(host);
                released.push(binding.service().clone());
                report.destroyed += 1;
            }
        }

        let mut seen = BTreeSet::new();
        for property in device.effective_properties() {
            let key = property.key();
            if !seen.insert(key) {
                continue;
            }
            if let Some(binding) = self.properties.get_mut(&key) {
                binding.update(&property, host);
                report.updated += 1;
            } else if let Some(binding) = PropertyBinding::create(&property, &ctx) {
                self.properties.insert(key, binding);
                report.created += 1;
            }
        }
        let gone: Vec<PropertyKey> = self
            .properties
            .keys()
            .filter(|key| !seen.contains(*key))
            .copied()
            .collect();
        for key in gone {
            if let Some(binding) = self.properties.remove(&key) {
                binding.destroy(host);
                released.push(binding.service().clone());
                report.destroyed += 1;
            }
        }

        self.remove_unused_services(released, host);
        self.snapshot = snapshot;

        if report.changed_shape() {
            tracing::debug!(
                created = report.created,
                destroyed = report.destroyed,
                "bindings changed"
            );
        }
        report
    }

    fn remove_unused_services(&self, released: Vec<ServiceHandle>, host: &dyn AccessoryHost) {
        let in_use: BTreeSet<&ServiceHandle> = self
            .capabilities
            .values()
            .map(CapabilityBinding::service)
            .chain(self.properties.values().map(PropertyBinding::service))
            .collect();
        let released: BTreeSet<ServiceHandle> = released.into_iter().collect();
        for service in released.iter().filter(|service| !in_use.contains(service)) {
            host.remove_service(service);
        }
    }

    /// Release every binding and remove the accessory.
    pub fn destroy(self, host: &dyn AccessoryHost) {
        for binding in self.capabilities.values() {
            binding.destroy(host);
        }
        for binding in self.properties.values() {
            binding.destroy(host);
        }
        host.remove_accessory(self.id());
        tracing::info!(device = %self.id(), "accessory removed");
    }

    /// Answer a local read, or `None` when no binding owns the characteristic.
    #[must_use]
    pub fn read(&self, characteristic: &CharacteristicHandle) -> Option<LocalValue> {
        if let Some(binding) = self
            .capabilities
            .values()
            .find(|binding| binding.owns(characteristic))
        {
            return Some(binding.read(characteristic));
        }
        self.properties
            .values()
            .find(|binding| binding.characteristic() == characteristic)
            .map(PropertyBinding::read)
    }

    /// Route a local write to the owning capability binding.
    ///
    /// # Errors
    ///
    /// Returns [`YhkError::InvalidValue`] when the binding rejects the value.
    pub fn write(
        &mut self,
        characteristic: &CharacteristicHandle,
        value: &LocalValue,
        now_ms: i64,
        at: Instant,
    ) -> Result<Option<CapabilityAction>, YhkError> {
        let Some(binding) = self
            .capabilities
            .values_mut()
            .find(|binding| binding.owns(characteristic))
        else {
            tracing::warn!(
                device = %self.snapshot.device.id,
                characteristic = ?characteristic.kind,
                "write to unbound characteristic"
            );
            return Ok(None);
        };
        binding.write(characteristic, value, now_ms, at)
    }

    /// Collect deferred actions that are due at `at`.
    pub fn flush_due(&mut self, at: Instant) -> Vec<CapabilityAction> {
        self.capabilities
            .values_mut()
            .filter_map(|binding| binding.poll_flush(at))
            .collect()
    }

    /// Earliest pending debounce deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.capabilities
            .values()
            .filter_map(CapabilityBinding::next_deadline)
            .min()
    }

    /// Persistable view of the device, with capability states as last
    /// written locally.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        let mut snapshot = self.snapshot.clone();
        for capability in &mut snapshot.device.capabilities {
            if let Some(binding) = self.capabilities.get(&capability.key()) {
                *capability = binding.capability();
            }
        }
        snapshot
    }

    /// Number of live bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.capabilities.len() + self.properties.len()
    }
}
