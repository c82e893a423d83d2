//! Accessory host port — the local accessory tree the bindings write into.
//!
//! The host owns services and characteristics and stores their values. It
//! never calls back into the core directly: reads and writes coming from
//! local controllers on a bound characteristic are forwarded as
//! [`LocalRequest`] messages, which the controller answers on its own task.

use tokio::sync::oneshot;

use yhk_domain::accessory::{
    AccessoryInfo, CharacteristicHandle, CharacteristicKind, LocalValue, ServiceHandle,
    ServiceKind,
};
use yhk_domain::error::YhkError;
use yhk_domain::id::DeviceId;

/// Which local operations a bound characteristic forwards to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
}

/// Local object model exposing devices as accessories.
///
/// Every method is synchronous and cheap; implementations keep their state
/// in memory and push it to the exposure protocol on their own schedule.
pub trait AccessoryHost: Send + Sync {
    /// Create the accessory for a device, or refresh its metadata.
    fn publish_accessory(&self, info: &AccessoryInfo);

    /// Remove the accessory and everything under it.
    fn remove_accessory(&self, accessory: &DeviceId);

    /// Return the service of `kind` on the accessory, creating it if missing.
    fn set_service(&self, accessory: &DeviceId, kind: ServiceKind) -> ServiceHandle;

    /// Remove a service and its characteristics.
    fn remove_service(&self, service: &ServiceHandle);

    /// Return the characteristic of `kind` on the service, creating it if missing.
    fn characteristic(
        &self,
        service: &ServiceHandle,
        kind: CharacteristicKind,
    ) -> CharacteristicHandle;

    /// Store a value without notifying subscribed controllers.
    fn set_value(&self, characteristic: &CharacteristicHandle, value: LocalValue);

    /// Store a value and notify subscribed controllers. `Null` is ignored.
    fn update_value(&self, characteristic: &CharacteristicHandle, value: LocalValue);

    /// Last stored value.
    fn value(&self, characteristic: &CharacteristicHandle) -> Option<LocalValue>;

    /// Start forwarding local operations on the characteristic.
    fn bind(&self, characteristic: &CharacteristicHandle, access: Access);

    /// Stop forwarding local operations on the characteristic.
    fn unbind(&self, characteristic: &CharacteristicHandle);
}

/// A local operation forwarded by the host to the core.
#[derive(Debug)]
pub enum LocalRequest {
    /// A controller reads a bound characteristic.
    Read {
        characteristic: CharacteristicHandle,
        reply: oneshot::Sender<Option<LocalValue>>,
    },
    /// A controller writes a bound characteristic. `ack` answers once the
    /// owning binding has applied or rejected the value.
    Write {
        characteristic: CharacteristicHandle,
        value: LocalValue,
        ack: oneshot::Sender<Result<(), YhkError>>,
    },
}

impl<T: AccessoryHost + ?Sized> AccessoryHost for std::sync::Arc<T> {
    fn publish_accessory(&self, info: &AccessoryInfo) {
        (**self).publish_accessory(info);
    }

    fn remove_accessory(&self, accessory: &DeviceId) {
        (**self).remove_accessory(accessory);
    }

    fn set_service(&self, accessory: &DeviceId, kind: ServiceKind) -> ServiceHandle {
        (**self).set_service(accessory, kind)
    }

    fn remove_service(&self, service: &ServiceHandle) {
        (**self).remove_service(service);
    }

    fn characteristic(
        &self,
        service: &ServiceHandle,
        kind: CharacteristicKind,
    ) -> CharacteristicHandle {
        (**self).characteristic(service, kind)
    }

    fn set_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        (**self).set_value(characteristic, value);
    }

    fn update_value(&self, characteristic: &CharacteristicHandle, value: LocalValue) {
        (**self).update_value(characteristic, value);
    }

    fn value(&self, characteristic: &CharacteristicHandle) -> Option<LocalValue> {
        (**self).value(characteristic)
    }

    fn bind(&self, characteristic: &CharacteristicHandle, access: Access) {
        (**self).bind(characteristic, access);
    }

    fn unbind(&self, characteristic: &CharacteristicHandle) {
        (**self).unbind(characteristic);
    }
}
