//! Bindings between remote capabilities/properties and local characteristics.
//!
//! A binding owns the held copy of its capability or property, the adapter
//! configured from its parameters, and the characteristics it claimed on the
//! accessory host. Inbound updates (from a fetch) and outbound writes (from
//! local controllers) both go through the binding, which is the only place
//! that mutates the held value.

pub mod capability;
pub mod property;

pub use capability::CapabilityBinding;
pub use property::PropertyBinding;

use yhk_domain::device::DeviceType;
use yhk_domain::id::DeviceId;

use crate::debounce::DebounceConfig;
use crate::ports::AccessoryHost;

/// Per-device inputs shared by every binding of that device.
pub struct DeviceContext<'a> {
    pub host: &'a dyn AccessoryHost,
    pub accessory: &'a DeviceId,
    pub device_type: DeviceType,
    pub debounce: DebounceConfig,
}

/// Pick the entry for `device_type` from an override table, or `default`.
fn select<T: Copy>(table: &[(DeviceType, T)], device_type: DeviceType, default: T) -> T {
    table
        .iter()
        .find(|(kind, _)| *kind == device_type)
        .map_or(default, |(_, value)| *value)
}
