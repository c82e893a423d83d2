//! Capability bindings — controllable facets, writable from both sides.

mod color_setting;
mod on_off;
mod range;

pub use color_setting::ColorSettingBinding;
pub use on_off::OnOffBinding;
pub use range::RangeBinding;

use tokio::time::Instant;

use yhk_domain::accessory::{CharacteristicHandle, LocalValue, ServiceHandle};
use yhk_domain::device::{Capability, CapabilityAction, CapabilityType};
use yhk_domain::error::YhkError;

use super::DeviceContext;
use crate::ports::AccessoryHost;

type Factory = fn(&Capability, &DeviceContext<'_>) -> Option<CapabilityBinding>;

/// Capability types with a local counterpart.
const FACTORIES: &[(CapabilityType, Factory)] = &[
    (CapabilityType::OnOff, on_off),
    (CapabilityType::Range, range),
    (CapabilityType::ColorSetting, color_setting),
];

fn on_off(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<CapabilityBinding> {
    OnOffBinding::create(capability, ctx).map(CapabilityBinding::OnOff)
}

fn range(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<CapabilityBinding> {
    RangeBinding::create(capability, ctx).map(CapabilityBinding::Range)
}

fn color_setting(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<CapabilityBinding> {
    ColorSettingBinding::create(capability, ctx).map(CapabilityBinding::ColorSetting)
}

/// A live capability binding.
#[derive(Debug)]
pub enum CapabilityBinding {
    OnOff(OnOffBinding),
    Range(RangeBinding),
    ColorSetting(ColorSettingBinding),
}

impl CapabilityBinding {
    /// Bind `capability`, or `None` when its type or instance has no local
    /// counterpart.
    pub fn create(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<Self> {
        let kind = capability.kind();
        let (_, factory) = FACTORIES.iter().find(|(supported, _)| *supported == kind)?;
        factory(capability, ctx)
    }

    /// Apply a freshly fetched copy of the capability.
    ///
    /// `now_ms` is the local clock, used by bindings that arbitrate between
    /// local writes and remote echoes.
    pub fn update(&mut self, capability: &Capability, host: &dyn AccessoryHost, now_ms: i64) {
        match (self, capability) {
            (Self::OnOff(binding), Capability::OnOff(entry)) => binding.update(entry, host),
            (Self::Range(binding), Capability::Range(entry)) => binding.update(entry, host),
            (Self::ColorSetting(binding), Capability::ColorSetting(entry)) => {
                binding.update(entry, host, now_ms);
            }
            (binding, capability) => {
                tracing::warn!(
                    expected = ?binding.capability().kind(),
                    got = ?capability.kind(),
                    "capability type changed under binding, ignoring update"
                );
            }
        }
    }

    /// Answer a local read of one of the owned characteristics.
    #[must_use]
    pub fn read(&self, characteristic: &CharacteristicHandle) -> LocalValue {
        match self {
            Self::OnOff(binding) => binding.read(),
            Self::Range(binding) => binding.read(),
            Self::ColorSetting(binding) => binding.read(characteristic),
        }
    }

    /// Apply a local write.
    ///
    /// Returns the action to send right away, or `None` when the write is
    /// deferred (see [`CapabilityBinding::poll_flush`]).
    ///
    /// # Errors
    ///
    /// Returns [`YhkError::InvalidValue`] when the value has the wrong shape
    /// for the characteristic.
    pub fn write(
        &mut self,
        characteristic: &CharacteristicHandle,
        value: &LocalValue,
        now_ms: i64,
        at: Instant,
    ) -> Result<Option<CapabilityAction>, YhkError> {
        match self {
            Self::OnOff(binding) => binding.write(value).map(Some),
            Self::Range(binding) => binding.write(value).map(Some),
            Self::ColorSetting(binding) => {
                binding.write(characteristic, value, now_ms, at)?;
                Ok(None)
            }
        }
    }

    /// Take the deferred action if its debounce deadline passed.
    pub fn poll_flush(&mut self, at: Instant) -> Option<CapabilityAction> {
        match self {
            Self::ColorSetting(binding) => binding.poll_flush(at),
            Self::OnOff(_) | Self::Range(_) => None,
        }
    }

    /// When a deferred action becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self {
            Self::ColorSetting(binding) => binding.next_deadline(),
            Self::OnOff(_) | Self::Range(_) => None,
        }
    }

    #[must_use]
    pub fn owns(&self, characteristic: &CharacteristicHandle) -> bool {
        self.characteristics().any(|owned| owned == characteristic)
    }

    pub fn characteristics(&self) -> impl Iterator<Item = &CharacteristicHandle> {
        let owned: &[CharacteristicHandle] = match self {
            Self::OnOff(binding) => std::slice::from_ref(binding.characteristic()),
            Self::Range(binding) => std::slice::from_ref(binding.characteristic()),
            Self::ColorSetting(binding) => binding.characteristics(),
        };
        owned.iter()
    }

    #[must_use]
    pub fn service(&self) -> &ServiceHandle {
        match self {
            Self::OnOff(binding) => &binding.characteristic().service,
            Self::Range(binding) => &binding.characteristic().service,
            Self::ColorSetting(binding) => binding.service(),
        }
    }

    /// The held capability record, including local write-through.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::OnOff(binding) => Capability::OnOff(binding.entry().clone()),
            Self::Range(binding) => Capability::Range(binding.entry().clone()),
            Self::ColorSetting(binding) => Capability::ColorSetting(binding.entry().clone()),
        }
    }

    /// Stop forwarding local operations. A deferred action is dropped.
    pub fn destroy(&self, host: &dyn AccessoryHost) {
        for characteristic in self.characteristics() {
            host.unbind(characteristic);
        }
    }
}
