use yhk_domain::accessory::{CharacteristicHandle, CharacteristicKind, LocalValue, ServiceKind};
use yhk_domain::adapter::{Adapter, RangeAdapter};
use yhk_domain::device::{
    Capability, CapabilityAction, CapabilityEntry, CapabilityState, DeviceType, RangeParameters,
};
use yhk_domain::error::YhkError;

use crate::bindings::{DeviceContext, select};
use crate::ports::{Access, AccessoryHost};

const SERVICES: &[(DeviceType, ServiceKind)] = &[
    (DeviceType::Tv, ServiceKind::Television),
    (DeviceType::Light, ServiceKind::Lightbulb),
];

const BRIGHTNESS: &str = "brightness";

/// Brightness range scaled onto the local percentage.
///
/// Other range instances (volume, channel, temperature setpoints) are not
/// bound.
#[derive(Debug)]
pub struct RangeBinding {
    characteristic: CharacteristicHandle,
    adapter: RangeAdapter,
    entry: CapabilityEntry<RangeParameters, CapabilityState<f64>>,
}

impl RangeBinding {
    pub(super) fn create(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<Self> {
        let Capability::Range(entry) = capability else {
            return None;
        };
        if entry.parameters.instance != BRIGHTNESS {
            return None;
        }
        let service = ctx.host.set_service(
            ctx.accessory,
            select(SERVICES, ctx.device_type, ServiceKind::Lightbulb),
        );
        let characteristic = ctx
            .host
            .characteristic(&service, CharacteristicKind::Brightness);

        let binding = Self {
            characteristic,
            adapter: RangeAdapter::new(entry.parameters.range),
            entry: entry.clone(),
        };
        let initial = binding.read();
        if !initial.is_null() {
            ctx.host.set_value(&binding.characteristic, initial);
        }
        ctx.host.bind(&binding.characteristic, Access::ReadWrite);
        Some(binding)
    }

    pub(super) fn update(
        &mut self,
        entry: &CapabilityEntry<RangeParameters, CapabilityState<f64>>,
        host: &dyn AccessoryHost,
    ) {
        if let Some(state) = &entry.state {
            let local = LocalValue::from(self.adapter.to_local(state.value));
            if host.value(&self.characteristic).as_ref() != Some(&local) {
                host.update_value(&self.characteristic, local);
            }
        }
        self.entry = entry.clone();
    }

    pub(super) fn read(&self) -> LocalValue {
        self.entry.state.as_ref().map_or(LocalValue::Null, |state| {
            self.adapter.to_local(state.value).into()
        })
    }

    pub(super) fn write(&mut self, value: &LocalValue) -> Result<CapabilityAction, YhkError> {
        let remote = self.adapter.to_remote(value.as_f64()?);
        let state = match &mut self.entry.state {
            Some(state) => {
                state.value = remote;
                state.clone()
            }
            None => {
                let state = CapabilityState::new(BRIGHTNESS, remote);
                self.entry.state = Some(state.clone());
                state
            }
        };
        Ok(CapabilityAction::Range(state))
    }

    pub(super) fn characteristic(&self) -> &CharacteristicHandle {
        &self.characteristic
    }

    pub(super) fn entry(&self) -> &CapabilityEntry<RangeParameters, CapabilityState<f64>> {
        &self.entry
    }
}
