use yhk_domain::accessory::{ActiveState, CharacteristicHandle, CharacteristicKind, LocalValue, ServiceKind};
use yhk_domain::adapter::{ActiveAdapter, Adapter, BooleanAdapter};
use yhk_domain::device::{
    Capability, CapabilityAction, CapabilityEntry, CapabilityState, DeviceType, OnOffParameters,
};
use yhk_domain::error::YhkError;

use crate::bindings::{DeviceContext, select};
use crate::ports::{Access, AccessoryHost};

const SERVICES: &[(DeviceType, ServiceKind)] = &[
    (DeviceType::AirConditioner, ServiceKind::HeaterCooler),
    (DeviceType::Tv, ServiceKind::Television),
    (DeviceType::Socket, ServiceKind::Outlet),
    (DeviceType::Light, ServiceKind::Lightbulb),
    (DeviceType::Purifier, ServiceKind::AirPurifier),
];

/// Device types whose power is exposed through `Active` instead of `On`.
const ACTIVE_TYPES: &[DeviceType] = &[DeviceType::AirConditioner, DeviceType::Tv, DeviceType::Purifier];

const DEFAULT_INSTANCE: &str = "on";

#[derive(Debug, Clone, Copy)]
enum Power {
    On(BooleanAdapter),
    Active(ActiveAdapter),
}

impl Power {
    fn to_local(self, value: bool) -> LocalValue {
        match self {
            Self::On(adapter) => adapter.to_local(value).into(),
            Self::Active(adapter) => adapter.to_local(value).into(),
        }
    }

    fn to_remote(self, value: &LocalValue) -> Result<bool, YhkError> {
        Ok(match self {
            Self::On(adapter) => adapter.to_remote(value.as_bool()?),
            Self::Active(adapter) => adapter.to_remote(ActiveState::try_from(value)?),
        })
    }
}

/// Power switch on a service chosen by device type.
#[derive(Debug)]
pub struct OnOffBinding {
    characteristic: CharacteristicHandle,
    power: Power,
    entry: CapabilityEntry<OnOffParameters, CapabilityState<bool>>,
}

impl OnOffBinding {
    pub(super) fn create(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<Self> {
        let Capability::OnOff(entry) = capability else {
            return None;
        };
        let (power, kind) = if ACTIVE_TYPES.contains(&ctx.device_type) {
            (Power::Active(ActiveAdapter), CharacteristicKind::Active)
        } else {
            (Power::On(BooleanAdapter), CharacteristicKind::On)
        };
        let service = ctx.host.set_service(
            ctx.accessory,
            select(SERVICES, ctx.device_type, ServiceKind::Switch),
        );
        let characteristic = ctx.host.characteristic(&service, kind);

        let binding = Self {
            characteristic,
            power,
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
        entry: &CapabilityEntry<OnOffParameters, CapabilityState<bool>>,
        host: &dyn AccessoryHost,
    ) {
        if let Some(state) = &entry.state {
            let local = self.power.to_local(state.value);
            if host.value(&self.characteristic).as_ref() != Some(&local) {
                host.update_value(&self.characteristic, local);
            }
        }
        self.entry = entry.clone();
    }

    pub(super) fn read(&self) -> LocalValue {
        self.entry
            .state
            .as_ref()
            .map_or(LocalValue::Null, |state| self.power.to_local(state.value))
    }

    pub(super) fn write(&mut self, value: &LocalValue) -> Result<CapabilityAction, YhkError> {
        let remote = self.power.to_remote(value)?;
        let state = match &mut self.entry.state {
            Some(state) => {
                state.value = remote;
                state.clone()
            }
            None => {
                let state = CapabilityState::new(DEFAULT_INSTANCE, remote);
                self.entry.state = Some(state.clone());
                state
            }
        };
        Ok(CapabilityAction::OnOff(state))
    }

    pub(super) fn characteristic(&self) -> &CharacteristicHandle {
        &self.characteristic
    }

    pub(super) fn entry(&self) -> &CapabilityEntry<OnOffParameters, CapabilityState<bool>> {
        &self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceConfig;
    use crate::testing::RecordingHost;
    use yhk_domain::id::DeviceId;

    fn on_off(value: Option<bool>) -> Capability {
        Capability::OnOff(CapabilityEntry::new(
            OnOffParameters::default(),
            value.map(|value| CapabilityState::new("on", value)),
            10.0,
        ))
    }

    fn create(host: &RecordingHost, device_type: DeviceType, capability: &Capability) -> OnOffBinding {
        let id = DeviceId::from("d1");
        let ctx = DeviceContext {
            host,
            accessory: &id,
            device_type,
            debounce: DebounceConfig::default(),
        };
        OnOffBinding::create(capability, &ctx).unwrap()
    }

    #[test]
    fn should_expose_air_conditioner_power_as_active() {
        let host = RecordingHost::default();
        create(&host, DeviceType::AirConditioner, &on_off(Some(true)));

        assert_eq!(
            host.value_of("d1", ServiceKind::HeaterCooler, CharacteristicKind::Active),
            Some(LocalValue::Int(1))
        );
    }

    #[test]
    fn should_default_to_switch_service() {
        let host = RecordingHost::default();
        let binding = create(&host, DeviceType::Kettle, &on_off(Some(false)));

        assert_eq!(binding.characteristic().service.kind, ServiceKind::Switch);
        assert_eq!(binding.read(), LocalValue::Bool(false));
    }

    #[test]
    fn should_write_through_and_build_action() {
        let host = RecordingHost::default();
        let mut binding = create(&host, DeviceType::Light, &on_off(Some(false)));

        let action = binding.write(&LocalValue::Bool(true)).unwrap();

        assert_eq!(action, CapabilityAction::OnOff(CapabilityState::new("on", true)));
        assert_eq!(binding.read(), LocalValue::Bool(true));
    }

    #[test]
    fn should_translate_active_writes() {
        let host = RecordingHost::default();
        let mut binding = create(&host, DeviceType::Purifier, &on_off(None));
        assert!(binding.read().is_null());

        let action = binding.write(&LocalValue::Int(0)).unwrap();
        assert_eq!(action, CapabilityAction::OnOff(CapabilityState::new("on", false)));
        assert!(binding.write(&LocalValue::Int(7)).is_err());
    }

    #[test]
    fn should_reject_wrongly_shaped_writes() {
        let host = RecordingHost::default();
        let mut binding = create(&host, DeviceType::Socket, &on_off(Some(true)));

        let result = binding.write(&LocalValue::Text("yes".into()));

        assert!(matches!(result, Err(YhkError::InvalidValue(_))));
        assert_eq!(binding.read(), LocalValue::Bool(true));
    }

    #[test]
    fn should_push_remote_change_once() {
        let host = RecordingHost::default();
        let mut binding = create(&host, DeviceType::Socket, &on_off(Some(false)));
        let Capability::OnOff(entry) = on_off(Some(true)) else {
            unreachable!()
        };

        binding.update(&entry, &host);
        binding.update(&entry, &host);

        assert_eq!(host.updates_len(), 1);
        assert_eq!(binding.read(), LocalValue::Bool(true));
    }
}
