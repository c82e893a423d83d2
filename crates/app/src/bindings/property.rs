//! Property bindings — read-only measurements and events.

use yhk_domain::accessory::{CharacteristicHandle, CharacteristicKind, LocalValue, ServiceHandle, ServiceKind};
use yhk_domain::adapter::{
    Adapter, AirQualityAdapter, EventAdapter, LowBatteryAdapter, MotionAdapter, NumberAdapter,
    SwitchEventAdapter, TemperatureAdapter,
};
use yhk_domain::device::{
    DeviceType, EventInstance, EventValue, FloatInstance, Property, PropertyKey,
};
use yhk_domain::time::remote_to_millis;

use super::{DeviceContext, select};
use crate::ports::{Access, AccessoryHost};

#[derive(Debug, Clone, Copy)]
enum AdapterKind {
    Number,
    Temperature,
    AirQuality,
    SwitchEvent,
    Motion,
    LowBattery,
}

/// Where a supported property lands on the accessory.
struct PropertyMapping {
    key: PropertyKey,
    characteristic: CharacteristicKind,
    service: ServiceKind,
    services: &'static [(DeviceType, ServiceKind)],
    adapter: AdapterKind,
}

const fn float(
    instance: FloatInstance,
    characteristic: CharacteristicKind,
    service: ServiceKind,
    adapter: AdapterKind,
) -> PropertyMapping {
    PropertyMapping {
        key: PropertyKey::Float(instance),
        characteristic,
        service,
        services: &[],
        adapter,
    }
}

const fn event(
    instance: EventInstance,
    characteristic: CharacteristicKind,
    service: ServiceKind,
    adapter: AdapterKind,
) -> PropertyMapping {
    PropertyMapping {
        key: PropertyKey::Event(instance),
        characteristic,
        service,
        services: &[],
        adapter,
    }
}

const PROPERTIES: &[PropertyMapping] = &[
    PropertyMapping {
        services: &[
            (DeviceType::Thermostat, ServiceKind::Thermostat),
            (DeviceType::AirConditioner, ServiceKind::HeaterCooler),
        ],
        ..float(
            FloatInstance::Temperature,
            CharacteristicKind::CurrentTemperature,
            ServiceKind::TemperatureSensor,
            AdapterKind::Temperature,
        )
    },
    PropertyMapping {
        services: &[
            (DeviceType::Thermostat, ServiceKind::Thermostat),
            (DeviceType::AirConditioner, ServiceKind::HeaterCooler),
            (DeviceType::Humidifier, ServiceKind::HumidifierDehumidifier),
        ],
        ..float(
            FloatInstance::Humidity,
            CharacteristicKind::CurrentRelativeHumidity,
            ServiceKind::HumiditySensor,
            AdapterKind::Number,
        )
    },
    float(
        FloatInstance::Illumination,
        CharacteristicKind::CurrentAmbientLightLevel,
        ServiceKind::LightSensor,
        AdapterKind::Number,
    ),
    float(
        FloatInstance::Pm2_5Density,
        CharacteristicKind::Pm2_5Density,
        ServiceKind::AirQualitySensor,
        AdapterKind::Number,
    ),
    float(
        FloatInstance::Pm10Density,
        CharacteristicKind::Pm10Density,
        ServiceKind::AirQualitySensor,
        AdapterKind::Number,
    ),
    float(
        FloatInstance::Tvoc,
        CharacteristicKind::VocDensity,
        ServiceKind::AirQualitySensor,
        AdapterKind::Number,
    ),
    float(
        FloatInstance::AirQuality,
        CharacteristicKind::AirQuality,
        ServiceKind::AirQualitySensor,
        AdapterKind::AirQuality,
    ),
    float(
        FloatInstance::BatteryLevel,
        CharacteristicKind::BatteryLevel,
        ServiceKind::Battery,
        AdapterKind::Number,
    ),
    event(
        EventInstance::Button,
        CharacteristicKind::ProgrammableSwitchEvent,
        ServiceKind::StatelessProgrammableSwitch,
        AdapterKind::SwitchEvent,
    ),
    event(
        EventInstance::Motion,
        CharacteristicKind::MotionDetected,
        ServiceKind::MotionSensor,
        AdapterKind::Motion,
    ),
    PropertyMapping {
        services: &[
            (DeviceType::SmokeSensor, ServiceKind::SmokeSensor),
            (DeviceType::MotionSensor, ServiceKind::MotionSensor),
            (DeviceType::IlluminationSensor, ServiceKind::LightSensor),
            (DeviceType::WaterLeakSensor, ServiceKind::LeakSensor),
        ],
        ..event(
            EventInstance::BatteryLevel,
            CharacteristicKind::StatusLowBattery,
            ServiceKind::MotionSensor,
            AdapterKind::LowBattery,
        )
    },
];

fn mapping_for(key: PropertyKey) -> Option<&'static PropertyMapping> {
    PROPERTIES.iter().find(|mapping| mapping.key == key)
}

/// Whether a property of this kind can be bound at all.
#[must_use]
pub fn is_supported(key: PropertyKey) -> bool {
    mapping_for(key).is_some()
}

impl AdapterKind {
    fn float_to_local(self, property: &Property, value: f64) -> LocalValue {
        match self {
            Self::Temperature => {
                let unit = match property {
                    Property::Float(entry) => entry.parameters.unit.as_deref(),
                    Property::Event(_) => None,
                };
                TemperatureAdapter::from_unit(unit).to_local(value).into()
            }
            Self::AirQuality => AirQualityAdapter.to_local(value).into(),
            _ => NumberAdapter.to_local(value).into(),
        }
    }

    fn event_to_local(self, value: EventValue, changed: bool) -> LocalValue {
        match self {
            Self::SwitchEvent => SwitchEventAdapter.to_local(value, changed).into(),
            Self::Motion => MotionAdapter.to_local(value, changed).into(),
            Self::LowBattery => LowBatteryAdapter.to_local(value, changed).into(),
            _ => LocalValue::Null,
        }
    }
}

/// Binding of one remote property to one local characteristic.
///
/// Properties are never written locally; the characteristic only forwards
/// reads. Event properties additionally track the last event time so that
/// an event is only replayed when it actually happened again.
#[derive(Debug)]
pub struct PropertyBinding {
    characteristic: CharacteristicHandle,
    adapter: AdapterKind,
    property: Property,
    last_event_ms: i64,
}

impl PropertyBinding {
    /// Claim the service and characteristic for `property`, seed its value
    /// and start forwarding reads.
    ///
    /// Returns `None` for property kinds without a local counterpart.
    pub fn create(property: &Property, ctx: &DeviceContext<'_>) -> Option<Self> {
        let mapping = mapping_for(property.key())?;
        let service = ctx.host.set_service(
            ctx.accessory,
            select(mapping.services, ctx.device_type, mapping.service),
        );
        let characteristic = ctx.host.characteristic(&service, mapping.characteristic);

        let last_event_ms = match property {
            Property::Event(entry) if entry.state.is_some() => {
                remote_to_millis(entry.state_changed_at)
            }
            _ => 0,
        };
        let binding = Self {
            characteristic,
            adapter: mapping.adapter,
            property: property.clone(),
            last_event_ms,
        };

        let initial = binding.read();
        if !initial.is_null() {
            ctx.host.set_value(&binding.characteristic, initial);
        }
        ctx.host.bind(&binding.characteristic, Access::Read);

        tracing::debug!(
            accessory = %ctx.accessory,
            characteristic = ?mapping.characteristic,
            "property bound"
        );
        Some(binding)
    }

    /// Apply a freshly fetched copy of the property.
    pub fn update(&mut self, property: &Property, host: &dyn AccessoryHost) {
        match property {
            Property::Float(entry) => {
                if let Some(state) = &entry.state {
                    let local = self.adapter.float_to_local(property, state.value);
                    if host.value(&self.characteristic).as_ref() != Some(&local) {
                        host.update_value(&self.characteristic, local);
                    }
                }
            }
            Property::Event(entry) => {
                let time_ms = remote_to_millis(property.updated_at());
                if let Some(state) = &entry.state {
                    let previous = match &self.property {
                        Property::Event(held) => held.state.as_ref().map(|held| held.value),
                        Property::Float(_) => None,
                    };
                    let changed = previous != Some(state.value) || time_ms > self.last_event_ms;
                    host.update_value(
                        &self.characteristic,
                        self.adapter.event_to_local(state.value, changed),
                    );
                }
                self.last_event_ms = time_ms;
            }
        }
        self.property = property.clone();
    }

    /// Current local value, `Null` when the property carries no state.
    #[must_use]
    pub fn read(&self) -> LocalValue {
        match &self.property {
            Property::Float(entry) => entry.state.as_ref().map_or(LocalValue::Null, |state| {
                self.adapter.float_to_local(&self.property, state.value)
            }),
            Property::Event(entry) => entry.state.as_ref().map_or(LocalValue::Null, |state| {
                self.adapter.event_to_local(state.value, true)
            }),
        }
    }

    /// Stop forwarding reads.
    pub fn destroy(&self, host: &dyn AccessoryHost) {
        host.unbind(&self.characteristic);
    }

    #[must_use]
    pub fn characteristic(&self) -> &CharacteristicHandle {
        &self.characteristic
    }

    #[must_use]
    pub fn service(&self) -> &ServiceHandle {
        &self.characteristic.service
    }

    /// The held property record.
    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceConfig;
    use crate::testing::RecordingHost;
    use yhk_domain::id::DeviceId;

    fn ctx<'a>(host: &'a RecordingHost, id: &'a DeviceId, device_type: DeviceType) -> DeviceContext<'a> {
        DeviceContext {
            host,
            accessory: id,
            device_type,
            debounce: DebounceConfig::default(),
        }
    }

    #[test]
    fn should_convert_kelvin_temperature_on_creation() {
        let host = RecordingHost::default();
        let id = DeviceId::from("d1");
        let property = Property::float(
            FloatInstance::Temperature,
            "unit.temperature.kelvin",
            300.0,
            10.0,
        );

        let binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::ClimateSensor)).unwrap();

        let value = host
            .value_of("d1", ServiceKind::TemperatureSensor, CharacteristicKind::CurrentTemperature)
            .unwrap();
        let LocalValue::Float(celsius) = value else {
            panic!("expected a float, got {value:?}");
        };
        assert!((celsius - 26.85).abs() < 1e-9);
        assert_eq!(host.state().bound.get(binding.characteristic()), Some(&Access::Read));
    }

    #[test]
    fn should_place_temperature_on_heater_cooler_for_air_conditioners() {
        let host = RecordingHost::default();
        let id = DeviceId::from("ac");
        let property = Property::float(FloatInstance::Temperature, "unit.temperature.celsius", 22.0, 1.0);

        let binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::AirConditioner)).unwrap();

        assert_eq!(binding.service().kind, ServiceKind::HeaterCooler);
    }

    #[test]
    fn should_skip_unsupported_properties() {
        let host = RecordingHost::default();
        let id = DeviceId::from("d1");
        let property = Property::float(FloatInstance::Voltage, "unit.volt", 220.0, 1.0);

        assert!(PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::Socket)).is_none());
        assert!(host.state().services.is_empty());
    }

    #[test]
    fn should_push_float_only_when_value_changes() {
        let host = RecordingHost::default();
        let id = DeviceId::from("d1");
        let property = Property::float(FloatInstance::Humidity, "unit.percent", 40.0, 1.0);
        let mut binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::ClimateSensor)).unwrap();

        binding.update(&property, &host);
        assert_eq!(host.updates_len(), 0);

        let changed = Property::float(FloatInstance::Humidity, "unit.percent", 45.0, 2.0);
        binding.update(&changed, &host);
        assert_eq!(host.updates_len(), 1);
        assert_eq!(binding.read(), LocalValue::Float(45.0));
    }

    #[test]
    fn should_quantize_air_quality_to_int() {
        let host = RecordingHost::default();
        let id = DeviceId::from("d1");
        let property = Property::float(FloatInstance::AirQuality, "unit.ppm", 0.8, 1.0);

        let binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::ClimateSensor)).unwrap();

        assert_eq!(binding.read(), LocalValue::Int(4));
    }

    #[test]
    fn should_seed_button_event_and_suppress_replay() {
        let host = RecordingHost::default();
        let id = DeviceId::from("b1");
        let press = Property::event(EventInstance::Button, EventValue::Click, 100.0);
        let mut binding =
            PropertyBinding::create(&press, &ctx(&host, &id, DeviceType::ButtonSensor)).unwrap();
        assert_eq!(binding.read(), LocalValue::Int(0));

        // same event, same timestamp: nothing new to report
        binding.update(&press, &host);
        assert!(host.state().updates.is_empty());

        // same value, later timestamp: a new press
        let again = Property::event(EventInstance::Button, EventValue::Click, 101.0);
        binding.update(&again, &host);
        assert_eq!(host.state().updates.last().map(|(_, v)| v.clone()), Some(LocalValue::Int(0)));

        // different value, same timestamp
        let double = Property::event(EventInstance::Button, EventValue::DoubleClick, 101.0);
        binding.update(&double, &host);
        assert_eq!(host.state().updates.last().map(|(_, v)| v.clone()), Some(LocalValue::Int(1)));
        assert_eq!(host.updates_len(), 2);
    }

    #[test]
    fn should_route_low_battery_by_sensor_type() {
        let host = RecordingHost::default();
        let id = DeviceId::from("leak");
        let property = Property::event(EventInstance::BatteryLevel, EventValue::Low, 5.0);

        let binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::WaterLeakSensor)).unwrap();
        assert_eq!(binding.service().kind, ServiceKind::LeakSensor);
        assert_eq!(binding.read(), LocalValue::Int(1));

        let other = DeviceId::from("plain");
        let binding =
            PropertyBinding::create(&property, &ctx(&host, &other, DeviceType::Sensor)).unwrap();
        assert_eq!(binding.service().kind, ServiceKind::MotionSensor);
    }

    #[test]
    fn should_unbind_on_destroy() {
        let host = RecordingHost::default();
        let id = DeviceId::from("m1");
        let property = Property::event(EventInstance::Motion, EventValue::Detected, 5.0);
        let binding =
            PropertyBinding::create(&property, &ctx(&host, &id, DeviceType::MotionSensor)).unwrap();

        binding.destroy(&host);

        assert_eq!(host.state().unbinds, 1);
        assert!(host.state().bound.is_empty());
    }
}
