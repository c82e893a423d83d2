//! Device — a remote smart-home device as reported by the platform.
//!
//! The listing returned by the platform contains households, rooms, devices,
//! groups and scenarios. Only devices and rooms drive reconciliation; the rest
//! is decoded so the full payload round-trips.

pub mod capability;
pub mod property;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::{DeviceId, HouseholdId, RoomId};

pub use capability::{
    Capability, CapabilityAction, CapabilityEntry, CapabilityKey, CapabilityState, CapabilityType,
    ColorModel, ColorSettingParameters, ColorState, Hsv, OnOffParameters, RangeParameters,
    ToggleParameters, ValueRange,
};
pub use property::{
    EventInstance, EventParameters, EventState, EventValue, FloatInstance, FloatParameters,
    FloatState, Property, PropertyEntry, PropertyKey,
};

/// Device category as reported by the platform.
///
/// Unknown categories decode as [`DeviceType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "devices.types.camera")]
    Camera,
    #[serde(rename = "devices.types.cooking")]
    Cooking,
    #[serde(rename = "devices.types.cooking.coffee_maker")]
    CoffeeMaker,
    #[serde(rename = "devices.types.cooking.kettle")]
    Kettle,
    #[serde(rename = "devices.types.cooking.multicooker")]
    Multicooker,
    #[serde(rename = "devices.types.dishwasher")]
    Dishwasher,
    #[serde(rename = "devices.types.hub")]
    Hub,
    #[serde(rename = "devices.types.humidifier")]
    Humidifier,
    #[serde(rename = "devices.types.iron")]
    Iron,
    #[serde(rename = "devices.types.light")]
    Light,
    #[serde(rename = "devices.types.media_device")]
    MediaDevice,
    #[serde(rename = "devices.types.media_device.receiver")]
    Receiver,
    #[serde(rename = "devices.types.media_device.tv")]
    Tv,
    #[serde(rename = "devices.types.media_device.tv_box")]
    TvBox,
    #[serde(rename = "devices.types.openable")]
    Openable,
    #[serde(rename = "devices.types.openable.curtain")]
    Curtain,
    #[serde(rename = "devices.types.pet_drinking_fountain")]
    PetDrinkingFountain,
    #[serde(rename = "devices.types.pet_feeder")]
    PetFeeder,
    #[serde(rename = "devices.types.purifier")]
    Purifier,
    #[serde(rename = "devices.types.sensor")]
    Sensor,
    #[serde(rename = "devices.types.sensor.button")]
    ButtonSensor,
    #[serde(rename = "devices.types.sensor.climate")]
    ClimateSensor,
    #[serde(rename = "devices.types.sensor.gas")]
    GasSensor,
    #[serde(rename = "devices.types.sensor.illumination")]
    IlluminationSensor,
    #[serde(rename = "devices.types.sensor.motion")]
    MotionSensor,
    #[serde(rename = "devices.types.sensor.open")]
    OpenSensor,
    #[serde(rename = "devices.types.sensor.smoke")]
    SmokeSensor,
    #[serde(rename = "devices.types.sensor.vibration")]
    VibrationSensor,
    #[serde(rename = "devices.types.sensor.water_leak")]
    WaterLeakSensor,
    #[serde(rename = "devices.types.smart_meter")]
    SmartMeter,
    #[serde(rename = "devices.types.smart_meter.cold_water")]
    ColdWaterMeter,
    #[serde(rename = "devices.types.smart_meter.electricity")]
    ElectricityMeter,
    #[serde(rename = "devices.types.smart_meter.gas")]
    GasMeter,
    #[serde(rename = "devices.types.smart_meter.heat")]
    HeatMeter,
    #[serde(rename = "devices.types.smart_meter.hot_water")]
    HotWaterMeter,
    #[serde(rename = "devices.types.socket")]
    Socket,
    #[serde(rename = "devices.types.switch")]
    Switch,
    #[serde(rename = "devices.types.thermostat")]
    Thermostat,
    #[serde(rename = "devices.types.thermostat.ac")]
    AirConditioner,
    #[serde(rename = "devices.types.vacuum_cleaner")]
    VacuumCleaner,
    #[serde(rename = "devices.types.washing_machine")]
    WashingMachine,
    #[serde(rename = "devices.types.other", other)]
    Other,
}

impl DeviceType {
    /// Whether this type is one of the `devices.types.sensor*` family.
    #[must_use]
    pub fn is_sensor(self) -> bool {
        matches!(
            self,
            Self::Sensor
                | Self::ButtonSensor
                | Self::ClimateSensor
                | Self::GasSensor
                | Self::IlluminationSensor
                | Self::MotionSensor
                | Self::OpenSensor
                | Self::SmokeSensor
                | Self::VibrationSensor
                | Self::WaterLeakSensor
        )
    }
}

/// A device as listed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub skill_id: String,
    #[serde(default)]
    pub household_id: Option<HouseholdId>,
    #[serde(default)]
    pub room: Option<RoomId>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, deserialize_with = "skip_unknown")]
    pub capabilities: Vec<Capability>,
    #[serde(default, deserialize_with = "skip_unknown")]
    pub properties: Vec<Property>,
}

impl Device {
    /// Create a device with no capabilities or properties.
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type,
            aliases: Vec::new(),
            external_id: String::new(),
            skill_id: String::new(),
            household_id: None,
            room: None,
            groups: Vec::new(),
            capabilities: Vec::new(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_room(mut self, room: impl Into<RoomId>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Properties as exposed locally, including a synthesized `air_quality`
    /// reading when the platform only reports its components.
    ///
    /// The derived value is the mean of the available particulate and gas
    /// measurements (each divided by 1000), stamped with the latest timestamp
    /// among those measurements.
    #[must_use]
    pub fn effective_properties(&self) -> Vec<Property> {
        let mut properties = self.properties.clone();
        let has_air_quality = properties
            .iter()
            .any(|prop| prop.key() == PropertyKey::Float(FloatInstance::AirQuality));
        if has_air_quality {
            return properties;
        }

        let mut sum = 0.0;
        let mut count = 0_u32;
        let mut last_updated = 0.0_f64;
        let mut state_changed_at = 0.0_f64;
        for prop in &self.properties {
            let Property::Float(entry) = prop else {
                continue;
            };
            if !entry.parameters.instance.is_air_component() {
                continue;
            }
            let Some(state) = &entry.state else {
                continue;
            };
            sum += state.value / 1000.0;
            count += 1;
            last_updated = last_updated.max(entry.last_updated);
            state_changed_at = state_changed_at.max(entry.state_changed_at);
        }

        if count > 0 {
            let mut derived = Property::float(
                FloatInstance::AirQuality,
                "unit.percent",
                sum / f64::from(count),
                last_updated,
            );
            if let Property::Float(entry) = &mut derived {
                entry.retrievable = false;
                entry.state_changed_at = state_changed_at;
            }
            properties.push(derived);
        }
        properties
    }
}

/// A room inside a household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub household_id: Option<HouseholdId>,
    #[serde(default)]
    pub devices: Vec<DeviceId>,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            household_id: None,
            devices: Vec::new(),
        }
    }
}

/// A household (a "home" on the platform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A user-defined device group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub household_id: Option<HouseholdId>,
    #[serde(default)]
    pub devices: Vec<DeviceId>,
}

/// A user-defined scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Full listing returned by the platform's `user/info` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub households: Vec<Household>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl UserInfo {
    /// Find the room a device belongs to.
    #[must_use]
    pub fn room_of(&self, device: &Device) -> Option<&Room> {
        let room_id = device.room.as_ref()?;
        self.rooms.iter().find(|room| &room.id == room_id)
    }
}

/// A persisted pair of device and room, as written to the snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device: Device,
    #[serde(default)]
    pub room: Option<Room>,
}

/// Outbound batch of capability changes for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceActions {
    pub id: DeviceId,
    pub actions: Vec<CapabilityAction>,
}

/// Decode a list, dropping entries the model does not know about.
fn skip_unknown<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let tag = item
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(err) if is_unsupported(&err) => {
                    tracing::trace!(kind = %tag, error = %err, "skipping unsupported entry");
                    None
                }
                Err(err) => {
                    tracing::warn!(kind = %tag, error = %err, "dropping malformed entry");
                    None
                }
            }
        })
        .collect())
}

/// Whether a decode failure comes from a type tag or instance this model
/// does not know, as opposed to a malformed entry of a known kind.
fn is_unsupported(err: &serde_json::Error) -> bool {
    err.is_data() && err.to_string().contains("unknown variant")
}
