//! Accessory — the local representation of a device.
//!
//! An accessory owns services, each service owns characteristics. Values
//! flowing through characteristics are [`LocalValue`]s; the typed local
//! enumerations below convert into them.

pub mod identity;

use serde::Serialize;
use uuid::Uuid;

use crate::device::{Device, DeviceType, Room};
use crate::error::InvalidValueError;
use crate::id::DeviceId;

/// Local service kinds used by the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ServiceKind {
    AirPurifier,
    AirQualitySensor,
    Battery,
    HeaterCooler,
    HumidifierDehumidifier,
    HumiditySensor,
    LeakSensor,
    LightSensor,
    Lightbulb,
    MotionSensor,
    Outlet,
    SmokeSensor,
    StatelessProgrammableSwitch,
    Switch,
    Television,
    TemperatureSensor,
    Thermostat,
}

/// Local characteristic kinds used by the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CharacteristicKind {
    Active,
    AirQuality,
    BatteryLevel,
    Brightness,
    ColorTemperature,
    CurrentAmbientLightLevel,
    CurrentRelativeHumidity,
    CurrentTemperature,
    Hue,
    MotionDetected,
    On,
    Pm10Density,
    Pm2_5Density,
    ProgrammableSwitchEvent,
    Saturation,
    StatusLowBattery,
    VocDensity,
}

/// Address of a service on an accessory. A service kind appears at most once
/// per accessory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceHandle {
    pub accessory: DeviceId,
    pub kind: ServiceKind,
}

impl ServiceHandle {
    #[must_use]
    pub fn characteristic(&self, kind: CharacteristicKind) -> CharacteristicHandle {
        CharacteristicHandle {
            service: self.clone(),
            kind,
        }
    }
}

/// Address of a characteristic on a service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharacteristicHandle {
    pub service: ServiceHandle,
    pub kind: CharacteristicKind,
}

impl CharacteristicHandle {
    #[must_use]
    pub fn accessory(&self) -> &DeviceId {
        &self.service.accessory
    }
}

/// A characteristic value.
///
/// `Null` means "no value"; hosts ignore it when pushed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl LocalValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Read a boolean, accepting `0`/`1` integers.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueError`] for any other shape.
    pub fn as_bool(&self) -> Result<bool, InvalidValueError> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Int(value) => Ok(*value != 0),
            other => Err(InvalidValueError {
                expected: "bool",
                got: other.kind_name(),
            }),
        }
    }

    /// Read a number, accepting integers and floats.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueError`] for any other shape.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Result<f64, InvalidValueError> {
        match self {
            Self::Int(value) => Ok(*value as f64),
            Self::Float(value) => Ok(*value),
            other => Err(InvalidValueError {
                expected: "number",
                got: other.kind_name(),
            }),
        }
    }

    /// Read an integer.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueError`] for any other shape.
    pub fn as_i64(&self) -> Result<i64, InvalidValueError> {
        match self {
            Self::Int(value) => Ok(*value),
            Self::Bool(value) => Ok(i64::from(*value)),
            other => Err(InvalidValueError {
                expected: "int",
                got: other.kind_name(),
            }),
        }
    }
}

impl From<bool> for LocalValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for LocalValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for LocalValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl<T: Into<LocalValue>> From<Option<T>> for LocalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

macro_rules! local_enum {
    ($(#[doc = $doc:expr])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl From<$name> for LocalValue {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => LocalValue::Int($value)),+
                }
            }
        }

        impl TryFrom<&LocalValue> for $name {
            type Error = InvalidValueError;

            fn try_from(value: &LocalValue) -> Result<Self, Self::Error> {
                match value.as_i64()? {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(InvalidValueError {
                        expected: stringify!($name),
                        got: "int",
                    }),
                }
            }
        }
    };
}

local_enum!(
    /// Values of the `Active` characteristic.
    ActiveState { Inactive = 0, Active = 1 }
);

local_enum!(
    /// Values of the `ProgrammableSwitchEvent` characteristic.
    SwitchEvent { SinglePress = 0, DoublePress = 1, LongPress = 2 }
);

local_enum!(
    /// Values of the `StatusLowBattery` characteristic.
    LowBatteryStatus { Normal = 0, Low = 1 }
);

/// Accessory category advertised to local controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccessoryCategory {
    AirConditioner,
    AirHumidifier,
    AirPurifier,
    Bridge,
    Camera,
    Lightbulb,
    Other,
    Outlet,
    Sensor,
    Switch,
    Television,
    Thermostat,
    WindowCovering,
}

impl From<DeviceType> for AccessoryCategory {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::Light => Self::Lightbulb,
            DeviceType::Socket => Self::Outlet,
            DeviceType::Switch => Self::Switch,
            DeviceType::Thermostat => Self::Thermostat,
            DeviceType::AirConditioner => Self::AirConditioner,
            DeviceType::Tv => Self::Television,
            DeviceType::Purifier => Self::AirPurifier,
            DeviceType::Humidifier => Self::AirHumidifier,
            DeviceType::Curtain => Self::WindowCovering,
            DeviceType::Camera => Self::Camera,
            DeviceType::Hub => Self::Bridge,
            other if other.is_sensor() => Self::Sensor,
            _ => Self::Other,
        }
    }
}

/// Identity and information metadata published for an accessory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessoryInfo {
    pub id: DeviceId,
    pub uuid: Uuid,
    pub name: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_revision: String,
    pub category: AccessoryCategory,
    pub mac: String,
    pub pin: String,
}

impl AccessoryInfo {
    /// Derive the accessory metadata for a device in an optional room.
    #[must_use]
    pub fn for_device(device: &Device, room: Option<&Room>) -> Self {
        let name = match room {
            Some(room) => format!("{} ({})", device.name, room.name),
            None => device.name.clone(),
        };
        let manufacturer = if device.skill_id.is_empty() {
            "Yandex".to_string()
        } else {
            device.skill_id.clone()
        };
        Self {
            id: device.id.clone(),
            uuid: identity::accessory_uuid(&device.id),
            name,
            serial_number: device.external_id.clone(),
            manufacturer,
            model: "Device".to_string(),
            firmware_revision: "1.0".to_string(),
            category: device.device_type.into(),
            mac: identity::pseudo_mac(device.id.as_str()),
            pin: identity::setup_pin(device.id.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_active_state_to_int() {
        assert_eq!(LocalValue::from(ActiveState::Active), LocalValue::Int(1));
        assert_eq!(LocalValue::from(ActiveState::Inactive), LocalValue::Int(0));
    }

    #[test]
    fn should_parse_switch_event_from_int() {
        let value = LocalValue::Int(2);
        assert_eq!(SwitchEvent::try_from(&value), Ok(SwitchEvent::LongPress));
        assert!(SwitchEvent::try_from(&LocalValue::Int(7)).is_err());
    }

    #[test]
    fn should_reject_wrong_shapes() {
        let text = LocalValue::Text("on".to_string());
        assert!(text.as_bool().is_err());
        assert!(text.as_f64().is_err());
        assert_eq!(LocalValue::Int(1).as_bool(), Ok(true));
        assert_eq!(LocalValue::Int(3).as_f64(), Ok(3.0));
    }

    #[test]
    fn should_convert_missing_value_to_null() {
        let value: LocalValue = Option::<bool>::None.into();
        assert!(value.is_null());
        let value: LocalValue = Some(SwitchEvent::DoublePress).into();
        assert_eq!(value, LocalValue::Int(1));
    }

    #[test]
    fn should_serialize_untagged() {
        assert_eq!(serde_json::to_string(&LocalValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&LocalValue::Float(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn should_map_device_types_to_categories() {
        assert_eq!(
            AccessoryCategory::from(DeviceType::Light),
            AccessoryCategory::Lightbulb
        );
        assert_eq!(
            AccessoryCategory::from(DeviceType::WaterLeakSensor),
            AccessoryCategory::Sensor
        );
        assert_eq!(
            AccessoryCategory::from(DeviceType::Hub),
            AccessoryCategory::Bridge
        );
        assert_eq!(
            AccessoryCategory::from(DeviceType::Iron),
            AccessoryCategory::Other
        );
    }

    #[test]
    fn should_build_accessory_info_with_room_name() {
        let mut device = Device::new("lamp-1", "Lamp", DeviceType::Light);
        device.external_id = "ext-42".to_string();
        let room = Room::new("r1", "Kitchen");

        let info = AccessoryInfo::for_device(&device, Some(&room));
        assert_eq!(info.name, "Lamp (Kitchen)");
        assert_eq!(info.serial_number, "ext-42");
        assert_eq!(info.manufacturer, "Yandex");
        assert_eq!(info.model, "Device");
        assert_eq!(info.category, AccessoryCategory::Lightbulb);
        assert_eq!(info, AccessoryInfo::for_device(&device, Some(&room)));
    }

    #[test]
    fn should_use_skill_id_as_manufacturer() {
        let mut device = Device::new("lamp-1", "Lamp", DeviceType::Light);
        device.skill_id = "T".to_string();
        let info = AccessoryInfo::for_device(&device, None);
        assert_eq!(info.manufacturer, "T");
        assert_eq!(info.name, "Lamp");
    }
}
