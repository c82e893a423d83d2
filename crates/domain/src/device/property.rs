//! Properties — reported measurements and discrete events.

use serde::{Deserialize, Serialize};

/// Measurement kinds reported by `devices.properties.float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatInstance {
    Amperage,
    BatteryLevel,
    Co2Level,
    ElectricityMeter,
    FoodLevel,
    GasMeter,
    HeatMeter,
    Humidity,
    Illumination,
    Pm1Density,
    #[serde(rename = "pm2.5_density")]
    Pm2_5Density,
    Pm10Density,
    Power,
    Pressure,
    Temperature,
    Tvoc,
    Voltage,
    WaterLevel,
    WaterMeter,
    AirQuality,
    Meter,
}

impl FloatInstance {
    /// Particulate and gas measurements that feed a derived air quality.
    #[must_use]
    pub fn is_air_component(self) -> bool {
        matches!(
            self,
            Self::Co2Level | Self::Pm1Density | Self::Pm2_5Density | Self::Pm10Density | Self::Tvoc
        )
    }
}

/// Event kinds reported by `devices.properties.event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventInstance {
    Vibration,
    Open,
    Button,
    Motion,
    Smoke,
    Gas,
    BatteryLevel,
    FoodLevel,
    WaterLevel,
    WaterLeak,
}

/// Discrete event values, shared across event instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventValue {
    Tilt,
    Fall,
    Vibration,
    Opened,
    Closed,
    Click,
    DoubleClick,
    LongPress,
    Detected,
    NotDetected,
    High,
    Low,
    Normal,
    Empty,
    Dry,
    Leak,
}

/// Identity of a property on a device: its type plus instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    Float(FloatInstance),
    Event(EventInstance),
}

/// Fields shared by every property type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry<P, S> {
    #[serde(default)]
    pub reportable: bool,
    #[serde(default)]
    pub retrievable: bool,
    #[serde(default)]
    pub last_updated: f64,
    pub parameters: P,
    #[serde(default = "Option::default")]
    pub state: Option<S>,
    #[serde(default)]
    pub state_changed_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatParameters {
    pub instance: FloatInstance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatState {
    pub instance: FloatInstance,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParameters {
    pub instance: EventInstance,
    #[serde(default)]
    pub events: Vec<EventDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub event: EventValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    pub instance: EventInstance,
    pub value: EventValue,
}

/// A reported property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Property {
    #[serde(rename = "devices.properties.float")]
    Float(PropertyEntry<FloatParameters, FloatState>),
    #[serde(rename = "devices.properties.event")]
    Event(PropertyEntry<EventParameters, EventState>),
}

impl Property {
    /// Build a float property carrying `value`.
    #[must_use]
    pub fn float(instance: FloatInstance, unit: &str, value: f64, updated_at: f64) -> Self {
        Self::Float(PropertyEntry {
            reportable: true,
            retrievable: true,
            last_updated: updated_at,
            parameters: FloatParameters {
                instance,
                unit: Some(unit.to_string()),
            },
            state: Some(FloatState { instance, value }),
            state_changed_at: updated_at,
        })
    }

    /// Build an event property carrying `value`.
    #[must_use]
    pub fn event(instance: EventInstance, value: EventValue, changed_at: f64) -> Self {
        Self::Event(PropertyEntry {
            reportable: true,
            retrievable: false,
            last_updated: changed_at,
            parameters: EventParameters {
                instance,
                events: Vec::new(),
            },
            state: Some(EventState { instance, value }),
            state_changed_at: changed_at,
        })
    }

    #[must_use]
    pub fn key(&self) -> PropertyKey {
        match self {
            Self::Float(entry) => PropertyKey::Float(entry.parameters.instance),
            Self::Event(entry) => PropertyKey::Event(entry.parameters.instance),
        }
    }

    /// The most recent of `last_updated` and `state_changed_at`.
    #[must_use]
    pub fn updated_at(&self) -> f64 {
        let (last_updated, changed_at) = match self {
            Self::Float(entry) => (entry.last_updated, entry.state_changed_at),
            Self::Event(entry) => (entry.last_updated, entry.state_changed_at),
        };
        last_updated.max(changed_at)
    }

    #[must_use]
    pub fn has_state(&self) -> bool {
        match self {
            Self::Float(entry) => entry.state.is_some(),
            Self::Event(entry) => entry.state.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_float_property_with_dotted_instance() {
        let json = r#"{
            "type": "devices.properties.float",
            "reportable": true, "retrievable": true, "last_updated": 12.5,
            "parameters": {"instance": "pm2.5_density", "unit": "unit.density.mcg_m3"},
            "state": {"instance": "pm2.5_density", "value": 41.0},
            "state_changed_at": 11.0
        }"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.key(), PropertyKey::Float(FloatInstance::Pm2_5Density));
        assert!((property.updated_at() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_decode_event_property() {
        let json = r#"{
            "type": "devices.properties.event",
            "parameters": {"instance": "button",
                           "events": [{"event": "click"}, {"event": "double_click"}]},
            "state": {"instance": "button", "value": "double_click"},
            "last_updated": 5.0,
            "state_changed_at": 7.0
        }"#;
        let property: Property = serde_json::from_str(json).unwrap();
        let Property::Event(entry) = &property else {
            panic!("expected an event property");
        };
        assert_eq!(entry.state.as_ref().unwrap().value, EventValue::DoubleClick);
        assert_eq!(entry.parameters.events.len(), 2);
        assert!((property.updated_at() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_decode_property_without_state() {
        let json = r#"{
            "type": "devices.properties.float",
            "parameters": {"instance": "humidity", "unit": "unit.percent"},
            "state": null
        }"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert!(!property.has_state());
    }

    #[test]
    fn should_reject_unknown_instance() {
        let json = r#"{
            "type": "devices.properties.event",
            "parameters": {"instance": "earthquake"},
            "state": {"instance": "earthquake", "value": "detected"}
        }"#;
        assert!(serde_json::from_str::<Property>(json).is_err());
    }

    #[test]
    fn should_flag_air_components() {
        assert!(FloatInstance::Tvoc.is_air_component());
        assert!(FloatInstance::Co2Level.is_air_component());
        assert!(!FloatInstance::AirQuality.is_air_component());
        assert!(!FloatInstance::Humidity.is_air_component());
    }
}
