//! Capabilities — controllable facets of a device.

use serde::{Deserialize, Serialize};

/// Capability type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityType {
    #[serde(rename = "devices.capabilities.on_off")]
    OnOff,
    #[serde(rename = "devices.capabilities.color_setting")]
    ColorSetting,
    #[serde(rename = "devices.capabilities.range")]
    Range,
    #[serde(rename = "devices.capabilities.toggle")]
    Toggle,
    #[serde(rename = "devices.capabilities.mode")]
    Mode,
    #[serde(rename = "devices.capabilities.video_stream")]
    VideoStream,
}

/// Identity of a capability on a device: its type plus, for types that
/// carry one in their parameters, the instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityKey {
    pub kind: CapabilityType,
    pub instance: Option<String>,
}

/// Numeric bounds declared by a capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
}

impl ValueRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            precision: None,
        }
    }
}

/// An `{instance, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityState<T> {
    pub instance: String,
    pub value: T,
}

impl<T> CapabilityState<T> {
    #[must_use]
    pub fn new(instance: impl Into<String>, value: T) -> Self {
        Self {
            instance: instance.into(),
            value,
        }
    }
}

/// Hue/saturation/value triple, each component on the platform's scale
/// (hue in degrees, saturation and value in percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// State of a color-setting capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instance", content = "value", rename_all = "snake_case")]
pub enum ColorState {
    Rgb(u32),
    Hsv(Hsv),
    TemperatureK(f64),
    Scene(String),
}

/// Color model supported by a color-setting capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    Rgb,
    Hsv,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnOffParameters {
    #[serde(default)]
    pub split: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSettingParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_model: Option<ColorModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<ValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scene: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeParameters {
    pub instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub random_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleParameters {
    pub instance: String,
}

/// Fields shared by every capability type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEntry<P, S> {
    #[serde(default)]
    pub reportable: bool,
    #[serde(default)]
    pub retrievable: bool,
    #[serde(default)]
    pub last_updated: f64,
    pub parameters: P,
    #[serde(default = "Option::default")]
    pub state: Option<S>,
}

impl<P, S> CapabilityEntry<P, S> {
    /// Entry with the given parameters and state, stamped at `last_updated`.
    #[must_use]
    pub fn new(parameters: P, state: Option<S>, last_updated: f64) -> Self {
        Self {
            reportable: true,
            retrievable: true,
            last_updated,
            parameters,
            state,
        }
    }
}

/// A controllable capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Capability {
    #[serde(rename = "devices.capabilities.on_off")]
    OnOff(CapabilityEntry<OnOffParameters, CapabilityState<bool>>),
    #[serde(rename = "devices.capabilities.color_setting")]
    ColorSetting(CapabilityEntry<ColorSettingParameters, ColorState>),
    #[serde(rename = "devices.capabilities.range")]
    Range(CapabilityEntry<RangeParameters, CapabilityState<f64>>),
    #[serde(rename = "devices.capabilities.toggle")]
    Toggle(CapabilityEntry<ToggleParameters, CapabilityState<bool>>),
    #[serde(rename = "devices.capabilities.mode")]
    Mode(CapabilityEntry<serde_json::Value, CapabilityState<String>>),
    #[serde(rename = "devices.capabilities.video_stream")]
    VideoStream(CapabilityEntry<serde_json::Value, serde_json::Value>),
}

impl Capability {
    #[must_use]
    pub fn kind(&self) -> CapabilityType {
        match self {
            Self::OnOff(_) => CapabilityType::OnOff,
            Self::ColorSetting(_) => CapabilityType::ColorSetting,
            Self::Range(_) => CapabilityType::Range,
            Self::Toggle(_) => CapabilityType::Toggle,
            Self::Mode(_) => CapabilityType::Mode,
            Self::VideoStream(_) => CapabilityType::VideoStream,
        }
    }

    /// Instance declared in the parameters, for types that have one.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        match self {
            Self::Range(entry) => Some(&entry.parameters.instance),
            Self::Toggle(entry) => Some(&entry.parameters.instance),
            Self::Mode(entry) => entry.parameters.get("instance")?.as_str(),
            Self::OnOff(_) | Self::ColorSetting(_) | Self::VideoStream(_) => None,
        }
    }

    #[must_use]
    pub fn key(&self) -> CapabilityKey {
        CapabilityKey {
            kind: self.kind(),
            instance: self.instance().map(ToString::to_string),
        }
    }

    /// Remote timestamp of the last state change, in seconds.
    #[must_use]
    pub fn last_updated(&self) -> f64 {
        match self {
            Self::OnOff(entry) => entry.last_updated,
            Self::ColorSetting(entry) => entry.last_updated,
            Self::Range(entry) => entry.last_updated,
            Self::Toggle(entry) => entry.last_updated,
            Self::Mode(entry) => entry.last_updated,
            Self::VideoStream(entry) => entry.last_updated,
        }
    }
}

/// One outbound capability change, serialized as `{type, state}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state")]
pub enum CapabilityAction {
    #[serde(rename = "devices.capabilities.on_off")]
    OnOff(CapabilityState<bool>),
    #[serde(rename = "devices.capabilities.color_setting")]
    ColorSetting(ColorState),
    #[serde(rename = "devices.capabilities.range")]
    Range(CapabilityState<f64>),
}
