//! Value adapters between the remote and local representations.
//!
//! Adapters are pure: the result depends only on the input value and the
//! configuration captured from the capability or property parameters.
//! [`Adapter`] covers continuous values; [`EventAdapter`] covers discrete
//! events, where an unchanged event maps to `None` in both directions.

pub mod color;
pub mod event;
pub mod range;

pub use color::{ColorModelAdapter, ColorModelValue, ColorTemperatureAdapter, HueSaturation};
pub use event::{LowBatteryAdapter, MotionAdapter, SwitchEventAdapter};
pub use range::{LOCAL_MIRED, LOCAL_PERCENT, RangeAdapter, scale};

use crate::accessory::ActiveState;

/// Bidirectional value transcoder.
pub trait Adapter {
    type Remote;
    type Local;

    fn to_remote(&self, local: Self::Local) -> Self::Remote;
    fn to_local(&self, remote: Self::Remote) -> Self::Local;
}

/// Transcoder for discrete events.
///
/// When `changed` is false both directions yield `None` so a stale event is
/// never replayed.
pub trait EventAdapter {
    type Remote;
    type Local;

    fn to_remote(&self, local: Self::Local, changed: bool) -> Option<Self::Remote>;
    fn to_local(&self, remote: Self::Remote, changed: bool) -> Option<Self::Local>;
}

/// Pass-through for boolean characteristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanAdapter;

impl Adapter for BooleanAdapter {
    type Remote = bool;
    type Local = bool;

    fn to_remote(&self, local: bool) -> bool {
        local
    }

    fn to_local(&self, remote: bool) -> bool {
        remote
    }
}

/// Pass-through for numeric characteristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAdapter;

impl Adapter for NumberAdapter {
    type Remote = f64;
    type Local = f64;

    fn to_remote(&self, local: f64) -> f64 {
        local
    }

    fn to_local(&self, remote: f64) -> f64 {
        remote
    }
}

/// Maps a remote boolean onto the `Active` enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveAdapter;

impl Adapter for ActiveAdapter {
    type Remote = bool;
    type Local = ActiveState;

    fn to_remote(&self, local: ActiveState) -> bool {
        local == ActiveState::Active
    }

    fn to_local(&self, remote: bool) -> ActiveState {
        if remote {
            ActiveState::Active
        } else {
            ActiveState::Inactive
        }
    }
}

const KELVIN_OFFSET: f64 = 273.15;

/// Local temperatures are Celsius; the remote side may report Kelvin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureAdapter {
    kelvin: bool,
}

impl TemperatureAdapter {
    /// Configure from the unit declared in the property parameters.
    #[must_use]
    pub fn from_unit(unit: Option<&str>) -> Self {
        Self {
            kelvin: unit == Some("unit.temperature.kelvin"),
        }
    }
}

impl Adapter for TemperatureAdapter {
    type Remote = f64;
    type Local = f64;

    fn to_remote(&self, local: f64) -> f64 {
        if self.kelvin {
            local + KELVIN_OFFSET
        } else {
            local
        }
    }

    fn to_local(&self, remote: f64) -> f64 {
        if self.kelvin {
            remote - KELVIN_OFFSET
        } else {
            remote
        }
    }
}

/// Quantizes a fractional air quality index onto the local 0..=5 scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct AirQualityAdapter;

impl Adapter for AirQualityAdapter {
    type Remote = f64;
    type Local = i64;

    #[allow(clippy::cast_precision_loss)]
    fn to_remote(&self, local: i64) -> f64 {
        local as f64 / 5.0
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_local(&self, remote: f64) -> i64 {
        (remote * 5.0).ceil() as i64
    }
}
