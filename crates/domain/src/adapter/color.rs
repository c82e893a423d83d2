//! Color space conversions and color adapters.
//!
//! Locally a color is a hue (degrees, `[0, 360)`) and a saturation
//! (percent) at full brightness. Remotely it is either a packed
//! `0xRRGGBB` integer or an HSV object, depending on the capability's
//! declared color model.

use crate::device::{ColorModel, ColorState, Hsv, ValueRange};

use super::Adapter;
use super::range::{LOCAL_MIRED, scale};

/// Hue and saturation as exposed locally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueSaturation {
    pub hue: f64,
    pub saturation: f64,
}

impl HueSaturation {
    #[must_use]
    pub fn new(hue: f64, saturation: f64) -> Self {
        Self { hue, saturation }
    }
}

/// Full-value HSV to packed RGB.
#[must_use]
pub fn hs_to_rgb(hue: f64, saturation: f64) -> u32 {
    let h = hue.rem_euclid(360.0);
    let c = saturation.clamp(0.0, 100.0) / 100.0;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = 1.0 - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (channel(r + m) << 16) | (channel(g + m) << 8) | channel(b + m)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u32 {
    (value * 255.0).round().clamp(0.0, 255.0) as u32
}

/// Packed RGB to hue and saturation. Value is discarded.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn rgb_to_hs(rgb: u32) -> HueSaturation {
    let r = f64::from((rgb >> 16) & 0xFF) / 255.0;
    let g = f64::from((rgb >> 8) & 0xFF) / 255.0;
    let b = f64::from(rgb & 0xFF) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max * 100.0 };

    HueSaturation {
        hue: (hue + 360.0) % 360.0,
        saturation,
    }
}

/// HSV with an arbitrary value to hue/saturation, folding value into saturation.
#[must_use]
pub fn hsv_to_hs(hsv: Hsv) -> HueSaturation {
    HueSaturation {
        hue: hsv.h,
        saturation: hsv.s * (hsv.v / 100.0),
    }
}

/// Hue/saturation to a full-value HSV triple.
#[must_use]
pub fn hs_to_hsv(hs: HueSaturation) -> Hsv {
    Hsv {
        h: hs.hue,
        s: hs.saturation,
        v: 100.0,
    }
}

/// Approximate RGB of a black body at `kelvin`.
#[must_use]
pub fn kelvin_to_rgb(kelvin: f64) -> u32 {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_727_446 * (t - 60.0).powf(-0.133_204_759_2)
    };
    let g = if t <= 66.0 {
        99.470_802_586_1 * t.ln() - 161.119_568_166_1
    } else {
        288.122_169_528_3 * (t - 60.0).powf(-0.075_514_849_2)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_731_223_1 * (t - 10.0).ln() - 305.044_792_730_7
    };

    (channel(r / 255.0) << 16) | (channel(g / 255.0) << 8) | channel(b / 255.0)
}

/// Hue/saturation approximating a color temperature given in mireds.
#[must_use]
pub fn mired_to_hs(mired: f64) -> HueSaturation {
    if mired <= 0.0 {
        return HueSaturation::new(0.0, 0.0);
    }
    rgb_to_hs(kelvin_to_rgb(1_000_000.0 / mired))
}

/// Remote color model payloads handled by [`ColorModelAdapter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorModelValue {
    Rgb(u32),
    Hsv(Hsv),
}

impl ColorModelValue {
    /// Extract the color model part of a color-setting state, if any.
    #[must_use]
    pub fn from_state(state: &ColorState) -> Option<Self> {
        match state {
            ColorState::Rgb(rgb) => Some(Self::Rgb(*rgb)),
            ColorState::Hsv(hsv) => Some(Self::Hsv(*hsv)),
            ColorState::TemperatureK(_) | ColorState::Scene(_) => None,
        }
    }
}

impl From<ColorModelValue> for ColorState {
    fn from(value: ColorModelValue) -> Self {
        match value {
            ColorModelValue::Rgb(rgb) => Self::Rgb(rgb),
            ColorModelValue::Hsv(hsv) => Self::Hsv(hsv),
        }
    }
}

/// Hue/saturation to and from the capability's color model.
///
/// Capabilities that declare no model are addressed in HSV.
#[derive(Debug, Clone, Copy)]
pub struct ColorModelAdapter {
    model: ColorModel,
}

impl ColorModelAdapter {
    #[must_use]
    pub fn new(model: Option<ColorModel>) -> Self {
        Self {
            model: model.unwrap_or(ColorModel::Hsv),
        }
    }
}

impl Adapter for ColorModelAdapter {
    type Remote = ColorModelValue;
    type Local = HueSaturation;

    fn to_remote(&self, local: HueSaturation) -> ColorModelValue {
        match self.model {
            ColorModel::Rgb => ColorModelValue::Rgb(hs_to_rgb(local.hue, local.saturation)),
            ColorModel::Hsv => ColorModelValue::Hsv(hs_to_hsv(local)),
        }
    }

    fn to_local(&self, remote: ColorModelValue) -> HueSaturation {
        match remote {
            ColorModelValue::Rgb(rgb) => rgb_to_hs(rgb),
            ColorModelValue::Hsv(hsv) => hsv_to_hs(hsv),
        }
    }
}

/// Kelvin bounds declared by the capability to and from the local mired
/// scale. Identity when no bounds are declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorTemperatureAdapter {
    bounds: Option<ValueRange>,
}

impl ColorTemperatureAdapter {
    #[must_use]
    pub fn new(bounds: Option<ValueRange>) -> Self {
        Self { bounds }
    }
}

impl Adapter for ColorTemperatureAdapter {
    type Remote = f64;
    type Local = f64;

    fn to_remote(&self, local: f64) -> f64 {
        match self.bounds {
            Some(bounds) => scale(local, LOCAL_MIRED, bounds),
            None => local,
        }
    }

    fn to_local(&self, remote: f64) -> f64 {
        match self.bounds {
            Some(bounds) => scale(remote, bounds, LOCAL_MIRED),
            None => remote,
        }
    }
}
