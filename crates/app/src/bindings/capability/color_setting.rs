use tokio::time::Instant;

use yhk_domain::accessory::{CharacteristicHandle, CharacteristicKind, LocalValue, ServiceHandle, ServiceKind};
use yhk_domain::adapter::{
    Adapter, ColorModelAdapter, ColorModelValue, ColorTemperatureAdapter, HueSaturation,
    LOCAL_MIRED,
};
use yhk_domain::adapter::color::mired_to_hs;
use yhk_domain::device::{
    Capability, CapabilityAction, CapabilityEntry, ColorSettingParameters, ColorState,
};
use yhk_domain::error::YhkError;
use yhk_domain::time::remote_to_millis;

use crate::bindings::DeviceContext;
use crate::debounce::Debouncer;
use crate::ports::{Access, AccessoryHost};

const HUE: usize = 0;
const SATURATION: usize = 1;
const TEMPERATURE: usize = 2;

/// Which representation the user last addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorMode {
    HueSaturation,
    Temperature,
}

/// Local color state derived from the remote one.
///
/// Hue/saturation and color temperature are alternative remote states, so
/// the binding keeps both locally and remembers which one was set last.
#[derive(Debug, Clone, Copy)]
struct LocalColor {
    hue: f64,
    saturation: f64,
    /// Mireds, set while the color is a temperature.
    temperature: Option<f64>,
    mode: ColorMode,
    /// Local clock of the last accepted change, in Unix milliseconds.
    updated_at_ms: i64,
}

impl Default for LocalColor {
    fn default() -> Self {
        Self {
            hue: 0.0,
            saturation: 0.0,
            temperature: None,
            mode: ColorMode::HueSaturation,
            updated_at_ms: 0,
        }
    }
}

/// Hue, saturation and color temperature on a light bulb.
///
/// Local writes are coalesced: each one restarts a quiet window and the
/// action is built at flush time from the latest local color. Remote
/// updates older than the last local change are ignored so that the echo
/// of an earlier write cannot undo a later one.
#[derive(Debug)]
pub struct ColorSettingBinding {
    characteristics: [CharacteristicHandle; 3],
    model: ColorModelAdapter,
    temperature: ColorTemperatureAdapter,
    entry: CapabilityEntry<ColorSettingParameters, ColorState>,
    color: LocalColor,
    debouncer: Debouncer,
}

impl ColorSettingBinding {
    pub(super) fn create(capability: &Capability, ctx: &DeviceContext<'_>) -> Option<Self> {
        let Capability::ColorSetting(entry) = capability else {
            return None;
        };
        let service = ctx.host.set_service(ctx.accessory, ServiceKind::Lightbulb);
        let characteristics = [
            ctx.host.characteristic(&service, CharacteristicKind::Hue),
            ctx.host.characteristic(&service, CharacteristicKind::Saturation),
            ctx.host
                .characteristic(&service, CharacteristicKind::ColorTemperature),
        ];

        let mut binding = Self {
            characteristics,
            model: ColorModelAdapter::new(entry.parameters.color_model),
            temperature: ColorTemperatureAdapter::new(entry.parameters.temperature_k),
            entry: entry.clone(),
            color: LocalColor::default(),
            debouncer: Debouncer::new(ctx.debounce),
        };

        if let Some(color) = entry.state.as_ref().and_then(|state| binding.derive(state)) {
            binding.color = LocalColor {
                updated_at_ms: yhk_domain::time::now_millis(),
                ..color
            };
            ctx.host
                .set_value(&binding.characteristics[HUE], color.hue.into());
            ctx.host
                .set_value(&binding.characteristics[SATURATION], color.saturation.into());
            if let Some(temperature) = color.temperature {
                ctx.host
                    .set_value(&binding.characteristics[TEMPERATURE], temperature.into());
            }
        }
        for characteristic in &binding.characteristics {
            ctx.host.bind(characteristic, Access::ReadWrite);
        }
        Some(binding)
    }

    fn derive(&self, state: &ColorState) -> Option<LocalColor> {
        match state {
            ColorState::TemperatureK(kelvin) => {
                let mired = self.temperature.to_local(*kelvin);
                let hs = mired_to_hs(mired);
                Some(LocalColor {
                    hue: hs.hue,
                    saturation: hs.saturation,
                    temperature: Some(mired),
                    mode: ColorMode::Temperature,
                    updated_at_ms: 0,
                })
            }
            ColorState::Rgb(_) | ColorState::Hsv(_) => {
                let hs = self.model.to_local(ColorModelValue::from_state(state)?);
                Some(LocalColor {
                    hue: hs.hue,
                    saturation: hs.saturation,
                    temperature: None,
                    mode: ColorMode::HueSaturation,
                    updated_at_ms: 0,
                })
            }
            ColorState::Scene(_) => None,
        }
    }

    pub(super) fn update(
        &mut self,
        entry: &CapabilityEntry<ColorSettingParameters, ColorState>,
        host: &dyn AccessoryHost,
        now_ms: i64,
    ) {
        let Some(state) = &entry.state else {
            return;
        };
        if remote_to_millis(entry.last_updated) <= self.color.updated_at_ms {
            tracing::trace!(
                last_updated = entry.last_updated,
                local_ms = self.color.updated_at_ms,
                "ignoring stale color update"
            );
            return;
        }
        let Some(color) = self.derive(state) else {
            return;
        };
        self.color = LocalColor {
            updated_at_ms: now_ms,
            ..color
        };
        self.entry = entry.clone();
        match (color.mode, color.temperature) {
            (ColorMode::Temperature, Some(temperature)) => {
                host.update_value(&self.characteristics[TEMPERATURE], temperature.into());
            }
            _ => {
                host.update_value(&self.characteristics[HUE], color.hue.into());
                host.update_value(&self.characteristics[SATURATION], color.saturation.into());
            }
        }
    }

    pub(super) fn read(&self, characteristic: &CharacteristicHandle) -> LocalValue {
        match characteristic.kind {
            CharacteristicKind::Hue => self.color.hue.into(),
            CharacteristicKind::Saturation => self.color.saturation.into(),
            CharacteristicKind::ColorTemperature => {
                self.color.temperature.unwrap_or(LOCAL_MIRED.min).into()
            }
            _ => LocalValue::Null,
        }
    }

    pub(super) fn write(
        &mut self,
        characteristic: &CharacteristicHandle,
        value: &LocalValue,
        now_ms: i64,
        at: Instant,
    ) -> Result<(), YhkError> {
        let value = value.as_f64()?;
        match characteristic.kind {
            CharacteristicKind::Hue => {
                self.color.hue = value;
                self.set_hue_saturation_mode();
            }
            CharacteristicKind::Saturation => {
                self.color.saturation = value;
                self.set_hue_saturation_mode();
            }
            CharacteristicKind::ColorTemperature => {
                self.color.temperature = Some(value);
                self.color.mode = ColorMode::Temperature;
            }
            _ => return Ok(()),
        }
        self.color.updated_at_ms = now_ms;
        self.entry.state = Some(self.remote_state());
        self.debouncer.schedule(at);
        Ok(())
    }

    /// A hue or saturation write leaves no color temperature behind.
    fn set_hue_saturation_mode(&mut self) {
        self.color.mode = ColorMode::HueSaturation;
        self.color.temperature = None;
    }

    /// Remote state for the current local color.
    fn remote_state(&self) -> ColorState {
        match self.color.mode {
            ColorMode::Temperature => {
                let mired = self.color.temperature.unwrap_or(LOCAL_MIRED.min);
                ColorState::TemperatureK(self.temperature.to_remote(mired).round())
            }
            ColorMode::HueSaturation => self
                .model
                .to_remote(HueSaturation::new(self.color.hue, self.color.saturation))
                .into(),
        }
    }

    pub(super) fn poll_flush(&mut self, at: Instant) -> Option<CapabilityAction> {
        if self.debouncer.poll(at) {
            Some(CapabilityAction::ColorSetting(self.remote_state()))
        } else {
            None
        }
    }

    pub(super) fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub(super) fn characteristics(&self) -> &[CharacteristicHandle] {
        &self.characteristics
    }

    pub(super) fn service(&self) -> &ServiceHandle {
        &self.characteristics[HUE].service
    }

    pub(super) fn entry(&self) -> &CapabilityEntry<ColorSettingParameters, ColorState> {
        &self.entry
    }
}
