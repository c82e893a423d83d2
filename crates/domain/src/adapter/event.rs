//! Discrete event mappings.

use crate::accessory::{LowBatteryStatus, SwitchEvent};
use crate::device::EventValue;

use super::EventAdapter;

/// Button presses to programmable switch events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchEventAdapter;

impl EventAdapter for SwitchEventAdapter {
    type Remote = EventValue;
    type Local = SwitchEvent;

    fn to_remote(&self, local: SwitchEvent, changed: bool) -> Option<EventValue> {
        if !changed {
            return None;
        }
        Some(match local {
            SwitchEvent::SinglePress => EventValue::Click,
            SwitchEvent::DoublePress => EventValue::DoubleClick,
            SwitchEvent::LongPress => EventValue::LongPress,
        })
    }

    fn to_local(&self, remote: EventValue, changed: bool) -> Option<SwitchEvent> {
        if !changed {
            return None;
        }
        match remote {
            EventValue::Click => Some(SwitchEvent::SinglePress),
            EventValue::DoubleClick => Some(SwitchEvent::DoublePress),
            EventValue::LongPress => Some(SwitchEvent::LongPress),
            _ => None,
        }
    }
}

/// Motion events to the `MotionDetected` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionAdapter;

impl EventAdapter for MotionAdapter {
    type Remote = EventValue;
    type Local = bool;

    fn to_remote(&self, local: bool, changed: bool) -> Option<EventValue> {
        if !changed {
            return None;
        }
        Some(if local {
            EventValue::Detected
        } else {
            EventValue::NotDetected
        })
    }

    fn to_local(&self, remote: EventValue, changed: bool) -> Option<bool> {
        if !changed {
            return None;
        }
        Some(remote == EventValue::Detected)
    }
}

/// Battery level events to the low-battery status.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowBatteryAdapter;

impl EventAdapter for LowBatteryAdapter {
    type Remote = EventValue;
    type Local = LowBatteryStatus;

    fn to_remote(&self, local: LowBatteryStatus, changed: bool) -> Option<EventValue> {
        if !changed {
            return None;
        }
        Some(match local {
            LowBatteryStatus::Low => EventValue::Low,
            LowBatteryStatus::Normal => EventValue::Normal,
        })
    }

    fn to_local(&self, remote: EventValue, changed: bool) -> Option<LowBatteryStatus> {
        if !changed {
            return None;
        }
        Some(if remote == EventValue::Low {
            LowBatteryStatus::Low
        } else {
            LowBatteryStatus::Normal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_button_presses() {
        let adapter = SwitchEventAdapter;
        assert_eq!(
            adapter.to_local(EventValue::Click, true),
            Some(SwitchEvent::SinglePress)
        );
        assert_eq!(
            adapter.to_local(EventValue::DoubleClick, true),
            Some(SwitchEvent::DoublePress)
        );
        assert_eq!(
            adapter.to_local(EventValue::LongPress, true),
            Some(SwitchEvent::LongPress)
        );
        assert_eq!(adapter.to_local(EventValue::Leak, true), None);
        assert_eq!(
            adapter.to_remote(SwitchEvent::DoublePress, true),
            Some(EventValue::DoubleClick)
        );
    }

    #[test]
    fn should_suppress_unchanged_events() {
        assert_eq!(SwitchEventAdapter.to_local(EventValue::Click, false), None);
        assert_eq!(MotionAdapter.to_local(EventValue::Detected, false), None);
        assert_eq!(LowBatteryAdapter.to_local(EventValue::Low, false), None);
        assert_eq!(SwitchEventAdapter.to_remote(SwitchEvent::LongPress, false), None);
        assert_eq!(MotionAdapter.to_remote(true, false), None);
        assert_eq!(LowBatteryAdapter.to_remote(LowBatteryStatus::Low, false), None);
    }

    #[test]
    fn should_map_motion() {
        assert_eq!(MotionAdapter.to_local(EventValue::Detected, true), Some(true));
        assert_eq!(
            MotionAdapter.to_local(EventValue::NotDetected, true),
            Some(false)
        );
        assert_eq!(
            MotionAdapter.to_remote(false, true),
            Some(EventValue::NotDetected)
        );
    }

    #[test]
    fn should_map_low_battery() {
        assert_eq!(
            LowBatteryAdapter.to_local(EventValue::Low, true),
            Some(LowBatteryStatus::Low)
        );
        assert_eq!(
            LowBatteryAdapter.to_local(EventValue::Normal, true),
            Some(LowBatteryStatus::Normal)
        );
        assert_eq!(
            LowBatteryAdapter.to_remote(LowBatteryStatus::Normal, true),
            Some(EventValue::Normal)
        );
    }
}
