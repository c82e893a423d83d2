//! Linear range scaling.

use crate::device::ValueRange;

use super::Adapter;

/// Local percentage scale.
pub const LOCAL_PERCENT: ValueRange = ValueRange {
    min: 0.0,
    max: 100.0,
    precision: None,
};

/// Local color temperature scale, in mireds.
pub const LOCAL_MIRED: ValueRange = ValueRange {
    min: 140.0,
    max: 500.0,
    precision: None,
};

/// Rescale `value` from `from` onto `to`.
///
/// A degenerate `from` range maps everything onto `to.min`.
#[must_use]
pub fn scale(value: f64, from: ValueRange, to: ValueRange) -> f64 {
    let span = from.max - from.min;
    if span.abs() < f64::EPSILON {
        return to.min;
    }
    let proportion = (value - from.min) / span;
    to.min + proportion * (to.max - to.min)
}

/// Scales between a capability's declared bounds and the local percentage.
/// Identity when the capability declares no bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeAdapter {
    bounds: Option<ValueRange>,
}

impl RangeAdapter {
    #[must_use]
    pub fn new(bounds: Option<ValueRange>) -> Self {
        Self { bounds }
    }
}

impl Adapter for RangeAdapter {
    type Remote = f64;
    type Local = f64;

    fn to_remote(&self, local: f64) -> f64 {
        match self.bounds {
            Some(bounds) => scale(local, LOCAL_PERCENT, bounds),
            None => local,
        }
    }

    fn to_local(&self, remote: f64) -> f64 {
        match self.bounds {
            Some(bounds) => scale(remote, bounds, LOCAL_PERCENT),
            None => remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_scale_between_ranges() {
        let value = scale(50.0, LOCAL_PERCENT, ValueRange::new(1.0, 11.0));
        assert!((value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn should_round_trip_over_declared_range() {
        let adapter = RangeAdapter::new(Some(ValueRange::new(1.0, 254.0)));
        for step in 0..=20 {
            let local = f64::from(step) * 5.0;
            let back = adapter.to_local(adapter.to_remote(local));
            assert!((back - local).abs() < 1e-9, "{local} -> {back}");
        }
    }

    #[test]
    fn should_round_trip_from_remote_side() {
        let adapter = RangeAdapter::new(Some(ValueRange::new(-20.0, 40.0)));
        for remote in [-20.0, -7.5, 0.0, 13.3, 40.0] {
            let back = adapter.to_remote(adapter.to_local(remote));
            assert!((back - remote).abs() < 1e-9);
        }
    }

    #[test]
    fn should_be_identity_without_bounds() {
        let adapter = RangeAdapter::new(None);
        assert!((adapter.to_local(73.0) - 73.0).abs() < f64::EPSILON);
        assert!((adapter.to_remote(12.0) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_not_divide_by_zero_on_degenerate_range() {
        let value = scale(5.0, ValueRange::new(3.0, 3.0), LOCAL_PERCENT);
        assert!((value - 0.0).abs() < f64::EPSILON);
    }
}
