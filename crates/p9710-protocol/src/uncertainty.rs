//! Manufacturer accuracy specification
//!
//! Each operating range guarantees `|error| <= slope * |I| + floor`. The
//! interval is read as the half-width of a rectangular distribution, so the
//! standard uncertainty is the interval divided by `sqrt(3)`.

use crate::range::MeasurementRange;

/// Linear error bound of one range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specification {
    /// Relative part of the bound
    pub slope: f64,
    /// Absolute part of the bound, in amperes
    pub floor: f64,
}

impl Specification {
    /// Error bound for `current` under this specification
    pub fn error_for(&self, current: f64) -> f64 {
        self.slope * current.abs() + self.floor
    }

    /// Specification of a range; `None` for the sentinels
    pub fn for_range(range: MeasurementRange) -> Option<Self> {
        let (slope, floor) = match range {
            MeasurementRange::Unknown | MeasurementRange::RangeOverflow => return None,
            MeasurementRange::Range03 => (0.002, 1.0e-6),
            MeasurementRange::Range04 => (0.002, 1.0e-7),
            MeasurementRange::Range05 => (0.002, 1.0e-8),
            MeasurementRange::Range06 => (0.002, 1.0e-9),
            MeasurementRange::Range07 => (0.002, 1.0e-10),
            MeasurementRange::Range08 => (0.002, 1.0e-11),
            MeasurementRange::Range09 => (0.005, 2.0e-12),
            MeasurementRange::Range10 => (0.005, 2.0e-12),
        };
        Some(Self { slope, floor })
    }
}

/// Conversion factor from a rectangular half-width to a standard uncertainty
pub fn rectangular_factor() -> f64 {
    (1.0f64 / 3.0).sqrt()
}

/// Specified error interval of a reading taken in `range`, `NaN` for sentinels
pub fn specified_error(current: f64, range: MeasurementRange) -> f64 {
    Specification::for_range(range)
        .map(|spec| spec.error_for(current))
        .unwrap_or(f64::NAN)
}

/// Standard uncertainty of a reading taken in `range`
pub fn standard_uncertainty(current: f64, range: MeasurementRange) -> f64 {
    specified_error(current, range) * rectangular_factor()
}

/// Standard uncertainty with the range estimated from the reading itself
pub fn standard_uncertainty_estimated(current: f64) -> f64 {
    standard_uncertainty(current, MeasurementRange::estimate(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1e-30)
    }

    #[test]
    fn test_specified_error_table() {
        assert!(close(specified_error(1.0e-3, MeasurementRange::Range03), 3.0e-6));
        assert!(close(specified_error(1.0e-4, MeasurementRange::Range04), 3.0e-7));
        assert!(close(specified_error(1.0e-9, MeasurementRange::Range09), 7.0e-12));
        assert!(close(specified_error(1.0e-10, MeasurementRange::Range10), 2.5e-12));
    }

    #[test]
    fn test_specified_error_uses_magnitude() {
        let pos = specified_error(1.5e-6, MeasurementRange::Range06);
        let neg = specified_error(-1.5e-6, MeasurementRange::Range06);
        assert_eq!(pos, neg);
    }

    #[test]
    fn test_sentinels_are_nan() {
        assert!(specified_error(1.0e-6, MeasurementRange::Unknown).is_nan());
        assert!(specified_error(1.0e-6, MeasurementRange::RangeOverflow).is_nan());
        assert!(standard_uncertainty(1.0e-6, MeasurementRange::Unknown).is_nan());
        assert!(standard_uncertainty_estimated(f64::NAN).is_nan());
        assert!(standard_uncertainty_estimated(1.0).is_nan());
    }

    #[test]
    fn test_floor_drops_a_decade_per_range() {
        let floors: Vec<f64> = MeasurementRange::OPERATING[..6]
            .iter()
            .map(|r| Specification::for_range(*r).unwrap().floor)
            .collect();
        for pair in floors.windows(2) {
            assert!(close(pair[0] / pair[1], 10.0));
        }
    }

    #[test]
    fn test_estimated_matches_explicit_range() {
        let current = 1.234e-6;
        assert_eq!(
            standard_uncertainty_estimated(current),
            standard_uncertainty(current, MeasurementRange::Range06)
        );
        let expected = (0.002 * 1.234e-6 + 1.0e-9) * (1.0f64 / 3.0).sqrt();
        assert!(close(standard_uncertainty_estimated(current), expected));
    }

    proptest! {
        #[test]
        fn standard_is_scaled_specified(current in -2.0e-3f64..2.0e-3, index in 0u8..8) {
            let range = MeasurementRange::from_index(index).unwrap();
            prop_assert_eq!(
                standard_uncertainty(current, range),
                specified_error(current, range) * (1.0f64 / 3.0).sqrt()
            );
        }
    }
}
