//! Measurement ranges
//!
//! The head switches between eight current ranges, each one decade below the
//! previous. Range codes on the wire (`GR` replies, `SRn` parameters) are the
//! zero-based index of the operating range, so `Range03` is `0` and
//! `Range10` is `7`.

use std::fmt;

/// A measurement range of the photocurrent amplifier
///
/// Ordered from the sentinels through the operating ranges by decreasing
/// current magnitude. `Ord` follows the discriminant, so a range that compares
/// greater is more sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum MeasurementRange {
    /// Range could not be determined
    Unknown = -2,
    /// Current above 1.999 mA
    RangeOverflow = -1,
    /// 1.999 mA full scale
    Range03 = 0,
    /// 199.9 µA full scale
    Range04 = 1,
    /// 19.99 µA full scale
    Range05 = 2,
    /// 1.999 µA full scale
    Range06 = 3,
    /// 199.9 nA full scale
    Range07 = 4,
    /// 19.99 nA full scale
    Range08 = 5,
    /// 1.999 nA full scale
    Range09 = 6,
    /// 199.9 pA full scale (not fitted on every head)
    Range10 = 7,
}

/// Upper current bound of each operating range, in amperes
const UPPER_BOUNDS: [f64; 8] = [
    1.999e-3, 1.999e-4, 1.999e-5, 1.999e-6, 1.999e-7, 1.999e-8, 1.999e-9, 1.999e-10,
];

impl MeasurementRange {
    /// Operating ranges, most to least current
    pub const OPERATING: [MeasurementRange; 8] = [
        MeasurementRange::Range03,
        MeasurementRange::Range04,
        MeasurementRange::Range05,
        MeasurementRange::Range06,
        MeasurementRange::Range07,
        MeasurementRange::Range08,
        MeasurementRange::Range09,
        MeasurementRange::Range10,
    ];

    /// Map a `GR` reply to a range; anything but `"0"`..`"7"` is `Unknown`
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => MeasurementRange::Range03,
            "1" => MeasurementRange::Range04,
            "2" => MeasurementRange::Range05,
            "3" => MeasurementRange::Range06,
            "4" => MeasurementRange::Range07,
            "5" => MeasurementRange::Range08,
            "6" => MeasurementRange::Range09,
            "7" => MeasurementRange::Range10,
            _ => MeasurementRange::Unknown,
        }
    }

    /// Range for a zero-based operating index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::OPERATING.get(usize::from(index)).copied()
    }

    /// Zero-based operating index, as sent with `SRn`
    pub fn index(&self) -> Option<u8> {
        match self {
            MeasurementRange::Unknown | MeasurementRange::RangeOverflow => None,
            other => Some(*other as i8 as u8),
        }
    }

    /// Wire code of the range (`"0"`..`"7"`)
    pub fn code(&self) -> Option<String> {
        self.index().map(|i| i.to_string())
    }

    /// True for `Range03`..`Range10`
    pub fn is_operating(&self) -> bool {
        self.index().is_some()
    }

    /// Range the instrument would use for the given current
    ///
    /// A magnitude exactly on a boundary belongs to the more sensitive range.
    pub fn estimate(current: f64) -> Self {
        if current.is_nan() {
            return MeasurementRange::Unknown;
        }
        let magnitude = current.abs();
        if magnitude > UPPER_BOUNDS[0] {
            return MeasurementRange::RangeOverflow;
        }
        Self::OPERATING
            .iter()
            .zip(UPPER_BOUNDS.iter().skip(1))
            .find(|(_, lower)| magnitude > **lower)
            .map(|(range, _)| *range)
            .unwrap_or(MeasurementRange::Range10)
    }

    /// One step toward larger currents; sentinels and `Range03` stay put
    pub fn increment(&self) -> Self {
        match self.index() {
            Some(i) if i > 0 => Self::OPERATING[usize::from(i) - 1],
            _ => *self,
        }
    }

    /// One step toward smaller currents; sentinels and `Range10` stay put
    pub fn decrement(&self) -> Self {
        match self.index() {
            Some(i) => Self::from_index(i + 1).unwrap_or(*self),
            None => *self,
        }
    }

    /// Largest current measurable in this range, in amperes
    pub fn upper_bound(&self) -> Option<f64> {
        self.index().map(|i| UPPER_BOUNDS[usize::from(i)])
    }

    /// Current below which the next range takes over, in amperes
    ///
    /// `Range10` has no lower neighbor and reports `0.0`.
    pub fn lower_bound(&self) -> Option<f64> {
        self.index()
            .map(|i| UPPER_BOUNDS.get(usize::from(i) + 1).copied().unwrap_or(0.0))
    }

    /// Human-readable full scale
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementRange::Unknown => "unknown",
            MeasurementRange::RangeOverflow => "overflow",
            MeasurementRange::Range03 => "1.999 mA",
            MeasurementRange::Range04 => "199.9 uA",
            MeasurementRange::Range05 => "19.99 uA",
            MeasurementRange::Range06 => "1.999 uA",
            MeasurementRange::Range07 => "199.9 nA",
            MeasurementRange::Range08 => "19.99 nA",
            MeasurementRange::Range09 => "1.999 nA",
            MeasurementRange::Range10 => "199.9 pA",
        }
    }
}

impl fmt::Display for MeasurementRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
