//! Instrument and detector identity values
//!
//! Detector heads carry a small register file read one byte at a time with
//! `GCn`. Registers 0-5 hold a family token, 6-7 the serial number (low byte
//! first), and 16-31 a free-text description. These offsets are fixed by the
//! firmware.

use std::fmt;
use std::ops::Range;

use crate::reply::{register_char, split_banner};

/// Manufacturer reported for every instrument
pub const MANUFACTURER: &str = "Gigahertz-Optik GmbH";

/// Token a detector must carry in registers 0-5 to be trusted
pub const MAGIC_TOKEN: &str = "PT9610";

/// Registers holding the family token
pub const MAGIC_REGISTERS: Range<u8> = 0..6;

/// Register holding the low byte of the detector serial number
pub const SERIAL_LOW_REGISTER: u8 = 6;

/// Register holding the high byte of the detector serial number
pub const SERIAL_HIGH_REGISTER: u8 = 7;

/// Registers holding the free-text description
pub const SECONDARY_REGISTERS: Range<u8> = 16..32;

/// Build text from register values, one character per register
pub fn decode_text(values: &[u32]) -> String {
    values.iter().map(|v| register_char(*v)).collect()
}

/// Trim padding around register text
pub fn trim_register_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// Combine the serial-number registers; bytes above 255 count as 0
pub fn serial_from_registers(low: u32, high: u32) -> u16 {
    let byte = |v: u32| u8::try_from(v).unwrap_or(0);
    u16::from_le_bytes([byte(low), byte(high)])
}

/// Identity of the measuring head itself
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentIdentity {
    /// Always [`MANUFACTURER`]
    pub manufacturer: String,
    /// Banner prefix and variant code, e.g. `P9710-2-07`
    pub instrument_type: String,
    /// Firmware version from the banner
    pub firmware_version: String,
    /// Serial number as reported by `TT`
    pub serial_number: String,
    /// Battery level in percent, `NaN` if unreadable
    pub battery_level: f64,
    /// Port the instrument is attached to
    pub port: String,
}

impl InstrumentIdentity {
    /// Assemble an identity from raw `GI`, `TF`, `TT` and `MB` replies
    pub fn from_replies(
        banner: &str,
        variant: &str,
        serial_number: &str,
        battery_level: f64,
        port: &str,
    ) -> Self {
        let (prefix, firmware) = split_banner(banner);
        Self {
            manufacturer: MANUFACTURER.to_string(),
            instrument_type: instrument_type(&prefix, variant),
            firmware_version: firmware,
            serial_number: serial_number.to_string(),
            battery_level,
            port: port.to_string(),
        }
    }

    /// One-line identification, `<type> <firmware> SN:<serial> @ <port>`
    pub fn id(&self) -> String {
        format!(
            "{} {} SN:{} @ {}",
            self.instrument_type, self.firmware_version, self.serial_number, self.port
        )
    }
}

/// Instrument type from banner prefix and variant code
pub fn instrument_type(prefix: &str, variant: &str) -> String {
    format!("{}-{}", prefix, variant)
}

/// Decoded identity of a validated detector head
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorIdentity {
    /// Descriptor text from `GK`
    pub base: String,
    /// Serial number from registers 6 and 7
    pub serial_number: u16,
    /// Text from registers 16-31
    ///
    /// Surrounding whitespace and NUL padding are removed.
    pub secondary: String,
}

impl fmt::Display for DetectorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} SN:{} ({})",
            self.base, self.serial_number, self.secondary
        )
    }
}

/// Everything known about the attached detector
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorInfo {
    /// Decoded identity, `None` if absent or not a recognized family
    pub identity: Option<DetectorIdentity>,
    /// Calibration factor from `GS4`, `NaN` if unreadable
    pub calibration_factor: f64,
    /// Photometric unit from `GU`
    pub photometric_unit: String,
}

impl DetectorInfo {
    /// Identity string, empty when no valid detector is attached
    pub fn id(&self) -> String {
        self.identity
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}
