//! P9710 command catalog
//!
//! Every command is a short ASCII mnemonic, optionally followed by a decimal
//! parameter, sent as one line. The instrument answers each command with
//! exactly one line.
//!
//! # Commands
//! - `GI` - Firmware banner (`"<version> <variant>"`)
//! - `TT` - Instrument serial number
//! - `TF` - Instrument variant code
//! - `GU` - Photometric unit of the attached detector
//! - `MA` - Photocurrent in amperes
//! - `MV` - Photometric value
//! - `GR` - Active range code (`0`-`7`)
//! - `SRn` - Select manual range `n`
//! - `SB1` / `SB0` - Autorange on / off
//! - `MB` - Battery level in percent
//! - `GS4` - Detector calibration factor
//! - `GK` - Detector descriptor text
//! - `GCn` - Detector descriptor byte at register `n`

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Highest range code accepted by `SRn`
pub const MAX_RANGE_CODE: u8 = 7;

/// Calibration factor slot queried by `GS`
const CALIBRATION_SLOT: &str = "4";

/// A single P9710 command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Firmware banner: GI
    Identify,
    /// Instrument serial number: TT
    SerialNumber,
    /// Instrument variant code: TF
    Variant,
    /// Photometric unit: GU
    PhotometricUnit,
    /// Current reading: MA
    Current,
    /// Photometric reading: MV
    PhotometricValue,
    /// Range readback: GR
    GetRange,
    /// Manual range select: SR0 .. SR7
    SelectRange(u8),
    /// Autorange enable/disable: SB1 / SB0
    Autorange(bool),
    /// Battery level: MB
    Battery,
    /// Detector calibration factor: GS4
    CalibrationFactor,
    /// Detector descriptor: GK
    DetectorDescriptor,
    /// Detector descriptor byte register: GC0 .. GC255
    DescriptorByte(u8),
}

impl Command {
    /// The two-letter mnemonic that starts the command line
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::Identify => "GI",
            Command::SerialNumber => "TT",
            Command::Variant => "TF",
            Command::PhotometricUnit => "GU",
            Command::Current => "MA",
            Command::PhotometricValue => "MV",
            Command::GetRange => "GR",
            Command::SelectRange(_) => "SR",
            Command::Autorange(_) => "SB",
            Command::Battery => "MB",
            Command::CalibrationFactor => "GS",
            Command::DetectorDescriptor => "GK",
            Command::DescriptorByte(_) => "GC",
        }
    }

    /// Encode to wire text, without the line terminator
    pub fn encode(&self) -> String {
        match self {
            Command::SelectRange(n) => format!("SR{}", n),
            Command::Autorange(on) => format!("SB{}", if *on { 1 } else { 0 }),
            Command::CalibrationFactor => format!("GS{}", CALIBRATION_SLOT),
            Command::DescriptorByte(n) => format!("GC{}", n),
            other => other.mnemonic().to_string(),
        }
    }

    /// Parse one command line (terminator optional)
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let prefix = line
            .get(..2)
            .ok_or_else(|| ParseError::UnknownCommand(line.to_string()))?;
        let params = &line[2..];

        let no_params = |cmd: Command| {
            if params.is_empty() {
                Ok(cmd)
            } else {
                Err(ParseError::InvalidParameter {
                    command: cmd.mnemonic(),
                    param: params.to_string(),
                })
            }
        };

        match prefix {
            "GI" => no_params(Command::Identify),
            "TT" => no_params(Command::SerialNumber),
            "TF" => no_params(Command::Variant),
            "GU" => no_params(Command::PhotometricUnit),
            "MA" => no_params(Command::Current),
            "MV" => no_params(Command::PhotometricValue),
            "GR" => no_params(Command::GetRange),
            "MB" => no_params(Command::Battery),
            "GK" => no_params(Command::DetectorDescriptor),
            "SR" => match params.parse::<u8>() {
                Ok(n) if n <= MAX_RANGE_CODE => Ok(Command::SelectRange(n)),
                _ => Err(ParseError::InvalidParameter {
                    command: "SR",
                    param: params.to_string(),
                }),
            },
            "SB" => match params {
                "1" => Ok(Command::Autorange(true)),
                "0" => Ok(Command::Autorange(false)),
                _ => Err(ParseError::InvalidParameter {
                    command: "SB",
                    param: params.to_string(),
                }),
            },
            "GS" if params == CALIBRATION_SLOT => Ok(Command::CalibrationFactor),
            "GS" => Err(ParseError::InvalidParameter {
                command: "GS",
                param: params.to_string(),
            }),
            "GC" => params
                .parse::<u8>()
                .map(Command::DescriptorByte)
                .map_err(|_| ParseError::InvalidParameter {
                    command: "GC",
                    param: params.to_string(),
                }),
            _ => Err(ParseError::UnknownCommand(line.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}
