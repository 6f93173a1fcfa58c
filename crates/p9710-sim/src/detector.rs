//! Simulated detector heads
//!
//! A detector is a descriptor string plus a sparse register file. Registers
//! that were never written read back as `0`.

use std::collections::BTreeMap;

use p9710_protocol::identity::{
    MAGIC_REGISTERS, MAGIC_TOKEN, SECONDARY_REGISTERS, SERIAL_HIGH_REGISTER, SERIAL_LOW_REGISTER,
};
use serde::{Deserialize, Serialize};

/// A detector attached to a virtual meter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDetector {
    /// Reply to `GK`
    pub descriptor: String,
    /// Register file read by `GCn`
    #[serde(default)]
    pub registers: BTreeMap<u8, u32>,
}

impl VirtualDetector {
    /// A detector with a valid `PT9610` register layout
    pub fn pt9610(descriptor: impl Into<String>, serial_number: u16, secondary: &str) -> Self {
        Self::with_token(descriptor, MAGIC_TOKEN, serial_number, secondary)
    }

    /// A detector carrying an arbitrary family token
    pub fn with_token(
        descriptor: impl Into<String>,
        token: &str,
        serial_number: u16,
        secondary: &str,
    ) -> Self {
        let mut detector = Self {
            descriptor: descriptor.into(),
            registers: BTreeMap::new(),
        };
        detector.write_text(MAGIC_REGISTERS.start, MAGIC_REGISTERS.len(), token);
        detector.write_text(SECONDARY_REGISTERS.start, SECONDARY_REGISTERS.len(), secondary);
        let [low, high] = serial_number.to_le_bytes();
        detector.set_register(SERIAL_LOW_REGISTER, u32::from(low));
        detector.set_register(SERIAL_HIGH_REGISTER, u32::from(high));
        detector
    }

    /// Overwrite one register
    pub fn set_register(&mut self, index: u8, value: u32) {
        self.registers.insert(index, value);
    }

    /// Value of one register
    pub fn register(&self, index: u8) -> u32 {
        self.registers.get(&index).copied().unwrap_or(0)
    }

    /// Write `text` into `len` registers from `start`, space padded
    fn write_text(&mut self, start: u8, len: usize, text: &str) {
        let padded = text.chars().chain(std::iter::repeat(' ')).take(len);
        for (offset, ch) in (start..).zip(padded) {
            self.set_register(offset, u32::from(ch));
        }
    }
}
