//! Session configuration

use std::time::Duration;

use p9710_protocol::BAUD_RATE;
use serde::{Deserialize, Serialize};

/// How to reach a measuring head and how to pace the line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3)
    #[serde(default)]
    pub port: String,
    /// Baud rate
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
    /// Deadline for one reply line, in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Pause after closing the line before it may be reopened, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Send `SB1` when the meter is created
    #[serde(default = "default_true")]
    pub select_autorange_on_connect: bool,
}

fn default_baud() -> u32 {
    BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl SessionConfig {
    /// Default configuration for a port
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into().trim().to_string(),
            ..Default::default()
        }
    }

    /// Reply deadline
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settle delay after close
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud(),
            read_timeout_ms: default_read_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            select_autorange_on_connect: true,
        }
    }
}
