//! Command-line arguments

use clap::{Parser, Subcommand};

use crate::settings::Overrides;

#[derive(Parser, Debug)]
#[command(name = "p9710")]
#[command(about = "Read and control Gigahertz-Optik P9710 photometer heads", long_about = None)]
pub struct Cli {
    /// Serial port (e.g. /dev/ttyUSB0, COM3)
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(long, global = true)]
    pub baud: Option<u32>,

    /// Reply deadline in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Pause after each command in milliseconds
    #[arg(long, global = true)]
    pub settle_ms: Option<u64>,

    /// Talk to a simulated head instead of a serial port
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            read_timeout_ms: self.timeout_ms,
            settle_delay_ms: self.settle_ms,
            simulate: self.simulate,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show instrument identity and battery level
    Identify,

    /// Show the attached detector
    Detector,

    /// Take one reading with range and uncertainty
    Read,

    /// Show or change the measurement range
    Range {
        #[command(subcommand)]
        action: Option<RangeAction>,
    },

    /// Compute the uncertainty of a current without a meter
    Uncertainty {
        /// Current in amperes, e.g. 1.5e-6 or -2.5e-9
        #[arg(allow_hyphen_values = true, value_parser = clap::value_parser!(f64))]
        current: f64,

        /// Range code 0-7; estimated from the current if omitted
        #[arg(long)]
        range: Option<String>,
    },

    /// List serial ports
    Ports {
        /// Ask each port for a P9710 banner
        #[arg(long)]
        probe: bool,
    },

    /// Show or save the stored settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RangeAction {
    /// Range reported by the head
    Show,
    /// Switch to autorange
    Auto,
    /// Fix the head in a range
    Set {
        /// Range code 0 (1.999 mA) to 7 (199.9 pA)
        code: String,
    },
    /// One range toward larger currents
    Up,
    /// One range toward smaller currents
    Down,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    /// Print the settings file path and contents
    Show,
    /// Store the effective port and timing flags
    Save,
}
