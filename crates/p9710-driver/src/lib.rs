//! P9710 Driver Library
//!
//! This crate drives Gigahertz-Optik P9710 photocurrent meters over a serial
//! line. It provides:
//!
//! - **Meter**: instrument, detector, reading and range operations
//! - **TransportSession**: the open/write/read/close cycle behind every command
//! - **SharedMeter** and **MeterWorker**: serialized access from threads or async code
//! - **PortScanner**: port enumeration and probing for measuring heads
//!
//! # Example
//!
//! ```rust,no_run
//! use p9710_driver::{Meter, SessionConfig};
//!
//! let mut meter = Meter::connect(&SessionConfig::new("/dev/ttyUSB0"));
//! println!("{}", meter.instrument_id());
//!
//! let reading = meter.read_measurement();
//! println!("{:E} A in {} (u = {:E} A)", reading.current, reading.range, reading.uncertainty);
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod meter;
pub mod scanner;
pub mod serial;
pub mod shared;
pub mod transport;
pub mod worker;

pub use config::SessionConfig;
pub use detector::decode_detector;
pub use error::DriverError;
pub use meter::{Measurement, Meter};
pub use scanner::{probe_link, probe_port, PortScanner, SerialPortInfo};
pub use serial::SerialLink;
pub use shared::SharedMeter;
pub use transport::{Query, TransportSession};
pub use worker::{MeterHandle, MeterRequest, MeterWorker};
