//! P9710 Simulation Library
//!
//! This crate provides simulated lines for exercising the driver without a
//! measuring head attached:
//!
//! - **VirtualMeter**: a stateful head answering the full command set
//! - **VirtualDetector**: a detector register file, valid or foreign
//! - **ScriptedLink**: a fixed command-to-reply table for protocol tests
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use p9710_protocol::LineLink;
//! use p9710_sim::VirtualMeter;
//!
//! let mut meter = VirtualMeter::new();
//! meter.set_current(2.5e-7);
//!
//! meter.open().unwrap();
//! meter.write_line("MA").unwrap();
//! let reply = meter.read_line(Duration::from_millis(100)).unwrap();
//! meter.close().unwrap();
//!
//! assert_eq!(reply.parse::<f64>().unwrap(), 2.5e-7);
//! ```

pub mod detector;
pub mod meter;
pub mod script;

pub use detector::VirtualDetector;
pub use meter::{VirtualMeter, VirtualMeterConfig};
pub use script::ScriptedLink;
