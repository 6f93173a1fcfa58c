//! P9710 Protocol Library
//!
//! This crate describes the ASCII line protocol of Gigahertz-Optik P9710
//! photocurrent/photometric measuring heads, independent of any transport:
//!
//! - **Commands**: the fixed mnemonic catalog (`GI`, `MA`, `SRn`, `GCn`, ...)
//! - **Replies**: locale-independent number parsing that degrades to `NaN`
//! - **Ranges**: the eight current ranges, code mapping and range estimation
//! - **Uncertainty**: per-range error bounds and standard uncertainty
//! - **Identity**: instrument banners and the detector register layout
//! - **Link**: the [`LineLink`] trait implemented by real and simulated lines
//!
//! # Example
//!
//! ```rust
//! use p9710_protocol::{reply, uncertainty, Command, MeasurementRange};
//!
//! assert_eq!(Command::SelectRange(3).encode(), "SR3");
//!
//! let current = reply::parse_number("1.234E-6");
//! let range = MeasurementRange::estimate(current);
//! assert_eq!(range, MeasurementRange::Range06);
//!
//! let u = uncertainty::standard_uncertainty(current, range);
//! assert!(u > 0.0);
//! ```

pub mod command;
pub mod error;
pub mod identity;
pub mod link;
pub mod range;
pub mod reply;
pub mod uncertainty;

pub use command::Command;
pub use error::{ParseError, TransportError};
pub use identity::{DetectorIdentity, DetectorInfo, InstrumentIdentity, MAGIC_TOKEN, MANUFACTURER};
pub use link::{LineLink, BAUD_RATE};
pub use range::MeasurementRange;
pub use reply::SENTINEL_REPLY;
pub use uncertainty::Specification;
