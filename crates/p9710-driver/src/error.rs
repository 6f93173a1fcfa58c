//! Error types for the driver
//!
//! Instrument operations never fail; they report missing data as `NaN`, an
//! empty string or [`MeasurementRange::Unknown`](p9710_protocol::MeasurementRange).
//! These errors cover setup and the worker plumbing around a meter.

use thiserror::Error;

/// Errors that can occur around a meter session
#[derive(Debug, Error)]
pub enum DriverError {
    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Failed to start the worker thread
    #[error("failed to start meter worker: {0}")]
    WorkerSpawn(String),

    /// Worker thread has stopped
    #[error("meter worker is no longer running")]
    WorkerGone,

    /// Caller stopped waiting for a reply
    #[error("no result within {0}ms")]
    Timeout(u64),

    /// Range cannot be selected manually
    #[error("range {0} cannot be selected")]
    InvalidRange(p9710_protocol::MeasurementRange),
}
