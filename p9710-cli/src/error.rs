//! Error types for the command-line tool

use p9710_driver::DriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Driver setup or worker failure
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Neither a port nor simulation was requested
    #[error("no serial port given; pass --port, use --simulate, or save a port with `p9710 settings save`")]
    NoPort,

    /// Settings file could not be written
    #[error("{0}")]
    Settings(String),
}
