//! Line transport seam
//!
//! A [`LineLink`] is the physical side of a session: something that can be
//! opened, carry one command line out and one reply line back, and be closed
//! again. The serial port, the simulator and test scripts all implement it.

use std::time::Duration;

use crate::error::TransportError;

/// Line delimiter appended to every command
pub const LINE_TERMINATOR: &str = "\n";

/// Line speed used by every P9710 head
pub const BAUD_RATE: u32 = 9600;

/// A line-oriented, open-per-use transport
pub trait LineLink: Send {
    /// Name of the port this link talks to
    fn port_name(&self) -> &str;

    /// True while the line is open
    fn is_open(&self) -> bool;

    /// Open the line
    fn open(&mut self) -> Result<(), TransportError>;

    /// Close the line; closing a closed line is not an error
    fn close(&mut self) -> Result<(), TransportError>;

    /// Write one command line, terminator not included in `line`
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Read one reply line with its terminator stripped
    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError>;
}

impl<L: LineLink + ?Sized> LineLink for Box<L> {
    fn port_name(&self) -> &str {
        (**self).port_name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).write_line(line)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        (**self).read_line(timeout)
    }
}

/// Strip a trailing line terminator (`\n`, `\r\n` or `\r`)
pub fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
