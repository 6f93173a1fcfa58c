//! Serial line to a real measuring head

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use p9710_protocol::link::{strip_terminator, LINE_TERMINATOR};
use p9710_protocol::{LineLink, TransportError};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace};

/// Upper bound on a reply line; longer input is treated as garbage
const MAX_LINE_LEN: usize = 256;

/// A serial port opened on demand
pub struct SerialLink {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    port_name: String,
    /// Baud rate
    baud_rate: u32,
    /// Open port, if any
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Create a closed link to `port_name`
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            port: None,
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl LineLink for SerialLink {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: self.port_name.clone(),
                reason: e.to_string(),
            })?;

        // Drop anything left over from an earlier, abandoned exchange
        if let Err(e) = port.clear(ClearBuffer::All) {
            debug!("Could not clear buffers on {}: {}", self.port_name, e);
        }

        debug!("Opened {} at {} baud", self.port_name, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            debug!("Closed {}", self.port_name);
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        let framed = format!("{}{}", line, LINE_TERMINATOR);
        port.write_all(framed.as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| TransportError::Write(e.to_string()))?;
        trace!("Wrote {:?}", framed);
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let timeout_ms = timeout.as_millis() as u64;
        let port = self.port_mut()?;
        let deadline = Instant::now() + timeout;
        let mut line = Vec::with_capacity(32);
        let mut byte = [0u8; 1];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout(timeout_ms));
            }
            port.set_timeout(remaining)
                .map_err(|e| TransportError::Read(e.to_string()))?;

            match port.read(&mut byte) {
                Ok(0) => continue,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if line.len() > MAX_LINE_LEN {
                        return Err(TransportError::Read(format!(
                            "reply longer than {} bytes",
                            MAX_LINE_LEN
                        )));
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    return Err(TransportError::Timeout(timeout_ms))
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Read(e.to_string())),
            }
        }

        let text = String::from_utf8_lossy(&line);
        trace!("Read {:?}", text);
        Ok(strip_terminator(&text).to_string())
    }
}
