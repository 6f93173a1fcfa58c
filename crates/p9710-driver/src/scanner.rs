//! Serial port scanner
//!
//! This module provides serial port enumeration and probing for measuring
//! heads. A port is taken to carry a P9710 when `GI` answers with a
//! two-token banner.

use p9710_protocol::reply::{is_blank, is_sentinel};
use p9710_protocol::{Command, InstrumentIdentity, LineLink};
use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::DriverError;
use crate::meter::Meter;
use crate::serial::SerialLink;

/// Information about a serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                product: None,
            },
        }
    }

    /// Short description for listings
    pub fn description(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => format!(
                "{} [{:04x}:{:04x}]",
                self.product.as_deref().unwrap_or("USB serial"),
                vid,
                pid
            ),
            _ => "serial".to_string(),
        }
    }
}

/// Serial port scanner
pub struct PortScanner {
    /// Skip ports whose name contains any of these
    skip_patterns: Vec<String>,
}

impl PortScanner {
    /// Create a new scanner with the default skip list
    pub fn new() -> Self {
        Self {
            skip_patterns: vec![
                // Bluetooth ports on macOS
                "Bluetooth".to_string(),
                // Debug console ports
                "debug".to_string(),
            ],
        }
    }

    /// Enumerate all available serial ports
    pub fn enumerate_ports(&self) -> Result<Vec<SerialPortInfo>, DriverError> {
        info!("Enumerating serial ports...");
        let ports =
            available_ports().map_err(|e| DriverError::EnumerationFailed(e.to_string()))?;

        let result: Vec<_> = ports
            .into_iter()
            .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();

        info!("Found {} serial port(s)", result.len());
        for port in &result {
            debug!("  {} - {}", port.port, port.description());
        }
        Ok(result)
    }

    /// Probe every enumerated port and return the ones with a meter attached
    pub fn find_meters(
        &self,
        template: &SessionConfig,
    ) -> Result<Vec<(SerialPortInfo, InstrumentIdentity)>, DriverError> {
        let ports = self.enumerate_ports()?;
        Ok(self.probe_ports(ports, template, |p| {
            SerialLink::new(p.port.clone(), template.baud_rate)
        }))
    }

    /// Probe `ports` over links made by `open`, in order
    pub fn probe_ports<L, F>(
        &self,
        ports: Vec<SerialPortInfo>,
        template: &SessionConfig,
        mut open: F,
    ) -> Vec<(SerialPortInfo, InstrumentIdentity)>
    where
        L: LineLink + 'static,
        F: FnMut(&SerialPortInfo) -> L,
    {
        let found: Vec<_> = ports
            .into_iter()
            .filter_map(|p| {
                let identity = probe_link(open(&p), template)?;
                Some((p, identity))
            })
            .collect();
        info!("Found {} meter(s)", found.len());
        found
    }

    /// Check if a port name matches a skip pattern
    fn should_skip_port(&self, port: &SerialPortInfo) -> bool {
        self.skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe one serial port using the timing from `template`
pub fn probe_port(port: &str, template: &SessionConfig) -> Option<InstrumentIdentity> {
    let link = SerialLink::new(port, template.baud_rate);
    probe_link(link, template)
}

/// Probe any line; leaves the head's range mode untouched
pub fn probe_link(
    link: impl LineLink + 'static,
    template: &SessionConfig,
) -> Option<InstrumentIdentity> {
    let config = SessionConfig {
        select_autorange_on_connect: false,
        ..template.clone()
    };
    let mut meter = Meter::with_link(link, &config);

    let banner = meter.query(Command::Identify);
    if is_blank(&banner) || is_sentinel(&banner) || banner.split_whitespace().count() < 2 {
        debug!("{}: no P9710 banner ({:?})", meter.device_port(), banner);
        return None;
    }

    let identity = meter.identity();
    info!("{}: {}", identity.port, identity.id());
    Some(identity)
}
