//! Virtual measuring head
//!
//! Provides a simulated P9710 that answers the full command set over the
//! [`LineLink`] interface. The meter is a cheap handle around shared state,
//! so a test can keep a clone to steer readings and inspect traffic after
//! handing the other clone to a session.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use p9710_protocol::{Command, LineLink, MeasurementRange, TransportError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::detector::VirtualDetector;

/// Configuration for creating a virtual meter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMeterConfig {
    /// Port name reported by the link
    pub port: String,
    /// Reply to `GI`
    pub banner: String,
    /// Reply to `TF`
    pub variant: String,
    /// Reply to `TT`
    pub serial_number: String,
    /// Battery level in percent
    pub battery_level: f64,
    /// Initial photocurrent in amperes
    pub current: f64,
    /// Photometric value per ampere of photocurrent
    pub responsivity: f64,
    /// Calibration factor reported by `GS4`
    pub calibration_factor: f64,
    /// Photometric unit reported by `GU`
    pub photometric_unit: String,
    /// Attached detector
    #[serde(default)]
    pub detector: Option<VirtualDetector>,
}

impl Default for VirtualMeterConfig {
    fn default() -> Self {
        Self {
            port: "SIM0".to_string(),
            banner: "P9710-2 V3.10".to_string(),
            variant: "07".to_string(),
            serial_number: "41207".to_string(),
            battery_level: 87.0,
            current: 1.234e-6,
            responsivity: 1.0e7,
            calibration_factor: 1.0e-7,
            photometric_unit: "lx".to_string(),
            detector: Some(VirtualDetector::pt9610("PT-9610-5", 4711, "V(lambda) 2003")),
        }
    }
}

/// Mutable state behind a [`VirtualMeter`]
#[derive(Debug)]
struct MeterState {
    config: VirtualMeterConfig,
    current: f64,
    autorange: bool,
    manual_range: MeasurementRange,
    open: bool,
    refuse_open: bool,
    silent: bool,
    overrides: HashMap<Command, String>,
    pending: VecDeque<String>,
    received: Vec<String>,
    open_count: usize,
    close_count: usize,
}

/// A simulated measuring head
#[derive(Debug, Clone)]
pub struct VirtualMeter {
    port: String,
    state: Arc<Mutex<MeterState>>,
}

impl VirtualMeter {
    /// Create a virtual meter with default settings
    pub fn new() -> Self {
        Self::from_config(VirtualMeterConfig::default())
    }

    /// Create a virtual meter from configuration
    pub fn from_config(config: VirtualMeterConfig) -> Self {
        let state = MeterState {
            current: config.current,
            config,
            autorange: false,
            manual_range: MeasurementRange::Range03,
            open: false,
            refuse_open: false,
            silent: false,
            overrides: HashMap::new(),
            pending: VecDeque::new(),
            received: Vec::new(),
            open_count: 0,
            close_count: 0,
        };
        Self {
            port: state.config.port.clone(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MeterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the simulated photocurrent
    pub fn set_current(&self, current: f64) {
        self.state().current = current;
    }

    /// Get the simulated photocurrent
    pub fn current(&self) -> f64 {
        self.state().current
    }

    /// Replace the attached detector
    pub fn set_detector(&self, detector: Option<VirtualDetector>) {
        self.state().config.detector = detector;
    }

    /// Answer `command` with a fixed reply instead of the simulated one
    pub fn override_reply(&self, command: Command, reply: impl Into<String>) {
        self.state().overrides.insert(command, reply.into());
    }

    /// Make every open attempt fail
    pub fn set_refuse_open(&self, refuse: bool) {
        self.state().refuse_open = refuse;
    }

    /// Stop answering; reads time out
    pub fn set_silent(&self, silent: bool) {
        self.state().silent = silent;
    }

    /// True while autorange is enabled
    pub fn autorange(&self) -> bool {
        self.state().autorange
    }

    /// Range the head is currently in
    pub fn active_range(&self) -> MeasurementRange {
        self.state().active_range()
    }

    /// Command lines received so far
    pub fn received(&self) -> Vec<String> {
        self.state().received.clone()
    }

    /// Forget received command lines
    pub fn clear_received(&self) {
        self.state().received.clear();
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state().open_count
    }

    /// Number of closes of an open line
    pub fn close_count(&self) -> usize {
        self.state().close_count
    }
}

impl Default for VirtualMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterState {
    fn active_range(&self) -> MeasurementRange {
        if !self.autorange {
            return self.manual_range;
        }
        match MeasurementRange::estimate(self.current) {
            // The amplifier saturates in its least sensitive range
            MeasurementRange::RangeOverflow => MeasurementRange::Range03,
            range => range,
        }
    }

    /// Apply a command and produce the reply line
    fn respond(&mut self, command: Command) -> String {
        if let Some(reply) = self.overrides.get(&command) {
            return reply.clone();
        }

        match command {
            Command::Identify => self.config.banner.clone(),
            Command::SerialNumber => self.config.serial_number.clone(),
            Command::Variant => self.config.variant.clone(),
            Command::PhotometricUnit => self.config.photometric_unit.clone(),
            Command::Current => format!("{:E}", self.current),
            Command::PhotometricValue => format!("{:E}", self.current * self.config.responsivity),
            Command::GetRange => self.active_range().code().unwrap_or_default(),
            Command::SelectRange(code) => {
                if let Some(range) = MeasurementRange::from_index(code) {
                    self.manual_range = range;
                }
                command.encode()
            }
            Command::Autorange(on) => {
                if !on {
                    // Switching to manual keeps the range the head was in
                    self.manual_range = self.active_range();
                }
                self.autorange = on;
                command.encode()
            }
            Command::Battery => format!("{}", self.config.battery_level),
            Command::CalibrationFactor => format!("{:E}", self.config.calibration_factor),
            Command::DetectorDescriptor => self
                .config
                .detector
                .as_ref()
                .map(|d| d.descriptor.clone())
                .unwrap_or_default(),
            Command::DescriptorByte(index) => self
                .config
                .detector
                .as_ref()
                .map(|d| d.register(index))
                .unwrap_or(0)
                .to_string(),
        }
    }
}

impl LineLink for VirtualMeter {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn is_open(&self) -> bool {
        self.state().open
    }

    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.refuse_open {
            return Err(TransportError::OpenFailed {
                port: state.config.port.clone(),
                reason: "simulated open failure".into(),
            });
        }
        if !state.open {
            state.open = true;
            state.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.open {
            state.open = false;
            state.close_count += 1;
            state.pending.clear();
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.state();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        state.received.push(line.to_string());
        trace!("Virtual meter received {:?}", line);

        match Command::parse(line) {
            Ok(command) => {
                let reply = state.respond(command);
                state.pending.push_back(reply);
            }
            Err(e) => debug!("Virtual meter ignoring {:?}: {}", line, e),
        }
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let mut state = self.state();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.silent {
            state.pending.clear();
            return Err(TransportError::Timeout(timeout.as_millis() as u64));
        }
        state
            .pending
            .pop_front()
            .ok_or(TransportError::Timeout(timeout.as_millis() as u64))
    }
}
