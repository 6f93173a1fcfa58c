//! Instrument operations on a measuring head
//!
//! A [`Meter`] owns one [`TransportSession`] and turns each operation into
//! one or more command round-trips. Nothing is cached: every getter queries
//! the head again. Unreadable values come back as `NaN` and unreadable
//! ranges as [`MeasurementRange::Unknown`]. Text replies are trimmed of
//! surrounding whitespace; range codes must match exactly.

use p9710_protocol::reply::{parse_number, split_banner};
use p9710_protocol::uncertainty::{standard_uncertainty, standard_uncertainty_estimated};
use p9710_protocol::{
    identity, Command, DetectorIdentity, DetectorInfo, InstrumentIdentity, LineLink,
    MeasurementRange, MANUFACTURER,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::detector::decode_detector;
use crate::serial::SerialLink;
use crate::transport::{Query, TransportSession};

/// One current reading with its derived range and uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Photocurrent in amperes, `NaN` if unreadable
    pub current: f64,
    /// Range estimated from the magnitude of `current`
    pub range: MeasurementRange,
    /// Standard uncertainty in amperes
    pub uncertainty: f64,
}

impl Measurement {
    /// Derive range and uncertainty for a current
    pub fn from_current(current: f64) -> Self {
        Self {
            current,
            range: MeasurementRange::estimate(current),
            uncertainty: standard_uncertainty_estimated(current),
        }
    }
}

/// A P9710 measuring head behind an owned session
pub struct Meter {
    session: TransportSession,
}

impl Meter {
    /// Open a meter on the serial port named in `config`
    pub fn connect(config: &SessionConfig) -> Self {
        let link = SerialLink::new(config.port.clone(), config.baud_rate);
        Self::with_link(link, config)
    }

    /// Create a meter over any line
    pub fn with_link(link: impl LineLink + 'static, config: &SessionConfig) -> Self {
        Self::from_session(
            TransportSession::from_config(Box::new(link), config),
            config.select_autorange_on_connect,
        )
    }

    /// Wrap an existing session, optionally switching the head to autorange
    pub fn from_session(session: TransportSession, select_autorange: bool) -> Self {
        let mut meter = Self { session };
        info!("Meter on {}", meter.device_port());
        if select_autorange {
            meter.select_autorange();
        }
        meter
    }

    /// Send any catalog command and return the raw reply
    pub fn query(&mut self, command: Command) -> String {
        self.session.query(command)
    }

    fn query_number(&mut self, command: Command) -> f64 {
        parse_number(&self.query(command))
    }

    fn query_text(&mut self, command: Command) -> String {
        self.query(command).trim().to_string()
    }

    // Instrument

    /// Port the head is attached to
    pub fn device_port(&self) -> String {
        self.session.port_name().to_string()
    }

    /// Always the manufacturer of the P9710 family
    pub fn instrument_manufacturer(&self) -> String {
        MANUFACTURER.to_string()
    }

    /// Banner prefix joined with the variant code
    pub fn instrument_type(&mut self) -> String {
        let (prefix, _) = split_banner(&self.query_text(Command::Identify));
        let variant = self.query_text(Command::Variant);
        identity::instrument_type(&prefix, &variant)
    }

    /// Firmware version, the second token of the banner
    pub fn instrument_firmware_version(&mut self) -> String {
        split_banner(&self.query_text(Command::Identify)).1
    }

    pub fn instrument_serial_number(&mut self) -> String {
        self.query_text(Command::SerialNumber)
    }

    /// Battery level in percent
    pub fn instrument_battery_level(&mut self) -> f64 {
        self.query_number(Command::Battery)
    }

    /// `<type> <firmware> SN:<serial> @ <port>`
    pub fn instrument_id(&mut self) -> String {
        self.identity().id()
    }

    /// Query every identity field
    pub fn identity(&mut self) -> InstrumentIdentity {
        let banner = self.query_text(Command::Identify);
        let variant = self.query_text(Command::Variant);
        let serial_number = self.query_text(Command::SerialNumber);
        let battery_level = self.query_number(Command::Battery);
        InstrumentIdentity::from_replies(
            &banner,
            &variant,
            &serial_number,
            battery_level,
            &self.device_port(),
        )
    }

    // Detector

    /// Decoded detector identity, `None` if absent or foreign
    pub fn detector_identity(&mut self) -> Option<DetectorIdentity> {
        decode_detector(&mut self.session)
    }

    /// Detector identity as text, empty if absent or foreign
    pub fn detector_id(&mut self) -> String {
        self.detector_identity()
            .map(|d| d.to_string())
            .unwrap_or_default()
    }

    pub fn detector_calibration_factor(&mut self) -> f64 {
        self.query_number(Command::CalibrationFactor)
    }

    pub fn detector_photometric_unit(&mut self) -> String {
        self.query_text(Command::PhotometricUnit)
    }

    /// Identity, calibration factor and unit of the attached detector
    pub fn detector(&mut self) -> DetectorInfo {
        DetectorInfo {
            identity: self.detector_identity(),
            calibration_factor: self.detector_calibration_factor(),
            photometric_unit: self.detector_photometric_unit(),
        }
    }

    // Readings

    /// Photocurrent in amperes
    pub fn current(&mut self) -> f64 {
        self.query_number(Command::Current)
    }

    /// Photometric value in the detector's unit
    pub fn photometric_value(&mut self) -> f64 {
        self.query_number(Command::PhotometricValue)
    }

    /// Read the current and derive its range and uncertainty
    pub fn read_measurement(&mut self) -> Measurement {
        Measurement::from_current(self.current())
    }

    // Range control

    /// Range reported by the head; anything but an exact code is `Unknown`
    pub fn measurement_range(&mut self) -> MeasurementRange {
        MeasurementRange::from_code(&self.query(Command::GetRange))
    }

    /// Range a current of this magnitude falls into
    pub fn estimate_range(&self, current: f64) -> MeasurementRange {
        MeasurementRange::estimate(current)
    }

    pub fn select_autorange(&mut self) {
        debug!("Selecting autorange");
        self.query(Command::Autorange(true));
    }

    /// Leave autorange and fix the head in `range`
    ///
    /// Sentinel ranges are ignored and nothing is sent.
    pub fn select_manual_range(&mut self, range: MeasurementRange) {
        let Some(index) = range.index() else {
            debug!("Ignoring selection of {:?}", range);
            return;
        };
        debug!("Selecting range {}", range);
        self.query(Command::Autorange(false));
        self.query(Command::SelectRange(index));
    }

    /// Step one range toward larger currents; returns the range now selected
    pub fn range_up(&mut self) -> MeasurementRange {
        let range = self.measurement_range().increment();
        self.select_manual_range(range);
        range
    }

    /// Step one range toward smaller currents; returns the range now selected
    pub fn range_down(&mut self) -> MeasurementRange {
        let range = self.measurement_range().decrement();
        self.select_manual_range(range);
        range
    }

    // Uncertainty

    /// Standard uncertainty of `current` in the range estimated from it
    pub fn measurement_uncertainty(&self, current: f64) -> f64 {
        standard_uncertainty_estimated(current)
    }

    /// Standard uncertainty of `current` measured in `range`
    pub fn measurement_uncertainty_in(&self, current: f64, range: MeasurementRange) -> f64 {
        standard_uncertainty(current, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p9710_sim::{ScriptedLink, VirtualMeter};

    fn config() -> SessionConfig {
        SessionConfig {
            port: "TEST".to_string(),
            read_timeout_ms: 20,
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_construction_selects_autorange() {
        let meter = VirtualMeter::new();
        let _ = Meter::with_link(meter.clone(), &config());
        assert_eq!(meter.received(), vec!["SB1"]);
        assert!(meter.autorange());
    }

    #[test]
    fn test_construction_without_autorange_sends_nothing() {
        let meter = VirtualMeter::new();
        let config = SessionConfig {
            select_autorange_on_connect: false,
            ..config()
        };
        let _ = Meter::with_link(meter.clone(), &config);
        assert!(meter.received().is_empty());
    }

    #[test]
    fn test_instrument_type_and_firmware() {
        let link = ScriptedLink::new("COM3")
            .reply("GI", "1.2 A")
            .reply("TF", "07")
            .reply("TT", "12345")
            .reply("MB", "87");
        let mut meter = Meter::with_link(link, &config());

        assert_eq!(meter.instrument_type(), "1.2-07");
        assert_eq!(meter.instrument_firmware_version(), "A");
        assert_eq!(meter.instrument_id(), "1.2-07 A SN:12345 @ COM3");
        assert_eq!(meter.instrument_manufacturer(), "Gigahertz-Optik GmbH");
    }

    #[test]
    fn test_short_banner_gives_placeholders() {
        let link = ScriptedLink::new("COM3").reply("GI", "P9710").reply("TF", "07");
        let mut meter = Meter::with_link(link, &config());
        assert_eq!(meter.instrument_type(), "?-07");
        assert_eq!(meter.instrument_firmware_version(), "?");
    }

    #[test]
    fn test_unparsable_battery_is_nan() {
        let link = ScriptedLink::new("COM3").reply("MB", "n/a");
        let mut meter = Meter::with_link(link, &config());
        assert!(meter.instrument_battery_level().is_nan());
    }

    #[test]
    fn test_manual_range_sends_sb0_then_sr() {
        let link = ScriptedLink::new("COM3");
        let sent = link.sent_log();
        let mut meter = Meter::with_link(link, &config());

        meter.select_manual_range(MeasurementRange::Range07);
        assert_eq!(*sent.lock().unwrap(), vec!["SB1", "SB0", "SR4"]);
    }

    #[test]
    fn test_sentinel_range_selection_is_ignored() {
        let link = ScriptedLink::new("COM3");
        let sent = link.sent_log();
        let mut meter = Meter::with_link(link, &config());

        meter.select_manual_range(MeasurementRange::Unknown);
        meter.select_manual_range(MeasurementRange::RangeOverflow);
        assert_eq!(*sent.lock().unwrap(), vec!["SB1"]);
    }

    #[test]
    fn test_unreadable_range_is_unknown_and_not_stepped() {
        let link = ScriptedLink::new("COM3");
        let sent = link.sent_log();
        let mut meter = Meter::with_link(link, &config());

        assert_eq!(meter.measurement_range(), MeasurementRange::Unknown);
        assert_eq!(meter.range_up(), MeasurementRange::Unknown);
        assert_eq!(*sent.lock().unwrap(), vec!["SB1", "GR", "GR"]);
    }

    #[test]
    fn test_range_code_must_match_exactly() {
        let link = ScriptedLink::new("COM3").reply("GR", " 3 ");
        let sent = link.sent_log();
        let mut meter = Meter::with_link(link, &config());

        assert_eq!(meter.measurement_range(), MeasurementRange::Unknown);
        assert_eq!(meter.range_down(), MeasurementRange::Unknown);
        assert_eq!(*sent.lock().unwrap(), vec!["SB1", "GR", "GR"]);

        let mut meter = Meter::with_link(ScriptedLink::new("COM3").reply("GR", "3"), &config());
        assert_eq!(meter.measurement_range(), MeasurementRange::Range06);
    }

    #[test]
    fn test_read_measurement() {
        let link = ScriptedLink::new("COM3").reply("MA", "1.234E-6");
        let mut meter = Meter::with_link(link, &config());

        let measurement = meter.read_measurement();
        assert_eq!(measurement.current, 1.234e-6);
        assert_eq!(measurement.range, MeasurementRange::Range06);
        let expected = (0.002 * 1.234e-6 + 1.0e-9) * (1.0f64 / 3.0).sqrt();
        assert!((measurement.uncertainty - expected).abs() < 1e-18);
    }

    #[test]
    fn test_nan_measurement() {
        let measurement = Measurement::from_current(f64::NAN);
        assert_eq!(measurement.range, MeasurementRange::Unknown);
        assert!(measurement.uncertainty.is_nan());
    }
}
