//! Subcommand handlers
//!
//! Handlers return the text to print so they can run against a simulated
//! head in tests.

use std::fmt::Write;

use p9710_driver::{DriverError, Meter, PortScanner, SessionConfig};
use p9710_protocol::uncertainty::{specified_error, standard_uncertainty};
use p9710_protocol::MeasurementRange;

use crate::cli::RangeAction;

fn amperes(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.4E} A", value)
    }
}

fn range_text(range: MeasurementRange) -> String {
    match range.code() {
        Some(code) => format!("{} ({} full scale)", code, range),
        None => range.to_string(),
    }
}

/// Parse a range code given on the command line
pub fn parse_range(code: &str) -> Result<MeasurementRange, DriverError> {
    let range = MeasurementRange::from_code(code.trim());
    if range.is_operating() {
        Ok(range)
    } else {
        Err(DriverError::InvalidRange(range))
    }
}

pub fn identify(meter: &mut Meter) -> String {
    let identity = meter.identity();
    let battery = if identity.battery_level.is_nan() {
        "n/a".to_string()
    } else {
        format!("{} %", identity.battery_level)
    };

    let mut out = String::new();
    let _ = writeln!(out, "Manufacturer:   {}", identity.manufacturer);
    let _ = writeln!(out, "Type:           {}", identity.instrument_type);
    let _ = writeln!(out, "Firmware:       {}", identity.firmware_version);
    let _ = writeln!(out, "Serial number:  {}", identity.serial_number);
    let _ = writeln!(out, "Battery:        {}", battery);
    let _ = writeln!(out, "Port:           {}", identity.port);
    out
}

pub fn detector(meter: &mut Meter) -> String {
    let detector = meter.detector();
    let id = detector.id();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Detector:            {}",
        if id.is_empty() { "none" } else { id.as_str() }
    );
    let _ = writeln!(out, "Calibration factor:  {:E}", detector.calibration_factor);
    let _ = writeln!(out, "Photometric unit:    {}", detector.photometric_unit);
    out
}

pub fn read(meter: &mut Meter) -> String {
    let measurement = meter.read_measurement();
    let value = meter.photometric_value();
    let unit = meter.detector_photometric_unit();
    let reported = meter.measurement_range();

    let mut out = String::new();
    let _ = writeln!(out, "Current:            {}", amperes(measurement.current));
    let _ = writeln!(out, "Photometric value:  {:E} {}", value, unit);
    let _ = writeln!(out, "Range (head):       {}", range_text(reported));
    let _ = writeln!(out, "Range (estimated):  {}", range_text(measurement.range));
    let _ = writeln!(out, "Uncertainty (k=1):  {}", amperes(measurement.uncertainty));
    out
}

pub fn range(meter: &mut Meter, action: RangeAction) -> Result<String, DriverError> {
    let range = match action {
        RangeAction::Show => meter.measurement_range(),
        RangeAction::Auto => {
            meter.select_autorange();
            return Ok("Autorange\n".to_string());
        }
        RangeAction::Set { code } => {
            let range = parse_range(&code)?;
            meter.select_manual_range(range);
            range
        }
        RangeAction::Up => meter.range_up(),
        RangeAction::Down => meter.range_down(),
    };
    Ok(format!("{}\n", range_text(range)))
}

pub fn uncertainty(current: f64, code: Option<&str>) -> Result<String, DriverError> {
    let range = match code {
        Some(code) => parse_range(code)?,
        None => MeasurementRange::estimate(current),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Current:            {}", amperes(current));
    let _ = writeln!(out, "Range:              {}", range_text(range));
    let _ = writeln!(out, "Specified error:    {}", amperes(specified_error(current, range)));
    let _ = writeln!(out, "Uncertainty (k=1):  {}", amperes(standard_uncertainty(current, range)));
    Ok(out)
}

pub fn ports(probe: bool, template: &SessionConfig) -> Result<String, DriverError> {
    let scanner = PortScanner::new();
    let mut out = String::new();

    if probe {
        let meters = scanner.find_meters(template)?;
        if meters.is_empty() {
            return Ok("No P9710 found\n".to_string());
        }
        for (port, identity) in meters {
            let _ = writeln!(out, "{:<24} {}", port.port, identity.id());
        }
        return Ok(out);
    }

    let ports = scanner.enumerate_ports()?;
    if ports.is_empty() {
        return Ok("No serial ports found\n".to_string());
    }
    for port in ports {
        let _ = writeln!(out, "{:<24} {}", port.port, port.description());
    }
    Ok(out)
}
