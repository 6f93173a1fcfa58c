//! Integration tests for the P9710 driver
//!
//! These tests verify end-to-end behavior of a meter over simulated lines:
//! - Instrument identification from banner, variant and serial replies
//! - Readings, range estimation and uncertainty
//! - Range control against a stateful head
//! - Detector identity decoding, including foreign and missing detectors
//! - Transport failure absorption

use p9710_driver::{Meter, MeterWorker, SessionConfig, SharedMeter};
use p9710_protocol::{Command, LineLink, MeasurementRange};
use p9710_sim::{ScriptedLink, VirtualDetector, VirtualMeter, VirtualMeterConfig};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Fast session timing for simulated lines
    pub fn config(port: &str) -> SessionConfig {
        SessionConfig {
            read_timeout_ms: 20,
            settle_delay_ms: 0,
            ..SessionConfig::new(port)
        }
    }

    /// A meter over a virtual head, keeping a handle to the head
    pub fn virtual_meter() -> (Meter, VirtualMeter) {
        let head = VirtualMeter::new();
        let meter = Meter::with_link(head.clone(), &config("SIM0"));
        head.clear_received();
        (meter, head)
    }

    pub fn uncertainty(slope: f64, floor: f64, current: f64) -> f64 {
        (slope * current.abs() + floor) * (1.0f64 / 3.0).sqrt()
    }
}

// ============================================================================
// Identification Tests
// ============================================================================

mod identification_tests {
    use super::*;

    #[test]
    fn instrument_type_joins_banner_and_variant() {
        let link = ScriptedLink::new("COM3")
            .reply("GI", "1.2 A")
            .reply("TF", "07")
            .reply("TT", "998")
            .reply("MB", "+55.5");
        let mut meter = Meter::with_link(link, &helpers::config("COM3"));

        let identity = meter.identity();
        assert_eq!(identity.manufacturer, "Gigahertz-Optik GmbH");
        assert_eq!(identity.instrument_type, "1.2-07");
        assert_eq!(identity.firmware_version, "A");
        assert_eq!(identity.serial_number, "998");
        assert_eq!(identity.battery_level, 55.5);
        assert_eq!(identity.port, "COM3");
        assert_eq!(identity.id(), "1.2-07 A SN:998 @ COM3");
    }

    #[test]
    fn battery_reply_not_a_number_is_nan() {
        let link = ScriptedLink::new("COM3").reply("MB", "n/a");
        let mut meter = Meter::with_link(link, &helpers::config("COM3"));
        assert!(meter.instrument_battery_level().is_nan());
    }

    #[test]
    fn identity_is_queried_fresh_every_time() {
        let (mut meter, head) = helpers::virtual_meter();
        meter.instrument_type();
        meter.instrument_type();
        assert_eq!(head.received(), vec!["GI", "TF", "GI", "TF"]);
    }

    #[test]
    fn virtual_head_identity() {
        let (mut meter, _head) = helpers::virtual_meter();
        assert_eq!(meter.instrument_id(), "P9710-2-07 V3.10 SN:41207 @ SIM0");
        assert_eq!(meter.device_port(), "SIM0");
    }
}

// ============================================================================
// Reading Tests
// ============================================================================

mod reading_tests {
    use super::*;

    #[test]
    fn current_reading_with_range_and_uncertainty() {
        let link = ScriptedLink::new("COM3").reply("MA", "1.234E-6");
        let mut meter = Meter::with_link(link, &helpers::config("COM3"));

        let current = meter.current();
        assert_eq!(current, 1.234e-6);
        assert_eq!(meter.estimate_range(current), MeasurementRange::Range06);
        let expected = helpers::uncertainty(0.002, 1.0e-9, current);
        assert!((meter.measurement_uncertainty(current) - expected).abs() < 1e-18);
    }

    #[test]
    fn uncertainty_in_explicit_range() {
        let (meter, _head) = helpers::virtual_meter();
        let expected = helpers::uncertainty(0.005, 2.0e-12, 1.0e-10);
        let actual = meter.measurement_uncertainty_in(1.0e-10, MeasurementRange::Range10);
        assert!((actual - expected).abs() < 1e-24);
        assert!(meter
            .measurement_uncertainty_in(1.0e-10, MeasurementRange::Unknown)
            .is_nan());
    }

    #[test]
    fn photometric_value_follows_current() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_current(2.0e-6);
        let value = meter.photometric_value();
        assert!((value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn negative_current_is_estimated_by_magnitude() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_current(-3.0e-9);
        let measurement = meter.read_measurement();
        assert_eq!(measurement.current, -3.0e-9);
        assert_eq!(measurement.range, MeasurementRange::Range08);
    }

    #[test]
    fn overflowing_current() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_current(5.0e-3);
        let measurement = meter.read_measurement();
        assert_eq!(measurement.range, MeasurementRange::RangeOverflow);
        assert!(measurement.uncertainty.is_nan());
    }
}

// ============================================================================
// Range Control Tests
// ============================================================================

mod range_tests {
    use super::*;

    #[test]
    fn autorange_readback_tracks_current() {
        let (mut meter, head) = helpers::virtual_meter();
        assert!(head.autorange());

        head.set_current(1.5e-4);
        assert_eq!(meter.measurement_range(), MeasurementRange::Range04);
        head.set_current(1.5e-10);
        assert_eq!(meter.measurement_range(), MeasurementRange::Range10);
    }

    #[test]
    fn manual_selection_freezes_range() {
        let (mut meter, head) = helpers::virtual_meter();
        meter.select_manual_range(MeasurementRange::Range05);

        head.set_current(1.0e-9);
        assert_eq!(meter.measurement_range(), MeasurementRange::Range05);
        assert!(!head.autorange());
        assert_eq!(head.received(), vec!["SB0", "SR2", "GR"]);
    }

    #[test]
    fn step_up_and_down() {
        let (mut meter, head) = helpers::virtual_meter();
        meter.select_manual_range(MeasurementRange::Range06);

        assert_eq!(meter.range_up(), MeasurementRange::Range05);
        assert_eq!(head.active_range(), MeasurementRange::Range05);
        assert_eq!(meter.range_down(), MeasurementRange::Range06);
        assert_eq!(meter.range_down(), MeasurementRange::Range07);
        assert_eq!(head.active_range(), MeasurementRange::Range07);
    }

    #[test]
    fn stepping_stops_at_the_ends() {
        let (mut meter, head) = helpers::virtual_meter();

        meter.select_manual_range(MeasurementRange::Range03);
        assert_eq!(meter.range_up(), MeasurementRange::Range03);
        assert_eq!(head.active_range(), MeasurementRange::Range03);

        meter.select_manual_range(MeasurementRange::Range10);
        assert_eq!(meter.range_down(), MeasurementRange::Range10);
        assert_eq!(head.active_range(), MeasurementRange::Range10);
    }

    #[test]
    fn return_to_autorange() {
        let (mut meter, head) = helpers::virtual_meter();
        meter.select_manual_range(MeasurementRange::Range09);
        meter.select_autorange();
        assert!(head.autorange());
    }
}

// ============================================================================
// Detector Tests
// ============================================================================

mod detector_tests {
    use super::*;

    #[test]
    fn default_detector_decodes() {
        let (mut meter, head) = helpers::virtual_meter();

        let detector = meter.detector();
        let identity = detector.identity.clone().unwrap();
        assert_eq!(identity.base, "PT-9610-5");
        assert_eq!(identity.serial_number, 4711);
        assert_eq!(identity.secondary, "V(lambda) 2003");
        assert_eq!(detector.calibration_factor, 1.0e-7);
        assert_eq!(detector.photometric_unit, "lx");

        // 25 register round-trips, then GS4 and GU
        let received = head.received();
        assert_eq!(received.len(), 27);
        assert_eq!(received[0], "GK");
        assert_eq!(received[1], "GC0");
        assert_eq!(received[7], "GC16");
        assert_eq!(received[23], "GC6");
        assert_eq!(received[24], "GC7");
    }

    #[test]
    fn serial_number_from_register_bytes() {
        let (mut meter, head) = helpers::virtual_meter();
        let mut detector = VirtualDetector::pt9610("PT-9610", 0, "");
        detector.set_register(6, 0x34);
        detector.set_register(7, 0x12);
        head.set_detector(Some(detector));

        let identity = meter.detector_identity().unwrap();
        assert_eq!(identity.serial_number, 0x12 * 256 + 0x34);
        assert_eq!(identity.secondary, "");
    }

    #[test]
    fn foreign_detector_is_empty() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_detector(Some(VirtualDetector::with_token(
            "PT-9610-5",
            "PT9611",
            4711,
            "V(lambda)",
        )));
        assert_eq!(meter.detector_id(), "");
        assert_eq!(meter.detector().id(), "");
    }

    #[test]
    fn missing_detector_is_empty() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_detector(None);
        assert!(meter.detector_identity().is_none());
        assert_eq!(head.received(), vec!["GK"]);
    }
}

// ============================================================================
// Transport Failure Tests
// ============================================================================

mod failure_tests {
    use super::*;

    #[test]
    fn unreachable_port_absorbs_everything() {
        let head = VirtualMeter::new();
        head.set_refuse_open(true);
        let mut meter = Meter::with_link(head.clone(), &helpers::config("SIM0"));

        assert!(meter.current().is_nan());
        assert_eq!(meter.measurement_range(), MeasurementRange::Unknown);
        assert_eq!(meter.instrument_firmware_version(), "?");
        assert_eq!(meter.detector_id(), "");
        assert!(head.received().is_empty());
    }

    #[test]
    fn silent_head_yields_sentinel() {
        let (mut meter, head) = helpers::virtual_meter();
        head.set_silent(true);
        assert_eq!(meter.query(Command::Current), "???");
        assert!(meter.current().is_nan());

        head.set_silent(false);
        assert_eq!(meter.query(Command::Variant), "07");
    }

    #[test]
    fn line_is_released_after_every_command() {
        let (mut meter, head) = helpers::virtual_meter();
        meter.detector();
        assert_eq!(head.open_count(), head.close_count());
        assert!(!head.is_open());
    }

    #[test]
    fn custom_head_configuration() {
        let head = VirtualMeter::from_config(VirtualMeterConfig {
            port: "SIM7".to_string(),
            banner: "P9710-1 V2.00".to_string(),
            variant: "01".to_string(),
            ..Default::default()
        });
        let mut meter = Meter::with_link(head, &helpers::config("SIM7"));
        assert_eq!(meter.instrument_type(), "P9710-1-01");
    }
}

// ============================================================================
// Shared Access Tests
// ============================================================================

mod shared_tests {
    use super::*;
    use std::thread;

    #[test]
    fn readings_from_many_threads() {
        let (meter, head) = helpers::virtual_meter();
        head.set_current(4.2e-7);
        let shared = SharedMeter::new(meter);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.read_measurement())
            })
            .collect();

        for reader in readers {
            let measurement = reader.join().unwrap();
            assert_eq!(measurement.current, 4.2e-7);
            assert_eq!(measurement.range, MeasurementRange::Range06);
        }
    }

    #[tokio::test]
    async fn worker_serves_identity_and_detector() {
        let (meter, _head) = helpers::virtual_meter();
        let handle = MeterWorker::spawn(meter).unwrap();

        let identity = handle.identity().await.unwrap();
        assert_eq!(identity.instrument_type, "P9710-2-07");

        let detector = handle.detector().await.unwrap();
        assert_eq!(detector.id(), "PT-9610-5 SN:4711 (V(lambda) 2003)");

        handle.shutdown().await.unwrap();
    }
}
