//! Detector identity decoding
//!
//! A detector is trusted only if registers 0-5 spell [`MAGIC_TOKEN`]. The
//! decode reads the descriptor, the token, the free-text field and the serial
//! bytes in a fixed order, one register per round-trip. The order matters for
//! hardware compatibility and must not be rearranged.

use p9710_protocol::identity::{
    decode_text, serial_from_registers, trim_register_text, MAGIC_REGISTERS, SECONDARY_REGISTERS,
    SERIAL_HIGH_REGISTER, SERIAL_LOW_REGISTER,
};
use p9710_protocol::reply::{is_blank, parse_register};
use p9710_protocol::{Command, DetectorIdentity, MAGIC_TOKEN};
use tracing::{debug, info};

use crate::transport::Query;

/// Read register values for `indices`, in order
fn read_registers<Q, I>(query: &mut Q, indices: I) -> Vec<u32>
where
    Q: Query + ?Sized,
    I: IntoIterator<Item = u8>,
{
    indices
        .into_iter()
        .map(|i| parse_register(&query.query(Command::DescriptorByte(i))))
        .collect()
}

/// Decode the attached detector, `None` if absent or not a recognized family
pub fn decode_detector<Q: Query + ?Sized>(query: &mut Q) -> Option<DetectorIdentity> {
    let base = query.query(Command::DetectorDescriptor);
    if is_blank(&base) {
        debug!("No detector descriptor");
        return None;
    }

    let token = decode_text(&read_registers(query, MAGIC_REGISTERS));
    if token != MAGIC_TOKEN {
        debug!("Detector {:?} has foreign token {:?}", base, token);
        return None;
    }

    let secondary = decode_text(&read_registers(query, SECONDARY_REGISTERS));
    let serial = read_registers(query, [SERIAL_LOW_REGISTER, SERIAL_HIGH_REGISTER]);

    let identity = DetectorIdentity {
        base,
        serial_number: serial_from_registers(serial[0], serial[1]),
        secondary: trim_register_text(&secondary).to_string(),
    };
    info!("Detector: {}", identity);
    Some(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    type Registers = HashMap<Command, String>;

    fn text_registers(start: u8, text: &str) -> Vec<(u8, String)> {
        (start..).zip(text.bytes().map(|b| b.to_string())).collect()
    }

    /// Descriptor plus a full register file with the given token and serial bytes
    fn registers(descriptor: &str, token: &str, low: &str, high: &str) -> Registers {
        let mut values = text_registers(0, token);
        values.extend(text_registers(16, "  V(lambda)     "));
        values.push((6, low.to_string()));
        values.push((7, high.to_string()));

        let mut map: Registers = values
            .into_iter()
            .map(|(i, v)| (Command::DescriptorByte(i), v))
            .collect();
        map.insert(Command::DetectorDescriptor, descriptor.to_string());
        map
    }

    /// Decode against `map`, logging every command; unmapped registers read 0
    fn decode(map: &Registers, log: &mut Vec<Command>) -> Option<DetectorIdentity> {
        let mut query = |command: Command| {
            log.push(command);
            map.get(&command).cloned().unwrap_or_else(|| "0".to_string())
        };
        decode_detector(&mut query)
    }

    #[test]
    fn test_decode_valid_detector() {
        let map = registers("PT-9610-5", "PT9610", "103", "18");
        let mut log = Vec::new();

        let identity = decode(&map, &mut log).unwrap();
        assert_eq!(identity.base, "PT-9610-5");
        assert_eq!(identity.serial_number, 18 * 256 + 103);
        assert_eq!(identity.secondary, "V(lambda)");
        assert_eq!(identity.to_string(), "PT-9610-5 SN:4711 (V(lambda))");
    }

    #[test]
    fn test_command_order_is_fixed() {
        let map = registers("PT-9610", "PT9610", "1", "0");
        let mut log = Vec::new();
        decode(&map, &mut log).unwrap();

        let mut expected = vec![Command::DetectorDescriptor];
        expected.extend((0..6).map(Command::DescriptorByte));
        expected.extend((16..32).map(Command::DescriptorByte));
        expected.push(Command::DescriptorByte(6));
        expected.push(Command::DescriptorByte(7));
        assert_eq!(log, expected);
        assert_eq!(log.len(), 25);
    }

    #[test]
    fn test_blank_descriptor_is_absent() {
        let mut map = Registers::new();
        map.insert(Command::DetectorDescriptor, "   ".to_string());
        let mut log = Vec::new();
        assert_eq!(decode(&map, &mut log), None);
        assert_eq!(log, vec![Command::DetectorDescriptor]);
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let map = registers("PT-9610", "XT9610", "1", "2");
        let mut log = Vec::new();
        assert_eq!(decode(&map, &mut log), None);
        // Nothing past the token is read
        assert_eq!(log.len(), 7);
    }

    #[test]
    fn test_unparsable_serial_bytes_count_as_zero() {
        let map = registers("PT-9610", "PT9610", "???", "2");
        let mut log = Vec::new();
        assert_eq!(decode(&map, &mut log).unwrap().serial_number, 512);
    }

    #[test]
    fn test_sentinel_everywhere_is_absent() {
        let mut query = |_: Command| "???".to_string();
        assert_eq!(decode_detector(&mut query), None);
    }

    proptest! {
        #[test]
        fn serial_is_high_byte_times_256_plus_low(low in 0u32..=255, high in 0u32..=255) {
            let map = registers("PT-9610", "PT9610", &low.to_string(), &high.to_string());
            let identity = decode(&map, &mut Vec::new()).unwrap();
            prop_assert_eq!(u32::from(identity.serial_number), high * 256 + low);
        }

        #[test]
        fn foreign_token_is_never_trusted(
            token in "[ -~]{6}".prop_filter("family token", |t| t.as_str() != MAGIC_TOKEN),
            low in 0u32..=255,
            high in 0u32..=255,
        ) {
            let map = registers("PT-9610", &token, &low.to_string(), &high.to_string());
            let mut log = Vec::new();
            prop_assert_eq!(decode(&map, &mut log), None);
            prop_assert_eq!(log.len(), 7);
        }
    }
}
