//! Reply parsing
//!
//! Replies are plain ASCII text. Numbers use `.` as the decimal separator on
//! every host, so parsing never consults the process locale. Anything that
//! cannot be read turns into `NaN` (numbers) or `0` (register bytes) instead
//! of an error.

use crate::error::ParseError;

/// Reply returned by a session when the line failed
pub const SENTINEL_REPLY: &str = "???";

/// Placeholder for banner fields the instrument did not report
pub const MISSING_FIELD: &str = "?";

/// Strictly parse a decimal number reply
pub fn try_parse_number(reply: &str) -> Result<f64, ParseError> {
    let text = reply.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(reply.to_string()))
}

/// Parse a decimal number reply, `NaN` when unreadable
pub fn parse_number(reply: &str) -> f64 {
    try_parse_number(reply).unwrap_or_else(|e| {
        tracing::debug!("{}", e);
        f64::NAN
    })
}

/// Parse a byte-register reply as an integer, `0` when unreadable
pub fn parse_register(reply: &str) -> u32 {
    let text = reply.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<u32>().unwrap_or(0)
}

/// Map a register value to the character it encodes
///
/// Values that are not Unicode scalar values decode as NUL.
pub fn register_char(value: u32) -> char {
    char::from_u32(value).unwrap_or('\0')
}

/// True when a text reply carries no data
pub fn is_blank(reply: &str) -> bool {
    reply.trim().is_empty()
}

/// True when a reply is the transport failure sentinel
pub fn is_sentinel(reply: &str) -> bool {
    reply == SENTINEL_REPLY
}

/// Split the `GI` banner into `(type prefix, firmware version)`
///
/// Banners with fewer than two space-separated tokens yield `("?", "?")`.
pub fn split_banner(banner: &str) -> (String, String) {
    let mut tokens = banner.split(' ');
    match (tokens.next(), tokens.next()) {
        (Some(prefix), Some(firmware)) => (prefix.to_string(), firmware.to_string()),
        _ => (MISSING_FIELD.to_string(), MISSING_FIELD.to_string()),
    }
}
