use crate::parser::{ParseError, ParseResult};

/// Parses a number token: decimal or scientific notation, hex, `Inf` or `NaN`.
pub fn parse_number(s: &str) -> ParseResult<f64> {
    if s.eq_ignore_ascii_case("inf") {
        return Ok(f64::INFINITY);
    }
    if s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .map_err(|_| ParseError::InvalidNumber(s.to_string()));
    }
    s.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))
}
