use crate::parser::{ParseError, ParseResult};

const MILLIS_PER_UNIT: [(&str, i64); 7] = [
    ("y", 365 * 24 * 60 * 60 * 1000),
    ("w", 7 * 24 * 60 * 60 * 1000),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// parse_duration_value returns the duration in milliseconds for the given s.
///
/// Duration in s may be combined, i.e. 2h5m. Units must appear from the largest to
/// the smallest and at most once each, so `5m1h` and `1m1m` are rejected.
pub fn parse_duration_value(s: &str) -> ParseResult<i64> {
    let invalid = || ParseError::InvalidDuration(format!("not a valid duration string: {s:?}"));

    if s.is_empty() {
        return Err(invalid());
    }

    let mut cursor = s;
    let mut total: i64 = 0;
    let mut last_unit_index: Option<usize> = None;

    while !cursor.is_empty() {
        let digits = cursor
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let value: i64 = cursor[..digits].parse().map_err(|_| invalid())?;
        cursor = &cursor[digits..];

        let unit_len = if cursor.starts_with("ms") {
            2
        } else {
            cursor.chars().next().map(|c| c.len_utf8()).unwrap_or(0)
        };
        let unit = &cursor[..unit_len];
        let unit_index = MILLIS_PER_UNIT
            .iter()
            .position(|(name, _)| *name == unit)
            .ok_or_else(invalid)?;

        if let Some(last) = last_unit_index {
            if unit_index <= last {
                return Err(invalid());
            }
        }
        last_unit_index = Some(unit_index);

        let millis = value
            .checked_mul(MILLIS_PER_UNIT[unit_index].1)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| ParseError::InvalidDuration(format!("duration out of range: {s:?}")))?;
        total = millis;
        cursor = &cursor[unit_len..];
    }

    Ok(total)
}

/// Formats milliseconds using the largest units first, i.e. `5400000` becomes `1h30m`.
pub fn format_duration(millis: i64) -> String {
    if millis == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if millis < 0 {
        out.push('-');
    }
    let mut remaining = millis.unsigned_abs();
    for (name, size) in MILLIS_PER_UNIT.iter() {
        let size = *size as u64;
        if remaining >= size {
            out.push_str(&(remaining / size).to_string());
            out.push_str(name);
            remaining %= size;
        }
    }
    out
}
