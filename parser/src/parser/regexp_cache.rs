use regex::Regex;

use crate::parser::{ParseError, ParseResult};

pub fn compile_regexp(re: &str) -> ParseResult<Regex> {
    Regex::new(re).map_err(|e| ParseError::InvalidRegex(e.to_string()))
}

/// is_empty_regex reports whether the (unanchored) label regex matches the empty string.
pub fn is_empty_regex(re: &str) -> bool {
    match re {
        "" | "^$" | "^.*$" | "^.*" | ".*$" | ".*" => true, // cheap check
        _ => match compile_regexp(format!("^(?:{})$", re).as_str()) {
            Err(_) => false,
            Ok(regex) => regex.is_match(""),
        },
    }
}
