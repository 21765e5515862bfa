use std::borrow::Cow;

use enquote::{enquote, unescape};

use crate::parser::{ParseError, ParseResult};

#[inline]
fn is_first_ident_char(ch: char) -> bool {
    matches!(ch, 'A'..='Z' | 'a'..='z' | '_' | ':')
}

#[inline]
fn is_ident_char(ch: char) -> bool {
    matches!(ch, 'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | ':')
}

pub fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_first_ident_char(first) => chars.all(is_ident_char),
        _ => false,
    }
}

/// Renders an identifier for display, quoting it when it is not a plain identifier.
pub fn escape_ident(s: &str) -> Cow<'_, str> {
    if is_valid_ident(s) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(quote(s))
    }
}

pub fn quote(str: &str) -> String {
    enquote('"', str)
}

/// extract_string_value interprets token as a single-quoted, double-quoted, or backquoted
/// Prometheus query language string literal, returning the string value that s
/// quotes.
pub fn extract_string_value(token: &str) -> ParseResult<Cow<'_, str>> {
    let n = token.len();

    if n < 2 {
        return Err(ParseError::General(format!(
            "invalid quoted string literal. A minimum of 2 chars needed; got {}",
            token
        )));
    }

    // See https://prometheus.io/docs/prometheus/latest/querying/basics/#string-literals
    let quote_ch = match token.chars().next() {
        Some(ch @ ('"' | '\'' | '`')) => ch,
        Some(ch) => {
            return Err(ParseError::General(format!(
                "invalid quote character {}",
                ch
            )))
        }
        None => return Err(ParseError::General("empty string literal".to_string())),
    };

    if !token.ends_with(quote_ch) {
        return Err(ParseError::General(format!(
            "string literal contains unexpected trailing char; got {}",
            token
        )));
    }

    let s = &token[1..n - 1];

    if quote_ch == '`' {
        return Ok(Cow::Borrowed(s));
    }

    // Is it trivial? Avoid allocation.
    if !s.contains('\\') {
        return Ok(Cow::Borrowed(s));
    }

    handle_unquote(s, quote_ch).map(Cow::Owned)
}

#[inline]
fn handle_unquote(token: &str, quote: char) -> ParseResult<String> {
    unescape(token, Some(quote)).map_err(|err| {
        ParseError::General(format!("cannot parse string literal {token}: {:?}", err))
    })
}
