use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};

/// The literal substituted for every dashboard macro. It is a valid duration, so
/// macros used as range, step or offset values keep the query parseable.
pub const MACRO_PLACEHOLDER: &str = "5m";

fn macro_regex() -> &'static Regex {
    static MACRO_RE: OnceLock<Regex> = OnceLock::new();
    MACRO_RE.get_or_init(|| Regex::new(r"\$[A-Za-z0-9_]+").expect("macro pattern is valid"))
}

/// Replaces dashboard macros such as `$__rate_interval` or `$interval` with
/// [`MACRO_PLACEHOLDER`].
///
/// A `$` must be followed by at least one ASCII letter, digit or underscore to be
/// treated as a macro; anything else is left untouched, including `${var}` and
/// `[[var]]` forms. Text without macros is returned borrowed.
pub fn normalize_macros(text: &str) -> Cow<'_, str> {
    macro_regex().replace_all(text, NoExpand(MACRO_PLACEHOLDER))
}
