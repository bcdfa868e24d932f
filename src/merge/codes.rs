//! Error-code values inside the error-code table

use once_cell::sync::Lazy;
use regex::Regex;

use super::markers::CODE_PLACEHOLDER;

/// `pub const NAME: u32 = 1001;`, capturing the value
static CODE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*pub\s+const\s+[A-Za-z_][A-Za-z0-9_]*\s*:\s*u32\s*=\s*([0-9][0-9_]*)\s*;")
        .expect("error code regex should be valid")
});

/// Code assigned to an entry, taken from its first constant line
///
/// Returns `None` when the entry has no constant, still holds the
/// placeholder, or the value does not fit in a `u32`.
pub(crate) fn parse_code(entry_lines: &[&str]) -> Option<u32> {
    let caps = entry_lines.iter().find_map(|line| CODE_LINE.captures(line))?;
    caps[1].replace('_', "").parse().ok()
}

/// Substitute the code placeholder of one entry
pub(crate) fn assign_code(entry: &str, code: u32) -> String {
    entry.replacen(CODE_PLACEHOLDER, &code.to_string(), 1)
}

/// Code for the next new entry: one past the highest assigned code
///
/// Returns `None` on overflow.
pub(crate) fn next_code(assigned: impl IntoIterator<Item = u32>, first: u32) -> Option<u32> {
    match assigned.into_iter().max() {
        Some(max) => max.checked_add(1),
        None => Some(first),
    }
}
