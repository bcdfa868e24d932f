//! Marker lines shared by the templates and the merge engine
//!
//! These strings are a file-format contract: generated files written by one
//! version of svcgen must stay mergeable by the next, so they never change.

/// Opens the import block
pub const IMPORTS_BEGIN: &str = "// svcgen:imports:begin";
/// Closes the import block
pub const IMPORTS_END: &str = "// svcgen:imports:end";
/// Opens the generated entries
pub const ENTRIES_BEGIN: &str = "// svcgen:entries:begin";
/// Closes the generated entries; new entries are inserted right before it
pub const ENTRIES_END: &str = "// svcgen:entries:end";
/// Starts one entry; the rest of the line is the entry key
pub const ENTRY_PREFIX: &str = "// svcgen:entry";

/// Stands in for the resolved import lines in a rendered artifact
pub const IMPORT_PLACEHOLDER: &str = "@@svcgen:imports@@";
/// Stands in for an error code until the merge engine assigns one
pub const CODE_PLACEHOLDER: &str = "@@svcgen:code@@";

/// Anchor lines delimiting the generator-owned regions of a target file
///
/// Markers match against trimmed lines, so generated code may indent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMarkers {
    pub imports_begin: String,
    pub imports_end: String,
    pub entries_begin: String,
    pub entries_end: String,
    pub entry_prefix: String,
}

impl Default for RegionMarkers {
    fn default() -> Self {
        Self {
            imports_begin: IMPORTS_BEGIN.to_string(),
            imports_end: IMPORTS_END.to_string(),
            entries_begin: ENTRIES_BEGIN.to_string(),
            entries_end: ENTRIES_END.to_string(),
            entry_prefix: ENTRY_PREFIX.to_string(),
        }
    }
}

impl RegionMarkers {
    /// Key of an entry line, if `trimmed` is one
    ///
    /// Returns `Some("")` for a bare prefix so callers can reject it.
    pub fn entry_key<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        let rest = trimmed.strip_prefix(self.entry_prefix.as_str())?;
        if rest.is_empty() {
            return Some("");
        }
        if rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    }
}
