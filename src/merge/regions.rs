//! Line scanner that locates and validates the marker regions of a file

use std::collections::HashMap;

use super::markers::RegionMarkers;
use crate::error::{MalformedReason, MalformedTarget};
use crate::model::ArtifactKind;

/// Split text into lines that keep their terminators
///
/// Concatenating the result reproduces the input byte for byte.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Line indices of a begin/end marker pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub begin: usize,
    pub end: usize,
}

/// One keyed entry inside the entries region
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntrySpan {
    pub key: String,
    /// Index of the key line
    pub start: usize,
    /// One past the entry's last line
    pub end: usize,
}

/// One statement of the import block, possibly spanning several lines
#[derive(Debug, Clone)]
pub(crate) struct ImportStatement<'a> {
    /// Whitespace-collapsed text, used for ordering and deduplication
    pub key: String,
    /// Source lines without terminators; the first is trimmed
    pub lines: Vec<&'a str>,
}

impl<'a> ImportStatement<'a> {
    fn new(lines: Vec<&'a str>) -> Self {
        let key = lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        Self { key, lines }
    }
}

/// Validated marker layout of a file
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub imports: Span,
    pub entries: Span,
    pub items: Vec<EntrySpan>,
}

impl Layout {
    /// Statements of the import block, in file order
    ///
    /// A statement runs until a line ending in `;`, so a grouped
    /// `use a::{\n    b,\n};` stays one statement. Comment lines outside a
    /// statement stand alone. Blank lines are dropped.
    pub fn import_statements<'a>(
        &self,
        lines: &[&'a str],
    ) -> Result<Vec<ImportStatement<'a>>, MalformedReason> {
        let mut statements = Vec::new();
        let mut open: Option<(usize, Vec<&'a str>)> = None;
        for (i, &line) in lines
            .iter()
            .enumerate()
            .take(self.imports.end)
            .skip(self.imports.begin + 1)
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let body = line.trim_end_matches(['\r', '\n']);
            match open.as_mut() {
                Some((_, parts)) => parts.push(body),
                None if trimmed.starts_with("//") => {
                    statements.push(ImportStatement::new(vec![trimmed]));
                    continue;
                }
                None => open = Some((i, vec![trimmed])),
            }
            if trimmed.ends_with(';') {
                if let Some((_, parts)) = open.take() {
                    statements.push(ImportStatement::new(parts));
                }
            }
        }
        match open {
            Some((start, _)) => Err(MalformedReason::UnterminatedImport { line: start + 1 }),
            None => Ok(statements),
        }
    }

    /// Text of one entry
    pub fn entry_text(lines: &[&str], entry: &EntrySpan) -> String {
        lines[entry.start..entry.end].concat()
    }
}

/// Locate the regions of a file and reject anything ambiguous
///
/// Each marker must appear exactly once, begin before end, and the two
/// regions must not overlap. Entry key lines must sit inside the entries
/// region and carry unique, non-empty keys.
pub(crate) fn scan(
    lines: &[&str],
    markers: &RegionMarkers,
    kind: ArtifactKind,
) -> Result<Layout, MalformedTarget> {
    let malformed = |reason| MalformedTarget::new(kind, reason);

    let imports = find_pair(lines, &markers.imports_begin, &markers.imports_end)
        .map_err(malformed)?;
    let entries = find_pair(lines, &markers.entries_begin, &markers.entries_end)
        .map_err(malformed)?;

    let disjoint = imports.end < entries.begin || entries.end < imports.begin;
    if !disjoint {
        return Err(malformed(MalformedReason::Misnested {
            detail: format!(
                "import block (lines {}-{}) overlaps entries region (lines {}-{})",
                imports.begin + 1,
                imports.end + 1,
                entries.begin + 1,
                entries.end + 1
            ),
        }));
    }

    let mut items: Vec<EntrySpan> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(key) = markers.entry_key(line.trim()) else {
            continue;
        };
        if i <= entries.begin || i >= entries.end {
            return Err(malformed(MalformedReason::StrayEntryMarker { line: i + 1 }));
        }
        if key.is_empty() {
            return Err(malformed(MalformedReason::EmptyEntryKey { line: i + 1 }));
        }
        if seen.insert(key.to_string(), i).is_some() {
            return Err(malformed(MalformedReason::DuplicateEntry {
                key: key.to_string(),
                line: i + 1,
            }));
        }
        if let Some(prev) = items.last_mut() {
            prev.end = i;
        }
        items.push(EntrySpan {
            key: key.to_string(),
            start: i,
            end: entries.end,
        });
    }

    Ok(Layout {
        imports,
        entries,
        items,
    })
}

fn find_pair(lines: &[&str], begin: &str, end: &str) -> Result<Span, MalformedReason> {
    let begin_at = find_unique(lines, begin)?;
    let end_at = find_unique(lines, end)?;
    if end_at < begin_at {
        return Err(MalformedReason::Misnested {
            detail: format!(
                "`{end}` (line {}) comes before `{begin}` (line {})",
                end_at + 1,
                begin_at + 1
            ),
        });
    }
    Ok(Span {
        begin: begin_at,
        end: end_at,
    })
}

fn find_unique(lines: &[&str], marker: &str) -> Result<usize, MalformedReason> {
    let found: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim() == marker)
        .map(|(i, _)| i)
        .collect();
    match found.as_slice() {
        [] => Err(MalformedReason::MissingMarker {
            marker: marker.to_string(),
        }),
        [only] => Ok(*only),
        _ => Err(MalformedReason::DuplicateMarker {
            marker: marker.to_string(),
            lines: found.iter().map(|i| i + 1).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    const FILE: &str = "\
// header
// svcgen:imports:begin
use a;
// svcgen:imports:end
fn keep() {}
// svcgen:entries:begin
// preamble
// svcgen:entry A.One
fn one() {}

    // svcgen:entry A.Two
fn two() {}
// svcgen:entries:end
// footer
";

    fn scan_str(text: &str) -> Result<Layout, MalformedTarget> {
        scan(&split_lines(text), &RegionMarkers::default(), ArtifactKind::LogicStub)
    }

    #[test]
    fn test_split_lines_round_trips() {
        let text = "a\r\nb\n\nc";
        assert_eq!(split_lines(text).concat(), text);
        assert_eq!(split_lines(text), ["a\r\n", "b\n", "\n", "c"]);
    }

    #[test]
    fn test_scan_finds_regions_and_entries() {
        let layout = scan_str(FILE).unwrap();
        assert_eq!(layout.imports, Span { begin: 1, end: 3 });
        assert_eq!(layout.entries, Span { begin: 5, end: 12 });
        assert_eq!(
            layout.items,
            vec![
                EntrySpan { key: "A.One".into(), start: 7, end: 10 },
                EntrySpan { key: "A.Two".into(), start: 10, end: 12 },
            ]
        );
        let lines = split_lines(FILE);
        let imports = layout.import_statements(&lines).unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].lines, ["use a;"]);
        assert_eq!(
            Layout::entry_text(&lines, &layout.items[0]),
            "// svcgen:entry A.One\nfn one() {}\n\n"
        );
    }

    #[test]
    fn test_missing_marker() {
        let text = FILE.replace("// svcgen:entries:end\n", "");
        let err = scan_str(&text).unwrap_err();
        assert_eq!(
            err.reason,
            MalformedReason::MissingMarker { marker: "// svcgen:entries:end".into() }
        );
    }

    #[test]
    fn test_duplicate_marker() {
        let text = format!("{FILE}// svcgen:imports:begin\n");
        let err = scan_str(&text).unwrap_err();
        assert!(matches!(
            err.reason,
            MalformedReason::DuplicateMarker { ref lines, .. } if lines == &vec![2, 15]
        ));
    }

    #[test]
    fn test_end_before_begin() {
        let text = "// svcgen:imports:end\n// svcgen:imports:begin\n// svcgen:entries:begin\n// svcgen:entries:end\n";
        let err = scan_str(text).unwrap_err();
        assert!(matches!(err.reason, MalformedReason::Misnested { .. }));
    }

    #[test]
    fn test_overlapping_regions() {
        let text = "// svcgen:imports:begin\n// svcgen:entries:begin\n// svcgen:imports:end\n// svcgen:entries:end\n";
        let err = scan_str(text).unwrap_err();
        assert!(matches!(err.reason, MalformedReason::Misnested { .. }));
    }

    #[test]
    fn test_stray_entry_marker() {
        let text = FILE.replace("// footer", "// svcgen:entry A.Three");
        let err = scan_str(&text).unwrap_err();
        assert_eq!(err.reason, MalformedReason::StrayEntryMarker { line: 14 });
    }

    #[test]
    fn test_duplicate_entry() {
        let text = FILE.replace("// svcgen:entry A.Two", "// svcgen:entry A.One");
        let err = scan_str(&text).unwrap_err();
        assert_eq!(
            err.reason,
            MalformedReason::DuplicateEntry { key: "A.One".into(), line: 11 }
        );
    }

    #[test]
    fn test_empty_entry_key() {
        let text = FILE.replace("// svcgen:entry A.Two", "// svcgen:entry");
        let err = scan_str(&text).unwrap_err();
        assert_eq!(err.reason, MalformedReason::EmptyEntryKey { line: 11 });
    }

    #[test]
    fn test_empty_regions() {
        let text = "// svcgen:imports:begin\n// svcgen:imports:end\n// svcgen:entries:begin\n// svcgen:entries:end\n";
        let layout = scan_str(text).unwrap();
        assert!(layout.items.is_empty());
        assert!(layout
            .import_statements(&split_lines(text))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_grouped_use_is_one_statement() {
        let text = "// svcgen:imports:begin\r\nuse std::{\r\n    fmt,\r\n    io,\r\n};\r\n\r\n// grpc\r\nuse tonic::Status;\r\n// svcgen:imports:end\r\n// svcgen:entries:begin\r\n// svcgen:entries:end\r\n";
        let lines = split_lines(text);
        let statements = scan_str(text).unwrap().import_statements(&lines).unwrap();

        let keys: Vec<&str> = statements.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["use std::{ fmt, io, };", "// grpc", "use tonic::Status;"]);
        assert_eq!(statements[0].lines, ["use std::{", "    fmt,", "    io,", "};"]);
    }

    #[test]
    fn test_unterminated_import_is_rejected() {
        let text = "// svcgen:imports:begin\nuse a;\nuse std::{\n    fmt,\n// svcgen:imports:end\n// svcgen:entries:begin\n// svcgen:entries:end\n";
        let lines = split_lines(text);
        let err = scan_str(text)
            .unwrap()
            .import_statements(&lines)
            .unwrap_err();
        assert_eq!(err, MalformedReason::UnterminatedImport { line: 3 });
    }
}
