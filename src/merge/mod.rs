//! # Merge Engine
//!
//! Reconciles a freshly rendered artifact with the file already on disk.
//!
//! Generated files have two generator-owned regions, both delimited by
//! marker comments from [`markers`]:
//!
//! - the **import block**, rewritten on every run as the sorted union of the
//!   imports already present and the ones the fresh artifact needs
//! - the **entries region**, a sequence of keyed entries. Existing entries
//!   are never touched; entries whose key is new are appended just before
//!   the end marker, in the order the fresh artifact lists them
//!
//! Everything outside those two regions belongs to the user and is copied
//! byte for byte, line endings included.
//!
//! ## Error codes
//!
//! Entries of the error-code table carry a numeric value. The value of an
//! existing entry is never changed. A new entry gets one past the highest
//! code in the file, or the configured first code when the table is empty.
//! Codes of removed methods are never handed out again.
//!
//! ## Stale entries
//!
//! Keys present in the file but not in the fresh artifact are reported as
//! stale. They are kept unless pruning is enabled, and the error-code table
//! never prunes so published codes stay reserved.
//!
//! ## Example
//!
//! ```rust,ignore
//! use svcgen::merge::{Merger, RegionMarkers};
//!
//! let merger = Merger::new(RegionMarkers::default()).first_error_code(1000);
//! let outcome = merger.merge(Some(&existing), &fresh)?;
//! if outcome.changed {
//!     std::fs::write(path, &outcome.content)?;
//! }
//! ```

mod codes;
pub mod markers;
mod regions;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::error::{MalformedReason, MalformedTarget, MergeError, RenderError};
use crate::generator::ResolvedArtifact;
use crate::model::ArtifactKind;
use regions::{scan, split_lines, EntrySpan, Layout};

pub use markers::RegionMarkers;

/// Result of one merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Complete new file content
    pub content: String,
    /// Entries added by this merge
    pub inserted: usize,
    /// Entries kept from the existing file
    pub preserved: usize,
    /// Stale entries removed
    pub pruned: usize,
    /// Keys in the existing file that the fresh artifact no longer has
    pub stale: Vec<String>,
    /// Whether `content` differs from what was on disk
    pub changed: bool,
}

impl MergeOutcome {
    fn untouched(existing: Option<&str>) -> Self {
        Self {
            content: existing.unwrap_or_default().to_string(),
            inserted: 0,
            preserved: 0,
            pruned: 0,
            stale: Vec::new(),
            changed: false,
        }
    }
}

/// Merges fresh artifacts into existing files
#[derive(Debug, Clone)]
pub struct Merger {
    markers: RegionMarkers,
    first_error_code: u32,
    prune_stale: bool,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(RegionMarkers::default())
    }
}

impl Merger {
    pub fn new(markers: RegionMarkers) -> Self {
        Self {
            markers,
            first_error_code: 1000,
            prune_stale: false,
        }
    }

    /// Code given to the first entry of an empty error-code table
    pub fn first_error_code(mut self, code: u32) -> Self {
        self.first_error_code = code;
        self
    }

    /// Remove stale logic and router entries instead of only reporting them
    pub fn prune_stale(mut self, prune: bool) -> Self {
        self.prune_stale = prune;
        self
    }

    /// Merge `fresh` into `existing`
    ///
    /// `existing` is `None` when the target file does not exist yet. A file
    /// holding only whitespace is treated the same way. An empty
    /// fresh artifact (no services) returns the existing content unchanged.
    ///
    /// # Errors
    ///
    /// - [`MergeError::MalformedTarget`] if the existing file's markers are
    ///   missing, duplicated, misnested, or an error code cannot be read.
    ///   The caller must leave that file untouched.
    /// - [`MergeError::Render`] if the fresh artifact itself fails the same
    ///   checks.
    pub fn merge(
        &self,
        existing: Option<&str>,
        fresh: &ResolvedArtifact,
    ) -> Result<MergeOutcome, MergeError> {
        let kind = fresh.kind;
        if fresh.is_empty() {
            debug!(kind = %kind, "empty artifact, nothing to merge");
            return Ok(MergeOutcome::untouched(existing));
        }

        let fresh_lines = split_lines(&fresh.content);
        let fresh_layout = scan(&fresh_lines, &self.markers, kind).map_err(|m| {
            MergeError::Render(RenderError::FreshArtifact {
                kind,
                reason: m.reason,
            })
        })?;

        // A blank file has no markers yet; generate it as if it were absent
        let existing = existing.filter(|text| !text.trim().is_empty());
        match existing {
            None if kind != ArtifactKind::ErrorCodeTable => Ok(MergeOutcome {
                content: fresh.content.clone(),
                inserted: fresh_layout.items.len(),
                preserved: 0,
                pruned: 0,
                stale: Vec::new(),
                changed: true,
            }),
            None => {
                // Codes are assigned by merging into the skeleton with no entries
                let skeleton = strip_entries(&fresh_lines, &fresh_layout);
                let mut outcome = self.merge_into(&skeleton, kind, &fresh_lines, &fresh_layout)?;
                outcome.changed = true;
                Ok(outcome)
            }
            Some(existing) => self.merge_into(existing, kind, &fresh_lines, &fresh_layout),
        }
    }

    fn merge_into(
        &self,
        existing: &str,
        kind: ArtifactKind,
        fresh_lines: &[&str],
        fresh_layout: &Layout,
    ) -> Result<MergeOutcome, MergeError> {
        let lines = split_lines(existing);
        let layout = scan(&lines, &self.markers, kind)?;
        let eol = if lines[layout.imports.begin].ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };

        let table = kind == ArtifactKind::ErrorCodeTable;
        let mut next_code = if table {
            self.next_error_code(&lines, &layout, kind)?
        } else {
            None
        };

        let fresh_imports = fresh_layout.import_statements(fresh_lines).map_err(|reason| {
            MergeError::Render(RenderError::FreshArtifact { kind, reason })
        })?;
        let mut imports: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for statement in layout
            .import_statements(&lines)
            .map_err(|reason| MalformedTarget::new(kind, reason))?
            .into_iter()
            .chain(fresh_imports)
        {
            imports.entry(statement.key).or_insert(statement.lines);
        }

        let existing_keys: HashSet<&str> = layout.items.iter().map(|e| e.key.as_str()).collect();
        let fresh_keys: HashSet<&str> = fresh_layout.items.iter().map(|e| e.key.as_str()).collect();

        let mut inserted = 0;
        let mut appended = String::new();
        for entry in &fresh_layout.items {
            if existing_keys.contains(entry.key.as_str()) {
                continue;
            }
            let mut text = Layout::entry_text(fresh_lines, entry);
            if table {
                let code = next_code.ok_or_else(|| {
                    MalformedTarget::new(
                        kind,
                        MalformedReason::CodesExhausted {
                            key: entry.key.clone(),
                        },
                    )
                })?;
                text = codes::assign_code(&text, code);
                next_code = code.checked_add(1);
            }
            appended.push_str(&with_line_endings(&text, eol));
            inserted += 1;
        }

        let stale: Vec<&EntrySpan> = layout
            .items
            .iter()
            .filter(|e| !fresh_keys.contains(e.key.as_str()))
            .collect();
        for entry in &stale {
            debug!(kind = %kind, key = %entry.key, "stale entry");
        }
        let prune = self.prune_stale && !stale.is_empty();
        if prune && kind == ArtifactKind::ErrorCodeTable {
            warn!(
                kind = %kind,
                count = stale.len(),
                "not pruning error codes; stale codes stay reserved"
            );
        }
        let prune = prune && kind != ArtifactKind::ErrorCodeTable;
        let dropped: HashSet<usize> = if prune {
            stale.iter().flat_map(|e| e.start..e.end).collect()
        } else {
            HashSet::new()
        };

        let mut content = String::with_capacity(existing.len() + appended.len());
        for (i, line) in lines.iter().enumerate() {
            if i > layout.imports.begin && i < layout.imports.end {
                continue;
            }
            if dropped.contains(&i) {
                continue;
            }
            if i == layout.entries.end {
                content.push_str(&appended);
            }
            content.push_str(line);
            if i == layout.imports.begin {
                for import in imports.values().flatten() {
                    content.push_str(import);
                    content.push_str(eol);
                }
            }
        }

        let pruned = if prune { stale.len() } else { 0 };
        Ok(MergeOutcome {
            changed: content != existing,
            content,
            inserted,
            preserved: layout.items.len() - pruned,
            pruned,
            stale: stale.iter().map(|e| e.key.clone()).collect(),
        })
    }

    /// Next free code, or `None` when `u32::MAX` is already taken
    fn next_error_code(
        &self,
        lines: &[&str],
        layout: &Layout,
        kind: ArtifactKind,
    ) -> Result<Option<u32>, MalformedTarget> {
        let assigned = layout
            .items
            .iter()
            .map(|entry| {
                codes::parse_code(&lines[entry.start..entry.end]).ok_or_else(|| {
                    MalformedTarget::new(
                        kind,
                        MalformedReason::InvalidErrorCode {
                            key: entry.key.clone(),
                            line: entry.start + 1,
                        },
                    )
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(codes::next_code(assigned, self.first_error_code))
    }
}

/// The fresh artifact with every entry removed
fn strip_entries(lines: &[&str], layout: &Layout) -> String {
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !layout.items.iter().any(|e| (e.start..e.end).contains(i)))
        .map(|(_, l)| *l)
        .collect()
}

/// Rewrite bare `\n` terminators to `eol`
fn with_line_endings(text: &str, eol: &str) -> String {
    if eol == "\n" {
        return text.to_string();
    }
    split_lines(text)
        .into_iter()
        .map(|line| match line.strip_suffix('\n') {
            Some(body) if !body.ends_with('\r') => format!("{body}{eol}"),
            _ => line.to_string(),
        })
        .collect()
}
