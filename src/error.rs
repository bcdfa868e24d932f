//! Error types for rendering and merging generated artifacts
//!
//! Both the renderer and the merge engine are pure, so every error here is
//! deterministic: retrying with the same input reproduces it. Callers report
//! and stop; nothing is retried internally.

use std::fmt;
use std::path::PathBuf;

use crate::model::ArtifactKind;

/// Why an existing target file cannot be merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// A required marker line is absent
    MissingMarker {
        /// The marker text that was expected
        marker: String,
    },
    /// A marker that must be unique appears more than once
    DuplicateMarker {
        /// The duplicated marker text
        marker: String,
        /// 1-based line numbers of every occurrence
        lines: Vec<usize>,
    },
    /// An end marker precedes its begin marker, or two regions overlap
    Misnested {
        /// What was wrong with the ordering
        detail: String,
    },
    /// An entry key line outside the entries region
    StrayEntryMarker {
        /// 1-based line number
        line: usize,
    },
    /// An entry key line with nothing after the prefix
    EmptyEntryKey {
        /// 1-based line number
        line: usize,
    },
    /// Two entries share a key
    DuplicateEntry {
        /// The repeated key
        key: String,
        /// 1-based line number of the second occurrence
        line: usize,
    },
    /// An error-code entry whose value is not a plain integer
    InvalidErrorCode {
        /// Entry key
        key: String,
        /// 1-based line number of the entry's key line
        line: usize,
    },
    /// An import statement that never reaches its closing `;`
    UnterminatedImport {
        /// 1-based line number where the statement starts
        line: usize,
    },
    /// No code above the highest assigned one is left for a new entry
    CodesExhausted {
        /// Entry that could not be numbered
        key: String,
    },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingMarker { marker } => {
                write!(f, "missing marker line `{marker}`")
            }
            MalformedReason::DuplicateMarker { marker, lines } => {
                let lines = lines
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "marker `{marker}` appears more than once (lines {lines})")
            }
            MalformedReason::Misnested { detail } => write!(f, "misnested regions: {detail}"),
            MalformedReason::StrayEntryMarker { line } => {
                write!(f, "entry marker on line {line} is outside the entries region")
            }
            MalformedReason::EmptyEntryKey { line } => {
                write!(f, "entry marker on line {line} has no key")
            }
            MalformedReason::DuplicateEntry { key, line } => {
                write!(f, "entry `{key}` is declared again on line {line}")
            }
            MalformedReason::InvalidErrorCode { key, line } => {
                write!(
                    f,
                    "error code entry `{key}` (line {line}) has no numeric value"
                )
            }
            MalformedReason::UnterminatedImport { line } => {
                write!(
                    f,
                    "import starting on line {line} is not terminated before the end of the import block"
                )
            }
            MalformedReason::CodesExhausted { key } => {
                write!(f, "no error code left above u32::MAX for `{key}`")
            }
        }
    }
}

/// An existing target file whose markers the merge engine cannot reason about
///
/// Fatal for that file: the caller must surface it and leave the file as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTarget {
    /// Artifact kind being merged
    pub kind: ArtifactKind,
    /// Target file, when the caller knows it
    pub target: Option<PathBuf>,
    /// What is wrong with the file
    pub reason: MalformedReason,
}

impl MalformedTarget {
    pub fn new(kind: ArtifactKind, reason: MalformedReason) -> Self {
        Self {
            kind,
            target: None,
            reason,
        }
    }

    /// Attach the target path for reporting
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for MalformedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(path) => write!(
                f,
                "cannot merge {} into {}: {}",
                self.kind,
                path.display(),
                self.reason
            ),
            None => write!(f, "cannot merge {}: {}", self.kind, self.reason),
        }
    }
}

impl std::error::Error for MalformedTarget {}

/// Rendering failed
///
/// These indicate a contract violation between the extractor, renderer and
/// import resolver. They are reported, never recovered from.
#[derive(Debug)]
pub enum RenderError {
    /// The askama template failed to render
    Template {
        kind: ArtifactKind,
        source: askama::Error,
    },
    /// The import placeholder was not found exactly once
    Placeholder {
        kind: ArtifactKind,
        token: String,
        found: usize,
    },
    /// Two methods share a `Service.Method` key
    DuplicateKey { key: String },
    /// Two keys map to the same error-code constant name
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
    /// The renderer produced text the merge engine rejects
    FreshArtifact {
        kind: ArtifactKind,
        reason: MalformedReason,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Template { kind, source } => {
                write!(f, "failed to render {kind}: {source}")
            }
            RenderError::Placeholder { kind, token, found } => write!(
                f,
                "{kind} must contain the import placeholder `{token}` exactly once, found {found}"
            ),
            RenderError::DuplicateKey { key } => {
                write!(f, "method `{key}` is declared more than once")
            }
            RenderError::NameCollision {
                name,
                first,
                second,
            } => write!(
                f,
                "error code constant `{name}` would be generated for both `{first}` and `{second}`"
            ),
            RenderError::FreshArtifact { kind, reason } => {
                write!(f, "rendered {kind} is not mergeable: {reason}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure of a single merge engine invocation
#[derive(Debug)]
pub enum MergeError {
    /// The existing file cannot be merged
    MalformedTarget(MalformedTarget),
    /// The fresh artifact itself is broken
    Render(RenderError),
}

impl MergeError {
    /// Attach the target path to a malformed-target error
    pub fn with_target(self, target: impl Into<PathBuf>) -> Self {
        match self {
            MergeError::MalformedTarget(m) => MergeError::MalformedTarget(m.with_target(target)),
            other => other,
        }
    }
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::MalformedTarget(e) => e.fmt(f),
            MergeError::Render(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::MalformedTarget(e) => Some(e),
            MergeError::Render(e) => Some(e),
        }
    }
}

impl From<MalformedTarget> for MergeError {
    fn from(e: MalformedTarget) -> Self {
        MergeError::MalformedTarget(e)
    }
}

impl From<RenderError> for MergeError {
    fn from(e: RenderError) -> Self {
        MergeError::Render(e)
    }
}
