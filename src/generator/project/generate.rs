use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::ast::{load_ast, ServiceAst};
use crate::config::GeneratorConfig;
use crate::generator::templates::{generate_artifact, RenderConfig};
use crate::merge::{MergeOutcome, Merger, RegionMarkers};
use crate::model::{extract_services, ArtifactKind};

/// Which artifacts to regenerate
///
/// Defaults to everything; `--only` narrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationScope {
    pub logic: bool,
    pub routes: bool,
    pub errors: bool,
}

impl GenerationScope {
    pub fn all() -> Self {
        Self {
            logic: true,
            routes: true,
            errors: true,
        }
    }

    pub fn none() -> Self {
        Self {
            logic: false,
            routes: false,
            errors: false,
        }
    }

    pub fn includes(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::LogicStub => self.logic,
            ArtifactKind::RouterWiring => self.routes,
            ArtifactKind::ErrorCodeTable => self.errors,
        }
    }
}

impl Default for GenerationScope {
    fn default() -> Self {
        Self::all()
    }
}

/// Everything one generation run needs besides the AST
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub config: GeneratorConfig,
    /// Root the configured output paths are relative to
    pub output_dir: PathBuf,
    pub scope: GenerationScope,
    /// Compute the report without writing anything
    pub dry_run: bool,
    /// Remove stale logic and router entries
    pub prune_stale: bool,
}

impl GenerateOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: GeneratorConfig::default(),
            output_dir: output_dir.into(),
            scope: GenerationScope::all(),
            dry_run: false,
            prune_stale: false,
        }
    }
}

/// What happened to one target file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The file did not exist
    Created,
    /// The merge changed the file
    Updated,
    /// The file already matched
    Unchanged,
    /// The model has no services; the file was not touched
    EmptyModel,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Unchanged => "unchanged",
            FileStatus::EmptyModel => "empty model",
        };
        f.write_str(s)
    }
}

/// Outcome for one target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub status: FileStatus,
    pub inserted: usize,
    pub preserved: usize,
    pub pruned: usize,
    /// Keys no longer produced by the model
    pub stale: Vec<String>,
}

impl FileReport {
    fn from_outcome(kind: ArtifactKind, path: PathBuf, existed: bool, outcome: &MergeOutcome) -> Self {
        let status = if !existed {
            FileStatus::Created
        } else if outcome.changed {
            FileStatus::Updated
        } else {
            FileStatus::Unchanged
        };
        Self {
            kind,
            path,
            status,
            inserted: outcome.inserted,
            preserved: outcome.preserved,
            pruned: outcome.pruned,
            stale: outcome.stale.clone(),
        }
    }

    /// Whether writing this file would change the disk
    pub fn is_pending(&self) -> bool {
        matches!(self.status, FileStatus::Created | FileStatus::Updated)
    }
}

/// Per-file results of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub files: Vec<FileReport>,
    /// Whether files were actually written
    pub written: bool,
}

impl GenerationReport {
    /// True when no file would change
    pub fn is_up_to_date(&self) -> bool {
        !self.files.iter().any(FileReport::is_pending)
    }

    /// Files that were (or, in a dry run, would be) written
    pub fn pending(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_pending())
    }
}

/// Generate or update the service files for an AST dump
///
/// Loads the AST, then renders, resolves and merges every artifact in scope.
/// All merges complete before the first write, so a malformed target aborts
/// the run with nothing written.
///
/// # Errors
///
/// Returns an error if the AST cannot be loaded, rendering fails, a target
/// file cannot be read or merged, or a write fails.
pub fn generate_service_files(
    ast_path: &Path,
    options: &GenerateOptions,
) -> anyhow::Result<GenerationReport> {
    let ast = load_ast(ast_path)?;
    generate_from_ast(&ast, options)
}

/// Same as [`generate_service_files`] for an AST already in memory
///
/// # Errors
///
/// See [`generate_service_files`].
pub fn generate_from_ast(
    ast: &impl ServiceAst,
    options: &GenerateOptions,
) -> anyhow::Result<GenerationReport> {
    let config = &options.config;
    let services = extract_services(ast, &config.module_name);
    if services.is_empty() {
        warn!(source = %ast.source_name(), "no services in AST, nothing to generate");
    }
    let render = RenderConfig::from_config(config, ast.source_name());
    let merger = Merger::new(RegionMarkers::default())
        .first_error_code(config.first_error_code)
        .prune_stale(options.prune_stale);

    let mut report = GenerationReport::default();
    let mut writes: Vec<(PathBuf, String)> = Vec::new();
    for kind in ArtifactKind::ALL {
        if !options.scope.includes(kind) {
            continue;
        }
        let path = options.output_dir.join(config.output.path_for(kind));
        let fresh = generate_artifact(kind, &services, &render)
            .with_context(|| format!("Failed to render {kind}"))?;
        if fresh.is_empty() {
            report.files.push(FileReport {
                kind,
                path,
                status: FileStatus::EmptyModel,
                inserted: 0,
                preserved: 0,
                pruned: 0,
                stale: Vec::new(),
            });
            continue;
        }

        let existing = read_existing(&path)?;
        let outcome = merger
            .merge(existing.as_deref(), &fresh)
            .map_err(|e| e.with_target(&path))?;
        for key in &outcome.stale {
            warn!(kind = %kind, path = %path.display(), key = %key, "stale entry no longer in the model");
        }

        let existed = existing.as_deref().is_some_and(|text| !text.trim().is_empty());
        let file = FileReport::from_outcome(kind, path, existed, &outcome);
        if file.is_pending() {
            writes.push((file.path.clone(), outcome.content));
        }
        report.files.push(file);
    }

    if !options.dry_run {
        for (path, content) in &writes {
            write_file(path, content)?;
        }
        report.written = !writes.is_empty();
    }

    for file in &report.files {
        info!(
            kind = %file.kind,
            path = %file.path.display(),
            status = %file.status,
            inserted = file.inserted,
            preserved = file.preserved,
            pruned = file.pruned,
            dry_run = options.dry_run,
            "processed target file"
        );
    }
    Ok(report)
}

/// Run the pipeline without writing and report which files are out of date
///
/// # Errors
///
/// See [`generate_service_files`].
pub fn check(ast_path: &Path, options: &GenerateOptions) -> anyhow::Result<GenerationReport> {
    let options = GenerateOptions {
        dry_run: true,
        ..options.clone()
    };
    generate_service_files(ast_path, &options)
}

fn read_existing(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read target file: {}", path.display()))?;
    Ok(Some(content))
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write target file: {}", path.display()))
}
