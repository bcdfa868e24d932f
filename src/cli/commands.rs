use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::{load_config, resolve_config_path, GeneratorConfig};
use crate::generator::{
    check, generate_service_files, FileStatus, GenerateOptions, GenerationReport,
    GenerationScope,
};

/// Command-line interface for svcgen
#[derive(Parser, Debug)]
#[command(name = "svcgen")]
#[command(about = "Generate and merge service scaffolding from protobuf AST dumps", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available svcgen commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate or update logic stubs, router wiring and error codes
    Generate {
        /// Path to the AST dump (JSON, or YAML with a .yaml/.yml extension)
        #[arg(short, long)]
        ast: PathBuf,

        /// Output root the configured file paths are relative to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Rust path of the generated protobuf types (overrides svcgen.toml)
        #[arg(short, long)]
        module: Option<String>,

        /// Path to svcgen.toml
        /// If not provided, will auto-detect alongside the AST dump
        #[arg(long)]
        config: Option<PathBuf>,

        /// Limit generation to specific files (comma-separated or repeated)
        #[arg(long, value_enum, num_args = 1.., value_delimiter = ',')]
        only: Option<Vec<OnlyPart>>,

        /// Show what would change without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Remove logic and router entries for methods no longer in the AST
        #[arg(long, default_value_t = false)]
        prune_stale: bool,
    },
    /// Exit with an error if any generated file is out of date
    Check {
        /// Path to the AST dump (JSON, or YAML with a .yaml/.yml extension)
        #[arg(short, long)]
        ast: PathBuf,

        /// Output root the configured file paths are relative to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Rust path of the generated protobuf types (overrides svcgen.toml)
        #[arg(short, long)]
        module: Option<String>,

        /// Path to svcgen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Generated files that can be selectively regenerated
///
/// Used with the `--only` flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnlyPart {
    /// Logic stub file
    Logic,
    /// Router wiring file
    Routes,
    /// Error-code table
    Errors,
}

/// Parse arguments, initialise logging and run the command
///
/// # Errors
///
/// Returns an error if logging cannot be initialised, generation fails, or
/// `check` finds out-of-date files.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    crate::logging::init_logging()?;
    execute(&cli)
}

/// Run a parsed command
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate {
            ast,
            out,
            module,
            config,
            only,
            dry_run,
            prune_stale,
        } => {
            let options = GenerateOptions {
                config: load_generator_config(config.as_deref(), ast, module.as_deref())?,
                output_dir: out.clone(),
                scope: map_only_to_scope(only.as_deref()),
                dry_run: *dry_run,
                prune_stale: *prune_stale,
            };
            let report = generate_service_files(ast, &options)?;
            print_report(&report, *dry_run);
            Ok(())
        }
        Commands::Check {
            ast,
            out,
            module,
            config,
        } => {
            let options = GenerateOptions {
                config: load_generator_config(config.as_deref(), ast, module.as_deref())?,
                ..GenerateOptions::new(out.clone())
            };
            let report = check(ast, &options)?;
            print_report(&report, true);
            let stale = report.pending().count();
            if stale > 0 {
                bail!("{stale} generated file(s) out of date; run `svcgen generate`");
            }
            Ok(())
        }
    }
}

/// Resolve and load `svcgen.toml`, then apply CLI overrides
///
/// # Errors
///
/// Returns an error if an explicitly given config file does not exist or
/// any config file fails to parse.
pub fn load_generator_config(
    explicit: Option<&Path>,
    ast: &Path,
    module: Option<&str>,
) -> anyhow::Result<GeneratorConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
    }
    let mut config = match resolve_config_path(explicit, ast) {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?
            .unwrap_or_default(),
        None => GeneratorConfig::default(),
    };
    if let Some(module) = module {
        config.module_name = module.to_string();
    }
    Ok(config)
}

/// Convert CLI `--only` parts to a `GenerationScope`
///
/// If `only` is `None`, all parts are enabled. If `only` is provided,
/// only the specified parts are enabled.
pub(crate) fn map_only_to_scope(only: Option<&[OnlyPart]>) -> GenerationScope {
    let Some(parts) = only else {
        return GenerationScope::all();
    };
    let mut scope = GenerationScope::none();
    for p in parts {
        match p {
            OnlyPart::Logic => scope.logic = true,
            OnlyPart::Routes => scope.routes = true,
            OnlyPart::Errors => scope.errors = true,
        }
    }
    scope
}

fn print_report(report: &GenerationReport, dry_run: bool) {
    for file in &report.files {
        let icon = match file.status {
            FileStatus::Created => "✅",
            FileStatus::Updated => "📝",
            FileStatus::Unchanged => "✔️ ",
            FileStatus::EmptyModel => "ℹ️ ",
        };
        let note = if dry_run && file.is_pending() {
            " (dry run)"
        } else {
            ""
        };
        println!(
            "{icon} {} {}: +{} kept {} pruned {}{note}",
            file.status,
            file.path.display(),
            file.inserted,
            file.preserved,
            file.pruned,
        );
        for key in &file.stale {
            println!("   ⚠️  stale entry `{key}`");
        }
    }
}
