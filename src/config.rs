//! Generator configuration
//!
//! Projects tune generation through an optional `svcgen.toml` that sits next
//! to the AST dump (or is passed explicitly with `--config`). Every field has
//! a default, so an absent or partial file is fine.
//!
//! ```toml
//! module_name = "crate::pb"
//! first_error_code = 1000
//!
//! [paths]
//! context_type = "crate::svc::ServiceContext"
//! logic_module = "crate::logic"
//! http_adapter_module = "crate::http_adapter"
//!
//! [output]
//! logic = "src/logic.rs"
//! routes = "src/routes.rs"
//! error_codes = "src/error_codes.rs"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::ArtifactKind;

/// File name looked up next to the AST dump
pub const CONFIG_FILE_NAME: &str = "svcgen.toml";

/// Complete generator configuration loaded from `svcgen.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Rust path under which protobuf message types live
    pub module_name: String,
    /// Code given to the first method of an empty error-code table
    pub first_error_code: u32,
    /// Paths referenced by generated code
    pub paths: PathsConfig,
    /// Where each artifact is written, relative to the output root
    pub output: OutputConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_name: "crate::pb".to_string(),
            first_error_code: 1000,
            paths: PathsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Rust paths the generated code imports from the host crate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Type passed to every logic stub and used as router state
    pub context_type: String,
    /// Module holding the logic stubs, referenced by the router
    pub logic_module: String,
    /// Module providing `json_body`, `query` and the streaming adapters
    pub http_adapter_module: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            context_type: "crate::svc::ServiceContext".to_string(),
            logic_module: "crate::logic".to_string(),
            http_adapter_module: "crate::http_adapter".to_string(),
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub logic: PathBuf,
    pub routes: PathBuf,
    pub error_codes: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            logic: PathBuf::from("src/logic.rs"),
            routes: PathBuf::from("src/routes.rs"),
            error_codes: PathBuf::from("src/error_codes.rs"),
        }
    }
}

impl OutputConfig {
    /// Relative output path for an artifact kind
    pub fn path_for(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::LogicStub => &self.logic,
            ArtifactKind::RouterWiring => &self.routes,
            ArtifactKind::ErrorCodeTable => &self.error_codes,
        }
    }
}

/// Load generator configuration from a TOML file
///
/// # Returns
///
/// `Ok(Some(config))` if the file exists and parses,
/// `Ok(None)` if it does not exist (not an error),
/// `Err` if it exists but cannot be read or parsed.
pub fn load_config(config_path: &Path) -> anyhow::Result<Option<GeneratorConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read svcgen config: {}", config_path.display()))?;

    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse svcgen config: {}", config_path.display()))?;

    Ok(Some(config))
}

/// Look for `svcgen.toml` in the same directory as the AST dump
pub fn auto_detect_config_path(ast_path: &Path) -> Option<PathBuf> {
    let dir = ast_path.parent()?;
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Resolve the config path
///
/// Priority:
/// 1. Explicitly provided path (via CLI)
/// 2. Auto-detected alongside the AST dump
/// 3. None (defaults apply)
pub fn resolve_config_path(explicit_path: Option<&Path>, ast_path: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    auto_detect_config_path(ast_path)
}
