//! # Generator Module
//!
//! The generator turns the services of a protobuf AST dump into three Rust
//! source files and keeps them in sync as the `.proto` evolves.
//!
//! ## Overview
//!
//! For every run the generator produces:
//! - **Logic stubs** - one `pub async fn` per RPC method, returning
//!   `Status::unimplemented` until the user fills it in
//! - **Router wiring** - one axum `.route(..)` per HTTP binding
//!   (`google.api.http`); methods without a binding get no route
//! - **Error-code table** - one stable `u32` constant per method
//!
//! ## Architecture
//!
//! ```text
//! AST dump → extract_services → render_artifact → resolve_imports → Merger → disk
//! ```
//!
//! 1. **Extraction** ([`crate::model`]) - normalises services, methods and
//!    HTTP bindings into a deterministic model
//! 2. **Rendering** - fills the askama templates in `templates/`, leaving an
//!    import placeholder and, for error codes, code placeholders
//! 3. **Import resolution** - computes exactly the `use` lines the rendered
//!    statements need
//! 4. **Merging** ([`crate::merge`]) - folds the fresh text into the file on
//!    disk without touching user edits
//!
//! Steps 1 to 4 are pure; only [`generate_service_files`] touches the
//! filesystem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//! use svcgen::generator::{generate_service_files, GenerateOptions};
//!
//! let options = GenerateOptions::new("my-service");
//! let report = generate_service_files(Path::new("order.json"), &options)?;
//! for file in report.pending() {
//!     println!("{} {}", file.status, file.path.display());
//! }
//! ```
//!
//! ## Generation Scopes
//!
//! [`GenerationScope`] selects which of the three files a run touches, so a
//! project can own its router by hand and still regenerate stubs and codes.
//!
//! ## Templates
//!
//! - `logic.rs.txt` - logic stub file
//! - `routes.rs.txt` - router wiring file
//! - `error_codes.rs.txt` - error-code table

mod imports;
pub mod naming;
mod project;
mod templates;

pub use imports::{resolve_imports, ImportSet};
pub use project::{
    check, generate_from_ast, generate_service_files, FileReport, FileStatus, GenerateOptions,
    GenerationReport, GenerationScope,
};
pub use templates::{
    generate_artifact, render_artifact, render_error_codes, render_logic_stubs,
    render_router_wiring, route_adapter, route_key, RenderConfig, RenderedArtifact,
    ResolvedArtifact,
};
