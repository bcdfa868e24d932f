//! # svcgen
//!
//! **svcgen** generates the service layer of a gRPC/HTTP service from a
//! protobuf AST dump and keeps it current as the `.proto` changes, without
//! ever overwriting code a developer has written.
//!
//! ## Overview
//!
//! Three files are produced per service crate:
//!
//! - **Logic stubs** (`src/logic.rs`) - an async function per RPC method
//! - **Router wiring** (`src/routes.rs`) - axum routes for methods with a
//!   `google.api.http` binding
//! - **Error codes** (`src/error_codes.rs`) - a stable numeric code per method
//!
//! Every file carries marker comments delimiting two generator-owned regions:
//! an import block and a list of keyed entries. On each run the import block
//! is refreshed and entries for new methods are appended. Existing entries and
//! everything outside the markers are left exactly as they are.
//!
//! ## Architecture
//!
//! - **[`ast`]** - the narrow input boundary: services and RPCs as a compiler
//!   plugin dumps them
//! - **[`model`]** - compiler-agnostic service and method descriptors
//! - **[`generator`]** - askama rendering, import resolution and the
//!   file-level orchestrator
//! - **[`merge`]** - the marker-based merge engine
//! - **[`config`]** - `svcgen.toml`
//! - **[`error`]** - typed render and merge errors
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `svcgen` command line
//!
//! ### Generation Flow
//!
//! ```text
//! svcgen generate --ast order.json
//!   ├─ ast::load_ast            parse the JSON/YAML dump
//!   ├─ model::extract_services  normalise services, methods, HTTP bindings
//!   └─ for each file in scope
//!        ├─ generator::render_artifact   askama template → text with placeholders
//!        ├─ generator::resolve_imports   exact `use` lines
//!        ├─ merge::Merger::merge         fold into the existing file
//!        └─ write, only if the content changed
//! ```
//!
//! ## Marker format
//!
//! ```text
//! // svcgen:imports:begin
//! use tonic::Status;
//! // svcgen:imports:end
//!
//! // svcgen:entries:begin
//! // svcgen:entry Order.Create
//! pub async fn order_create(/* ... */) { /* yours */ }
//! // svcgen:entries:end
//! ```
//!
//! Markers are matched on trimmed lines. A file with missing, duplicated or
//! misnested markers is rejected rather than guessed at, and left untouched.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use svcgen::generator::{generate_service_files, GenerateOptions};
//!
//! let report = generate_service_files(Path::new("order.json"), &GenerateOptions::new("."))?;
//! assert!(report.files.iter().all(|f| f.stale.is_empty()));
//! ```

pub mod ast;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod merge;
pub mod model;

pub use error::{MalformedReason, MalformedTarget, MergeError, RenderError};
pub use generator::{generate_service_files, GenerateOptions, GenerationReport};
pub use merge::{MergeOutcome, Merger, RegionMarkers};
