//! # CLI Module
//!
//! Command-line interface for the `svcgen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Render the three service files from an AST dump and merge them into what
//! is already on disk:
//!
//! ```bash
//! svcgen generate --ast order.json --out my-service
//! ```
//!
//! Options:
//! - `--ast <FILE>` - AST dump, JSON or YAML (required)
//! - `--out <DIR>` - Output root (default: current directory)
//! - `--module <PATH>` - Rust path of the protobuf types, e.g. `crate::pb`
//! - `--config <FILE>` - `svcgen.toml` (default: next to the AST dump)
//! - `--only <PARTS>` - Any of `logic`, `routes`, `errors`
//! - `--dry-run` - Report without writing
//! - `--prune-stale` - Drop logic and router entries for removed methods
//!
//! ### `check`
//!
//! Fail if running `generate` would change any file. Useful in CI:
//!
//! ```bash
//! svcgen check --ast order.json --out my-service
//! ```
//!
//! ## Logging
//!
//! See [`crate::logging`] for the `SVCGEN_LOG_*` variables.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, load_generator_config, run_cli, Cli, Commands, OnlyPart};
