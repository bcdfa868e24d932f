//! # AST Adapter Boundary
//!
//! `svcgen` does not parse `.proto` files. An external protocol compiler
//! parses them and dumps the service section as JSON or YAML; this module
//! deserializes that dump into a handful of plain records and exposes them
//! through the narrow [`ServiceAst`] trait. Nothing past the extractor ever
//! sees these records.
//!
//! ## Dump Format
//!
//! ```yaml
//! source: order.proto
//! package: order.v1
//! services:
//!   - name: Order
//!     comment: Order management.
//!     rpcs:
//!       - name: Create
//!         request: CreateOrderRequest
//!         reply: CreateOrderReply
//!         options:
//!           - name: google.api.http
//!             value: { post: /orders, body: "*" }
//!       - name: Watch
//!         request: WatchRequest
//!         reply: OrderEvent
//!         reply_stream: true
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Read-only view of one parsed source description
///
/// Adapters for other compilers implement this instead of producing
/// [`ProtoFile`] directly.
pub trait ServiceAst {
    /// Declared package, if any (e.g. `order.v1`)
    fn package(&self) -> Option<&str>;
    /// Name of the source file the AST came from
    fn source_name(&self) -> &str;
    /// Services in declaration order
    fn services(&self) -> &[AstService];
}

/// A parsed source description file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProtoFile {
    /// Source file name, used in generated headers
    #[serde(default)]
    pub source: String,
    /// Protobuf package
    #[serde(default)]
    pub package: Option<String>,
    /// Services in declaration order
    #[serde(default)]
    pub services: Vec<AstService>,
}

/// A `service` block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AstService {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rpcs: Vec<AstRpc>,
}

/// An `rpc` declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AstRpc {
    pub name: String,
    pub request: String,
    pub reply: String,
    /// `stream` on the request side
    #[serde(default)]
    pub request_stream: bool,
    /// `stream` on the reply side
    #[serde(default)]
    pub reply_stream: bool,
    #[serde(default)]
    pub comment: Option<String>,
    /// Method options, e.g. `google.api.http`
    #[serde(default)]
    pub options: Vec<AstOption>,
}

/// A method option with its (already parsed) value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AstOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl ServiceAst for ProtoFile {
    fn package(&self) -> Option<&str> {
        self.package.as_deref().filter(|p| !p.is_empty())
    }

    fn source_name(&self) -> &str {
        &self.source
    }

    fn services(&self) -> &[AstService] {
        &self.services
    }
}

/// Load an AST dump from disk
///
/// `.yaml`/`.yml` files are parsed as YAML, anything else as JSON. When the
/// dump carries no `source`, the file stem plus `.proto` is used.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match the dump
/// format.
pub fn load_ast(path: &Path) -> anyhow::Result<ProtoFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read AST dump: {}", path.display()))?;
    let mut file = parse_ast(&content, is_yaml(path))
        .with_context(|| format!("Failed to parse AST dump: {}", path.display()))?;
    if file.source.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            file.source = format!("{stem}.proto");
        }
    }
    Ok(file)
}

/// Parse an AST dump from a string
///
/// # Errors
///
/// Returns an error if the text is not a valid dump.
pub fn parse_ast(content: &str, yaml: bool) -> anyhow::Result<ProtoFile> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("yaml") || s.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_parse_yaml_dump() {
        let yaml = r#"
source: order.proto
package: order.v1
services:
  - name: Order
    rpcs:
      - name: Create
        request: CreateOrderRequest
        reply: CreateOrderReply
        options:
          - name: google.api.http
            value: { post: /orders, body: "*" }
"#;
        let file = parse_ast(yaml, true).unwrap();
        assert_eq!(file.package(), Some("order.v1"));
        assert_eq!(file.services().len(), 1);
        let rpc = &file.services()[0].rpcs[0];
        assert_eq!(rpc.name, "Create");
        assert!(!rpc.request_stream);
        assert_eq!(rpc.options[0].value["post"], "/orders");
    }

    #[test]
    fn test_parse_json_dump_without_services() {
        let file = parse_ast(r#"{"source": "empty.proto"}"#, false).unwrap();
        assert!(file.services().is_empty());
        assert_eq!(file.package(), None);
    }

    #[test]
    fn test_empty_package_is_none() {
        let file = ProtoFile {
            package: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(file.package(), None);
    }

    #[test]
    fn test_load_ast_defaults_source_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.json");
        std::fs::write(&path, r#"{"services": []}"#).unwrap();
        let file = load_ast(&path).unwrap();
        assert_eq!(file.source_name(), "billing.proto");
    }

    #[test]
    fn test_load_ast_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "services: [").unwrap();
        let err = load_ast(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.yaml"));
    }

    #[test]
    fn test_yaml_extension_is_case_insensitive() {
        assert!(is_yaml(Path::new("order.YAML")));
        assert!(is_yaml(Path::new("order.Yml")));
        assert!(!is_yaml(Path::new("order.json")));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ORDER.YAML");
        std::fs::write(&path, "source: order.proto\nservices: []\n").unwrap();
        let file = load_ast(&path).unwrap();
        assert_eq!(file.source_name(), "order.proto");
    }
}
