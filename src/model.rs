//! # Service Model
//!
//! The compiler-agnostic intermediate model and the extractor that builds it
//! from a [`ServiceAst`].
//!
//! Extraction is pure: it performs no I/O and never fails. Malformed input
//! is rejected upstream by the protocol compiler; options the extractor does
//! not understand are skipped. A file that declares no services yields an
//! empty model, which callers treat as "nothing to generate".

use serde_json::Value;
use std::fmt;

use crate::ast::{AstRpc, AstService, ServiceAst};
use crate::generator::naming::to_snake_case;

/// Option carrying the HTTP annotation of a method
pub const HTTP_OPTION: &str = "google.api.http";

/// The three artifacts the generator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Business-logic stubs, one function per method
    LogicStub,
    /// HTTP route registrations, one per binding
    RouterWiring,
    /// Stable numeric error codes, one constant per method
    ErrorCodeTable,
}

impl ArtifactKind {
    /// All kinds, in generation order
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::LogicStub,
        ArtifactKind::RouterWiring,
        ArtifactKind::ErrorCodeTable,
    ];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::LogicStub => "logic stubs",
            ArtifactKind::RouterWiring => "router wiring",
            ArtifactKind::ErrorCodeTable => "error code table",
        };
        f.write_str(name)
    }
}

/// Whether a method streams its request, its reply, both or neither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamingKind {
    Unary,
    ClientStream,
    ServerStream,
    BidiStream,
}

impl StreamingKind {
    pub fn from_flags(request_stream: bool, reply_stream: bool) -> Self {
        match (request_stream, reply_stream) {
            (false, false) => StreamingKind::Unary,
            (true, false) => StreamingKind::ClientStream,
            (false, true) => StreamingKind::ServerStream,
            (true, true) => StreamingKind::BidiStream,
        }
    }

    pub fn streams_request(self) -> bool {
        matches!(self, StreamingKind::ClientStream | StreamingKind::BidiStream)
    }

    pub fn streams_reply(self) -> bool {
        matches!(self, StreamingKind::ServerStream | StreamingKind::BidiStream)
    }
}

/// HTTP verbs a binding can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl HttpVerb {
    /// Lookup order used when reading a `google.api.http` rule
    pub const RULE_KEYS: [(&'static str, HttpVerb); 5] = [
        ("get", HttpVerb::Get),
        ("put", HttpVerb::Put),
        ("post", HttpVerb::Post),
        ("delete", HttpVerb::Delete),
        ("patch", HttpVerb::Patch),
    ];

    /// Upper-case name, as used in route keys
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Put => "PUT",
            HttpVerb::Post => "POST",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
        }
    }

    /// Name of the routing function (`axum::routing::get`, ...)
    pub fn routing_fn(self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Put => "put",
            HttpVerb::Post => "post",
            HttpVerb::Delete => "delete",
            HttpVerb::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP route bound to a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBinding {
    pub verb: HttpVerb,
    /// Route path with captures collapsed to `{name}`
    pub path: String,
    /// `body` field of the rule; `*` means the whole request
    pub body_field: Option<String>,
}

/// One RPC method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub request_type: String,
    pub reply_type: String,
    pub streaming: StreamingKind,
    /// Primary HTTP binding; `None` means RPC-only
    pub http: Option<HttpBinding>,
    /// `additional_bindings` of the HTTP rule
    pub additional_bindings: Vec<HttpBinding>,
    pub comment: Option<String>,
}

impl MethodDescriptor {
    /// Primary binding followed by the additional ones
    pub fn bindings(&self) -> impl Iterator<Item = &HttpBinding> {
        self.http
            .iter()
            .chain(self.http.iter().flat_map(|_| self.additional_bindings.iter()))
    }
}

/// One RPC service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Rust path qualifying this service's message types
    pub package_path: String,
    /// Methods in declaration order
    pub methods: Vec<MethodDescriptor>,
    pub source_comment: Option<String>,
}

impl ServiceDescriptor {
    /// `Service.Method` key for one of this service's methods
    pub fn method_key(&self, method: &MethodDescriptor) -> String {
        method_key(&self.name, &method.name)
    }
}

/// Identity of a method across the whole model
pub fn method_key(service: &str, method: &str) -> String {
    format!("{service}.{method}")
}

/// Build the intermediate model from a parsed source description
///
/// `module_name` is the Rust path under which the protobuf types are
/// generated (e.g. `crate::pb`); each package segment becomes a snake-case
/// submodule of it.
pub fn extract_services(ast: &impl ServiceAst, module_name: &str) -> Vec<ServiceDescriptor> {
    let package_path = package_path(module_name, ast.package());
    ast.services()
        .iter()
        .map(|service| extract_service(service, &package_path))
        .collect()
}

fn extract_service(service: &AstService, package_path: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        name: service.name.clone(),
        package_path: package_path.to_string(),
        methods: service.rpcs.iter().map(extract_method).collect(),
        source_comment: clean_comment(service.comment.as_deref()),
    }
}

fn extract_method(rpc: &AstRpc) -> MethodDescriptor {
    let rule = rpc
        .options
        .iter()
        .find(|o| o.name == HTTP_OPTION)
        .map(|o| &o.value);
    let http = rule.and_then(parse_http_rule);
    let additional_bindings = match (&http, rule) {
        (Some(_), Some(rule)) => rule
            .get("additional_bindings")
            .and_then(Value::as_array)
            .map(|rules| rules.iter().filter_map(parse_http_rule).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    MethodDescriptor {
        name: rpc.name.clone(),
        request_type: rpc.request.trim_start_matches('.').to_string(),
        reply_type: rpc.reply.trim_start_matches('.').to_string(),
        streaming: StreamingKind::from_flags(rpc.request_stream, rpc.reply_stream),
        http,
        additional_bindings,
        comment: clean_comment(rpc.comment.as_deref()),
    }
}

/// Read one `google.api.http` rule; custom patterns are not supported
fn parse_http_rule(rule: &Value) -> Option<HttpBinding> {
    let (verb, path) = HttpVerb::RULE_KEYS.iter().find_map(|(key, verb)| {
        rule.get(*key)
            .and_then(Value::as_str)
            .map(|path| (*verb, path))
    })?;
    let body_field = rule
        .get("body")
        .and_then(Value::as_str)
        .filter(|b| !b.is_empty())
        .map(str::to_string);
    Some(HttpBinding {
        verb,
        path: normalize_path(path),
        body_field,
    })
}

/// Collapse `{name=shelves/*}` captures to `{name}`
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_capture = false;
    let mut skipping = false;
    for c in path.chars() {
        match c {
            '{' => {
                in_capture = true;
                out.push(c);
            }
            '}' => {
                in_capture = false;
                skipping = false;
                out.push(c);
            }
            '=' if in_capture => skipping = true,
            _ if skipping => {}
            _ => out.push(c),
        }
    }
    out
}

fn package_path(module_name: &str, package: Option<&str>) -> String {
    let mut segments: Vec<String> = module_name
        .split("::")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(package) = package {
        segments.extend(
            package
                .split('.')
                .filter(|s| !s.is_empty())
                .map(to_snake_case),
        );
    }
    segments.join("::")
}

fn clean_comment(comment: Option<&str>) -> Option<String> {
    comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
