use askama::Template;
use std::collections::{HashMap, HashSet};

use super::imports::{logic_module_ident, resolve_imports, ImportSet};
use super::naming::{error_const_name, last_segment, stub_fn_name, type_ident};
use crate::config::GeneratorConfig;
use crate::error::RenderError;
use crate::merge::markers::{CODE_PLACEHOLDER, IMPORT_PLACEHOLDER};
use crate::model::{ArtifactKind, HttpBinding, ServiceDescriptor, StreamingKind};

/// Settings that shape the rendered text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Rust path under which protobuf message types live
    pub module_name: String,
    /// Path of the context type handed to every stub
    pub context_type: String,
    /// Path of the module holding the logic stubs
    pub logic_module: String,
    /// Path of the module providing the HTTP adapters
    pub http_adapter_module: String,
    /// Source description name, shown in file headers
    pub source_name: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default(), "service.proto")
    }
}

impl RenderConfig {
    pub fn from_config(config: &GeneratorConfig, source_name: &str) -> Self {
        Self {
            module_name: config.module_name.clone(),
            context_type: config.paths.context_type.clone(),
            logic_module: config.paths.logic_module.clone(),
            http_adapter_module: config.paths.http_adapter_module.clone(),
            source_name: source_name.to_string(),
        }
    }

    fn context_ident(&self) -> String {
        last_segment(&self.context_type).to_string()
    }
}

/// Text of one artifact with its import placeholder still unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub kind: ArtifactKind,
    pub content: String,
    /// Token marking where resolved imports go
    pub import_placeholder: &'static str,
}

impl RenderedArtifact {
    fn new(kind: ArtifactKind, content: String) -> Self {
        Self {
            kind,
            content,
            import_placeholder: IMPORT_PLACEHOLDER,
        }
    }

    /// Artifact for a model without services
    pub fn empty(kind: ArtifactKind) -> Self {
        Self::new(kind, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replace the placeholder line with the resolved import lines
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Placeholder`] unless the token appears exactly
    /// once.
    pub fn resolve(&self, imports: &ImportSet) -> Result<ResolvedArtifact, RenderError> {
        if self.is_empty() {
            return Ok(ResolvedArtifact {
                kind: self.kind,
                content: String::new(),
            });
        }
        let found = self.content.matches(self.import_placeholder).count();
        let start = match self.content.find(self.import_placeholder) {
            Some(start) if found == 1 => start,
            _ => {
                return Err(RenderError::Placeholder {
                    kind: self.kind,
                    token: self.import_placeholder.to_string(),
                    found,
                })
            }
        };
        let line_start = self.content[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.content[start..]
            .find('\n')
            .map_or(self.content.len(), |i| start + i + 1);

        let mut content = String::with_capacity(self.content.len() + imports.len() * 48);
        content.push_str(&self.content[..line_start]);
        for line in imports.lines() {
            content.push_str(line);
            content.push('\n');
        }
        content.push_str(&self.content[line_end..]);
        Ok(ResolvedArtifact {
            kind: self.kind,
            content,
        })
    }
}

/// Artifact text ready for the merge engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub kind: ArtifactKind,
    pub content: String,
}

impl ResolvedArtifact {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// One logic stub function
#[derive(Debug, Clone)]
pub struct StubEntry {
    /// `Service.Method`
    pub key: String,
    pub fn_name: String,
    /// Doc comment lines, already prefixed with `///`
    pub docs: Vec<String>,
    /// Type of the `req` argument
    pub request_arg: String,
    /// Success type of the returned `Result`
    pub reply_ret: String,
}

/// Template data for the logic stub file
#[derive(Template)]
#[template(path = "logic.rs.txt", escape = "none")]
pub struct LogicTemplateData {
    pub source: String,
    pub header_lines: Vec<String>,
    pub context_ident: String,
    pub stubs: Vec<StubEntry>,
}

/// One route registration
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// `Service.Method VERB /path`
    pub key: String,
    pub path: String,
    /// `get`, `post`, ...
    pub verb_fn: String,
    /// Adapter turning the stub into an axum handler
    pub adapter: String,
    /// `logic::order_create`
    pub handler: String,
}

/// Template data for the router wiring file
#[derive(Template)]
#[template(path = "routes.rs.txt", escape = "none")]
pub struct RouterTemplateData {
    pub source: String,
    pub header_lines: Vec<String>,
    pub context_ident: String,
    pub routes: Vec<RouteEntry>,
}

/// One error-code constant
#[derive(Debug, Clone)]
pub struct CodeEntry {
    /// `Service.Method`
    pub key: String,
    pub const_name: String,
}

/// Template data for the error-code table
#[derive(Template)]
#[template(path = "error_codes.rs.txt", escape = "none")]
pub struct ErrorCodesTemplateData {
    pub source: String,
    pub header_lines: Vec<String>,
    pub codes: Vec<CodeEntry>,
    /// Value the merge engine replaces with an assigned code
    pub code_placeholder: &'static str,
}

/// Render one artifact kind
///
/// # Errors
///
/// Returns an error if two methods share a key, two error-code constants
/// collide, or the template fails.
pub fn render_artifact(
    kind: ArtifactKind,
    services: &[ServiceDescriptor],
    config: &RenderConfig,
) -> Result<RenderedArtifact, RenderError> {
    match kind {
        ArtifactKind::LogicStub => render_logic_stubs(services, config),
        ArtifactKind::RouterWiring => render_router_wiring(services, config),
        ArtifactKind::ErrorCodeTable => render_error_codes(services, config),
    }
}

/// Render, resolve imports and substitute them in one step
///
/// # Errors
///
/// Same as [`render_artifact`] and [`RenderedArtifact::resolve`].
pub fn generate_artifact(
    kind: ArtifactKind,
    services: &[ServiceDescriptor],
    config: &RenderConfig,
) -> Result<ResolvedArtifact, RenderError> {
    let rendered = render_artifact(kind, services, config)?;
    let imports = resolve_imports(services, kind, config);
    rendered.resolve(&imports)
}

/// Render one `pub async fn` stub per method, grouped by service
///
/// # Errors
///
/// Returns an error on duplicate method keys or template failure.
pub fn render_logic_stubs(
    services: &[ServiceDescriptor],
    config: &RenderConfig,
) -> Result<RenderedArtifact, RenderError> {
    let kind = ArtifactKind::LogicStub;
    if services.is_empty() {
        return Ok(RenderedArtifact::empty(kind));
    }
    check_unique_keys(services)?;

    let stubs = services
        .iter()
        .flat_map(|s| s.methods.iter().map(move |m| (s, m)))
        .map(|(service, method)| {
            let request = type_ident(&method.request_type);
            let reply = type_ident(&method.reply_type);
            StubEntry {
                key: service.method_key(method),
                fn_name: stub_fn_name(&service.name, &method.name),
                docs: doc_lines(method.comment.as_deref()),
                request_arg: if method.streaming.streams_request() {
                    format!("Streaming<{request}>")
                } else {
                    request.to_string()
                },
                reply_ret: if method.streaming.streams_reply() {
                    format!("BoxStream<'static, Result<{reply}, Status>>")
                } else {
                    reply.to_string()
                },
            }
        })
        .collect();

    let data = LogicTemplateData {
        source: config.source_name.clone(),
        header_lines: header_lines(services),
        context_ident: config.context_ident(),
        stubs,
    };
    finish(kind, data.render())
}

/// Render one `.route(..)` entry per HTTP binding; unbound methods are skipped
///
/// # Errors
///
/// Returns an error on duplicate method keys or template failure.
pub fn render_router_wiring(
    services: &[ServiceDescriptor],
    config: &RenderConfig,
) -> Result<RenderedArtifact, RenderError> {
    let kind = ArtifactKind::RouterWiring;
    if services.is_empty() {
        return Ok(RenderedArtifact::empty(kind));
    }
    check_unique_keys(services)?;

    let logic = logic_module_ident(config);
    let mut seen = HashSet::new();
    let mut routes = Vec::new();
    for service in services {
        for method in &service.methods {
            for binding in method.bindings() {
                let key = route_key(&service.method_key(method), binding);
                if !seen.insert(key.clone()) {
                    tracing::debug!(key = %key, "skipping repeated HTTP binding");
                    continue;
                }
                routes.push(RouteEntry {
                    key,
                    path: binding.path.clone(),
                    verb_fn: binding.verb.routing_fn().to_string(),
                    adapter: route_adapter(method.streaming, binding).to_string(),
                    handler: format!("{logic}::{}", stub_fn_name(&service.name, &method.name)),
                });
            }
        }
    }

    let data = RouterTemplateData {
        source: config.source_name.clone(),
        header_lines: header_lines(services),
        context_ident: config.context_ident(),
        routes,
    };
    finish(kind, data.render())
}

/// Render one constant per method with a placeholder value
///
/// # Errors
///
/// Returns an error on duplicate method keys, colliding constant names or
/// template failure.
pub fn render_error_codes(
    services: &[ServiceDescriptor],
    config: &RenderConfig,
) -> Result<RenderedArtifact, RenderError> {
    let kind = ArtifactKind::ErrorCodeTable;
    if services.is_empty() {
        return Ok(RenderedArtifact::empty(kind));
    }
    check_unique_keys(services)?;

    let mut names: HashMap<String, String> = HashMap::new();
    let mut codes = Vec::new();
    for service in services {
        for method in &service.methods {
            let key = service.method_key(method);
            let const_name = error_const_name(&service.name, &method.name);
            if let Some(first) = names.insert(const_name.clone(), key.clone()) {
                return Err(RenderError::NameCollision {
                    name: const_name,
                    first,
                    second: key,
                });
            }
            codes.push(CodeEntry { key, const_name });
        }
    }

    let data = ErrorCodesTemplateData {
        source: config.source_name.clone(),
        header_lines: header_lines(services),
        codes,
        code_placeholder: CODE_PLACEHOLDER,
    };
    finish(kind, data.render())
}

/// Adapter the router wraps a stub in
///
/// Request streams cannot be fed from a single HTTP request, so those
/// methods get an adapter that answers 501.
pub fn route_adapter(streaming: StreamingKind, binding: &HttpBinding) -> &'static str {
    let has_body = binding.body_field.is_some();
    if streaming.streams_request() {
        "unsupported_stream"
    } else if streaming.streams_reply() {
        if has_body {
            "json_stream"
        } else {
            "query_stream"
        }
    } else if has_body {
        "json_body"
    } else {
        "query"
    }
}

/// Key of one route entry: `Service.Method VERB /path`
pub fn route_key(method_key: &str, binding: &HttpBinding) -> String {
    format!("{method_key} {} {}", binding.verb, binding.path)
}

fn check_unique_keys(services: &[ServiceDescriptor]) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for service in services {
        for method in &service.methods {
            let key = service.method_key(method);
            if !seen.insert(key.clone()) {
                return Err(RenderError::DuplicateKey { key });
            }
        }
    }
    Ok(())
}

fn header_lines(services: &[ServiceDescriptor]) -> Vec<String> {
    let mut lines = vec!["//".to_string()];
    for service in services {
        let summary = service
            .source_comment
            .as_deref()
            .and_then(|c| c.lines().map(str::trim).find(|l| !l.is_empty()));
        lines.push(match summary {
            Some(summary) => format!("// {}: {summary}", service.name),
            None => format!("// {}", service.name),
        });
    }
    lines
}

fn doc_lines(comment: Option<&str>) -> Vec<String> {
    comment
        .map(|c| {
            c.lines()
                .map(str::trim)
                .map(|l| {
                    if l.is_empty() {
                        "///".to_string()
                    } else {
                        format!("/// {l}")
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn finish(kind: ArtifactKind, rendered: askama::Result<String>) -> Result<RenderedArtifact, RenderError> {
    let mut content = rendered.map_err(|source| RenderError::Template { kind, source })?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    Ok(RenderedArtifact::new(kind, content))
}
