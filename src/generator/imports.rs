//! # Import Resolver
//!
//! Computes the `use` lines each artifact actually needs, as a pure function
//! of the model. Only what the rendered statements reference is included:
//! streaming support is imported only when some method streams, routing
//! functions only for verbs that are bound, and so on.
//!
//! The result is a sorted, deduplicated set of complete `use …;` lines. The
//! merge engine treats these lines as opaque references when it unions them
//! with an existing import block.

use std::collections::BTreeSet;

use super::naming::{last_segment, type_path};
use super::templates::{route_adapter, RenderConfig};
use crate::model::{ArtifactKind, ServiceDescriptor};

/// Ordered, deduplicated import lines for one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    lines: BTreeSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `use {path};`
    pub fn add_path(&mut self, path: &str) {
        self.lines.insert(format!("use {path};"));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Import lines in their stable order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(line)
    }
}

/// Resolve the imports one artifact kind needs for `services`
pub fn resolve_imports(
    services: &[ServiceDescriptor],
    kind: ArtifactKind,
    config: &RenderConfig,
) -> ImportSet {
    let mut imports = ImportSet::new();
    if services.is_empty() {
        return imports;
    }
    match kind {
        ArtifactKind::LogicStub => logic_imports(services, config, &mut imports),
        ArtifactKind::RouterWiring => router_imports(services, config, &mut imports),
        ArtifactKind::ErrorCodeTable => {}
    }
    imports
}

fn logic_imports(services: &[ServiceDescriptor], config: &RenderConfig, imports: &mut ImportSet) {
    let methods = services.iter().flat_map(|s| s.methods.iter().map(move |m| (s, m)));
    let mut any_method = false;
    for (service, method) in methods {
        any_method = true;
        if method.streaming.streams_request() {
            imports.add_path("tonic::Streaming");
        }
        if method.streaming.streams_reply() {
            imports.add_path("futures::stream::BoxStream");
        }
        for type_ref in [&method.request_type, &method.reply_type] {
            imports.add_path(&type_path(
                &service.package_path,
                &config.module_name,
                type_ref,
            ));
        }
    }
    if any_method {
        imports.add_path("tonic::Status");
        imports.add_path(&config.context_type);
    }
}

fn router_imports(services: &[ServiceDescriptor], config: &RenderConfig, imports: &mut ImportSet) {
    imports.add_path("axum::Router");
    imports.add_path(&config.context_type);

    let mut any_route = false;
    for method in services.iter().flat_map(|s| s.methods.iter()) {
        for binding in method.bindings() {
            any_route = true;
            imports.add_path(&format!("axum::routing::{}", binding.verb.routing_fn()));
            imports.add_path(&format!(
                "{}::{}",
                config.http_adapter_module,
                route_adapter(method.streaming, binding)
            ));
        }
    }
    if any_route {
        imports.add_path(&config.logic_module);
    }
}

/// Identifier the router uses to reach the logic module (`logic`)
pub fn logic_module_ident(config: &RenderConfig) -> &str {
    last_segment(&config.logic_module)
}
