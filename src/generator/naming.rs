//! Identifier conversions shared by the extractor and the templates

/// Convert `CamelCase`, `mixedCase` or `kebab-case` to `snake_case`
///
/// Acronyms stay together: `GetOrderByID` → `get_order_by_id`,
/// `HTTPServer` → `http_server`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' || c == ' ' || c == '.' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = if i > 0 { chars.get(i - 1) } else { None };
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Name of the logic stub for a method: `order_create`
pub fn stub_fn_name(service: &str, method: &str) -> String {
    format!("{}_{}", to_snake_case(service), to_snake_case(method))
}

/// Name of the error-code constant for a method: `ORDER_CREATE`
pub fn error_const_name(service: &str, method: &str) -> String {
    stub_fn_name(service, method).to_uppercase()
}

/// Last `::` segment of a Rust path
pub fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Qualify a protobuf type reference with the service's package path
///
/// Dotted references (`google.protobuf.Empty`) are treated as fully
/// qualified and resolved against the module root instead.
pub fn type_path(package_path: &str, module_root: &str, type_ref: &str) -> String {
    match type_ref.rsplit_once('.') {
        Some((package, name)) => {
            let mut segments: Vec<String> = module_root
                .split("::")
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            segments.extend(package.split('.').filter(|s| !s.is_empty()).map(to_snake_case));
            segments.push(name.to_string());
            segments.join("::")
        }
        None if package_path.is_empty() => type_ref.to_string(),
        None => format!("{package_path}::{type_ref}"),
    }
}

/// Bare type name of a protobuf type reference
pub fn type_ident(type_ref: &str) -> &str {
    type_ref.rsplit('.').next().unwrap_or(type_ref)
}
