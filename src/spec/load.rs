use super::build::{build_operations, build_schemas};
use super::types::{ResolvedSpec, SpecMetadata};
use crate::error::{EngineError, EngineResult};
use base64::Engine as _;
use oas3::OpenApiV3Spec;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// Prefix selecting a specification compiled into the binary.
pub const BUNDLED_PREFIX: &str = "bundled:";

const BUNDLED_SPECS: &[(&str, &str)] = &[
    (
        "legacy-gateway.yaml",
        include_str!("../../specs/legacy-gateway.yaml"),
    ),
    (
        "target-gateway.yaml",
        include_str!("../../specs/target-gateway.yaml"),
    ),
];

/// Names of the specifications available through [`BUNDLED_PREFIX`].
pub fn bundled_specs() -> impl Iterator<Item = &'static str> {
    BUNDLED_SPECS.iter().map(|(name, _)| *name)
}

fn strip_unknown_verbs(val: &mut Value) {
    const KEPT: [&str; 13] = [
        "get", "post", "put", "delete", "patch", "options", "head", "trace", "summary",
        "description", "servers", "parameters", "$ref",
    ];
    if let Some(Value::Object(paths)) = val.get_mut("paths") {
        for item in paths.values_mut() {
            if let Value::Object(obj) = item {
                obj.retain(|k, _| KEPT.contains(&k.to_ascii_lowercase().as_str()) || k.starts_with("x-"));
            }
        }
    }
}

fn read_source(location: &str) -> EngineResult<String> {
    if let Some(name) = location.strip_prefix(BUNDLED_PREFIX) {
        return BUNDLED_SPECS
            .iter()
            .find(|(bundled, _)| *bundled == name.trim_start_matches('/'))
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| EngineError::SpecNotFound {
                path: location.to_string(),
            });
    }
    let path = Path::new(location);
    if !path.is_file() {
        return Err(EngineError::SpecNotFound {
            path: location.to_string(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse text as YAML or JSON depending on the extension.
///
/// Unknown extensions try JSON first and fall back to YAML; every parser
/// error is kept for the diagnostic message.
fn parse_document(location: &str, content: &str) -> Result<Value, Vec<String>> {
    let lower = location.to_ascii_lowercase();
    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        return serde_yaml::from_str(content).map_err(|e| vec![format!("yaml: {e}")]);
    }
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_err) if lower.ends_with(".json") => Err(vec![format!("json: {json_err}")]),
        Err(json_err) => serde_yaml::from_str(content)
            .map_err(|yaml_err| vec![format!("json: {json_err}"), format!("yaml: {yaml_err}")]),
    }
}

fn structural_diagnostics(value: &Value) -> Vec<String> {
    let mut diagnostics = Vec::new();
    if !value.is_object() {
        diagnostics.push("document root is not a mapping".to_string());
        return diagnostics;
    }
    match value.get("openapi").and_then(Value::as_str) {
        Some(version) if version.starts_with('3') => {}
        Some(version) => diagnostics.push(format!("unsupported openapi version {version}")),
        None => diagnostics.push("missing `openapi` version field".to_string()),
    }
    if value.get("info").is_none() {
        diagnostics.push("missing `info` object".to_string());
    }
    if let Some(paths) = value.get("paths") {
        if !paths.is_object() {
            diagnostics.push("`paths` is not a mapping".to_string());
        }
    }
    diagnostics
}

fn base_path(value: &Value) -> Option<String> {
    let server = value
        .get("servers")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()?;
    let path = match url::Url::parse(server) {
        Ok(url) => url.path().to_string(),
        Err(_) => server.to_string(),
    };
    let trimmed = path.trim_end_matches('/');
    (!trimmed.is_empty() && trimmed.starts_with('/')).then(|| trimmed.to_string())
}

/// Base64 SHA-256 of the raw document, shortened for display.
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let encoded = base64::engine::general_purpose::STANDARD.encode(digest);
    encoded.chars().take(16).collect()
}

/// Load and fully resolve a specification from a file path or `bundled:` name.
///
/// # Errors
///
/// - [`EngineError::SpecNotFound`] when the location does not resolve
/// - [`EngineError::SpecParse`] with every parser diagnostic joined by `"; "`
/// - [`EngineError::SpecUnresolvable`] for a `$ref` without a matching component
pub fn load_spec(location: &str) -> EngineResult<ResolvedSpec> {
    let content = read_source(location)?;
    let parse_error = |diagnostics: Vec<String>| EngineError::SpecParse {
        path: location.to_string(),
        diagnostics: diagnostics.join("; "),
    };
    let mut value = parse_document(location, &content).map_err(parse_error)?;
    let diagnostics = structural_diagnostics(&value);
    if !diagnostics.is_empty() {
        return Err(parse_error(diagnostics));
    }

    strip_unknown_verbs(&mut value);
    let spec: OpenApiV3Spec =
        serde_json::from_value(value.clone()).map_err(|e| parse_error(vec![e.to_string()]))?;

    let metadata = SpecMetadata {
        source: location.to_string(),
        title: spec.info.title.clone(),
        version: spec.info.version.clone(),
        size_bytes: content.len(),
        fingerprint: fingerprint(&content),
        base_path: base_path(&value),
    };
    info!(
        source = %location,
        title = %metadata.title,
        version = %metadata.version,
        "loaded OpenAPI spec"
    );

    let schemas = build_schemas(&value)?;
    let operations = build_operations(&value)?;
    Ok(ResolvedSpec {
        metadata,
        operations,
        schemas,
    })
}
