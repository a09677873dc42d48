use super::naming::{escape_string_literal, member_case, sanitize_comment};
use super::schema::{param_type, request_type, response_type, JavaType};
use crate::spec::{HttpMethod, Operation, ParameterLocation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Query parameters are bound one by one up to this many, then as a map.
pub const MAX_INDIVIDUAL_QUERY_PARAMS: usize = 3;

/// Headers the transport sets itself; never bound as method parameters.
pub const STANDARD_HEADERS: &[&str] = &[
    "content-type",
    "accept",
    "authorization",
    "user-agent",
    "host",
    "connection",
];

#[allow(clippy::expect_used)]
static PATH_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("valid placeholder pattern"));

/// A parameter as it appears on the wire and in the generated signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    /// Name on the wire (path placeholder, query key, header name).
    pub wire: String,
    /// Java identifier.
    pub member: String,
    pub java_type: String,
    pub required: bool,
}

/// Everything the client, service and endpoint need to expose one operation.
///
/// Built once per operation so the three layers agree on parameter order,
/// names and types.
#[derive(Debug, Clone)]
pub struct OperationBinding {
    pub operation_id: String,
    pub method_name: String,
    pub verb: HttpMethod,
    pub path: String,
    pub doc: Vec<String>,
    pub path_params: Vec<BoundParam>,
    /// Individually bound query parameters; empty when [`Self::query_map`] is set.
    pub query_params: Vec<BoundParam>,
    pub query_map: bool,
    pub headers: Vec<BoundParam>,
    pub request: Option<JavaType>,
    pub response: JavaType,
}

/// Path placeholders in order of appearance.
pub fn path_placeholders(path: &str) -> Vec<String> {
    PATH_PLACEHOLDER
        .captures_iter(path)
        .map(|c| c[1].to_string())
        .collect()
}

impl OperationBinding {
    pub fn new(op: &Operation) -> Self {
        let bind = |wire: &str, ty: JavaType, required: bool| BoundParam {
            wire: wire.to_string(),
            member: member_case(wire),
            java_type: ty.name,
            required,
        };

        let path_params = path_placeholders(&op.path)
            .iter()
            .map(|wire| {
                let declared = op
                    .parameters_in(ParameterLocation::Path)
                    .find(|p| &p.name == wire);
                let ty = declared.map_or_else(|| JavaType::simple("String"), |p| param_type(&p.schema));
                bind(wire, ty, true)
            })
            .collect();

        let query: Vec<BoundParam> = op
            .parameters_in(ParameterLocation::Query)
            .map(|p| bind(&p.name, param_type(&p.schema), p.required))
            .collect();
        let query_map = query.len() > MAX_INDIVIDUAL_QUERY_PARAMS;

        let headers = op
            .parameters_in(ParameterLocation::Header)
            .filter(|p| !STANDARD_HEADERS.contains(&p.name.to_ascii_lowercase().as_str()))
            .map(|p| bind(&p.name, param_type(&p.schema), p.required))
            .collect();

        let mut doc: Vec<String> = op
            .summary
            .iter()
            .chain(op.description.iter())
            .flat_map(|text| {
                sanitize_comment(text)
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        doc.dedup();
        if doc.is_empty() {
            doc.push(format!("{} {}", op.method, op.path));
        }

        OperationBinding {
            operation_id: escape_string_literal(&op.id),
            method_name: member_case(&op.id),
            verb: op.method,
            path: escape_string_literal(&op.path),
            doc,
            path_params,
            query_params: if query_map { Vec::new() } else { query },
            query_map,
            headers,
            request: request_type(op),
            response: response_type(op),
        }
    }

    /// Client and service signature: path, query, headers, body.
    pub fn signature(&self) -> String {
        let mut params: Vec<String> = self
            .path_params
            .iter()
            .chain(&self.query_params)
            .map(|p| format!("{} {}", p.java_type, p.member))
            .collect();
        if self.query_map {
            params.push("Map<String, Object> queryParams".to_string());
        }
        if !self.headers.is_empty() {
            params.push("HttpHeaders headers".to_string());
        }
        if let Some(request) = &self.request {
            params.push(format!("{} request", request.name));
        }
        params.join(", ")
    }

    /// Arguments forwarding [`Self::signature`] to the next layer.
    pub fn arguments(&self) -> String {
        let mut args: Vec<String> = self
            .path_params
            .iter()
            .chain(&self.query_params)
            .map(|p| p.member.clone())
            .collect();
        if self.query_map {
            args.push("queryParams".to_string());
        }
        if !self.headers.is_empty() {
            args.push("headers".to_string());
        }
        if self.request.is_some() {
            args.push("request".to_string());
        }
        args.join(", ")
    }

    pub fn has_body(&self) -> bool {
        self.request.is_some()
    }

    /// Imports the signature's types need.
    pub fn imports(&self) -> BTreeSet<String> {
        let mut imports = self.response.imports.clone();
        if let Some(request) = &self.request {
            imports.extend(request.imports.iter().cloned());
        }
        if self.query_map {
            imports.insert("java.util.Map".to_string());
        }
        if !self.headers.is_empty() {
            imports.insert("org.springframework.http.HttpHeaders".to_string());
        }
        imports
    }

    /// Whether any signature type is a generated record.
    pub fn uses_records(&self) -> bool {
        self.response.record.is_some() || self.request.as_ref().is_some_and(|r| r.record.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Parameter, PrimitiveKind, Schema};

    fn param(name: &str, location: ParameterLocation, kind: PrimitiveKind) -> Parameter {
        Parameter {
            name: name.into(),
            location,
            schema: Schema::primitive(kind, None),
            required: false,
            description: None,
        }
    }

    fn op(path: &str, parameters: Vec<Parameter>) -> Operation {
        Operation {
            id: "listRefunds".into(),
            method: HttpMethod::Get,
            path: path.into(),
            summary: Some("List refunds".into()),
            description: None,
            primary_tag: "Refunds".into(),
            tags: vec!["Refunds".into()],
            parameters,
            request_body: None,
            responses: vec![],
            id_synthesized: false,
        }
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(path_placeholders("/a/{b}/c/{d-e}"), vec!["b", "d-e"]);
    }

    #[test]
    fn test_signature_individual_query() {
        let binding = OperationBinding::new(&op(
            "/payments/{paymentId}/refunds",
            vec![
                param("paymentId", ParameterLocation::Path, PrimitiveKind::Integer),
                param("limit", ParameterLocation::Query, PrimitiveKind::Integer),
                param("X-Request-Id", ParameterLocation::Header, PrimitiveKind::String),
                param("Authorization", ParameterLocation::Header, PrimitiveKind::String),
            ],
        ));
        assert_eq!(
            binding.signature(),
            "Integer paymentId, Integer limit, HttpHeaders headers"
        );
        assert_eq!(binding.arguments(), "paymentId, limit, headers");
        assert_eq!(binding.headers.len(), 1);
        assert!(binding.response.is_void());
    }

    #[test]
    fn test_query_map_over_threshold() {
        let params = ["a", "b", "c", "d"]
            .iter()
            .map(|n| param(n, ParameterLocation::Query, PrimitiveKind::String))
            .collect();
        let binding = OperationBinding::new(&op("/refunds", params));
        assert!(binding.query_map);
        assert!(binding.query_params.is_empty());
        assert_eq!(binding.signature(), "Map<String, Object> queryParams");
        assert!(binding.imports().contains("java.util.Map"));
    }

    #[test]
    fn test_undeclared_placeholder_is_string() {
        let binding = OperationBinding::new(&op("/refunds/{refund-id}", vec![]));
        assert_eq!(binding.signature(), "String refundId");
        assert_eq!(binding.doc, vec!["List refunds"]);
    }
}
