//! Schema to Java type mapping.
//!
//! Every generator asks this module for type names so that a record referenced
//! from a client method, a service method and an endpoint route always carries
//! the name the data type generator emitted it under.

use super::naming::type_case;
use crate::spec::{Operation, PrimitiveKind, Response, Schema, SchemaKind};
use std::collections::BTreeSet;

/// A Java type reference plus the imports it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaType {
    /// Source text of the type, e.g. `List<CardDetails>`.
    pub name: String,
    pub imports: BTreeSet<String>,
    /// Generated record this type refers to, directly or as a list element.
    pub record: Option<String>,
    pub is_list: bool,
}

impl JavaType {
    pub fn simple(name: &str) -> Self {
        JavaType {
            name: name.to_string(),
            imports: BTreeSet::new(),
            record: None,
            is_list: false,
        }
    }

    fn imported(name: &str, import: &str) -> Self {
        let mut ty = JavaType::simple(name);
        ty.imports.insert(import.to_string());
        ty
    }

    fn record(name: String) -> Self {
        JavaType {
            record: Some(name.clone()),
            ..JavaType::simple(&name)
        }
    }

    fn list_of(inner: JavaType) -> Self {
        let mut imports = inner.imports;
        imports.insert("java.util.List".to_string());
        JavaType {
            name: format!("List<{}>", inner.name),
            imports,
            record: inner.record,
            is_list: true,
        }
    }

    pub fn void() -> Self {
        JavaType::simple("Void")
    }

    pub fn is_void(&self) -> bool {
        self.name == "Void"
    }

    /// Whether the type needs `@Valid` to cascade bean validation.
    pub fn cascades_validation(&self) -> bool {
        self.record.is_some()
    }

    /// Argument for `bodyToMono`: a class literal, or a type reference for generics.
    pub fn body_type_argument(&self) -> String {
        if self.name.contains('<') {
            format!("new ParameterizedTypeReference<{}>() {{}}", self.name)
        } else {
            format!("{}.class", self.name)
        }
    }
}

/// Name of the record generated for `schema`: its component name, else `hint`.
pub fn record_name(schema: &Schema, hint: &str) -> String {
    schema
        .name
        .as_deref()
        .map(type_case)
        .unwrap_or_else(|| hint.to_string())
}

/// Map a resolved schema to its Java type.
///
/// `hint` names the record when the schema is an anonymous object or union;
/// array items are named `{hint}Item`.
pub fn java_type(schema: &Schema, hint: &str) -> JavaType {
    match &schema.kind {
        SchemaKind::Primitive { kind, format } => primitive_type(*kind, format.as_deref()),
        SchemaKind::Array { items } => JavaType::list_of(java_type(items, &item_hint(schema, hint))),
        SchemaKind::Object { properties } if properties.is_empty() => {
            JavaType::imported("Map<String, Object>", "java.util.Map")
        }
        SchemaKind::Object { .. } | SchemaKind::Composed { .. } => {
            JavaType::record(record_name(schema, hint))
        }
        SchemaKind::Cycle { target } => JavaType::record(type_case(target)),
        SchemaKind::Any => JavaType::simple("Object"),
    }
}

/// Hint used for the element of an array schema.
pub fn item_hint(array: &Schema, hint: &str) -> String {
    format!("{}Item", record_name(array, hint))
}

fn primitive_type(kind: PrimitiveKind, format: Option<&str>) -> JavaType {
    match (kind, format) {
        (PrimitiveKind::String, Some("date")) => JavaType::imported("LocalDate", "java.time.LocalDate"),
        (PrimitiveKind::String, Some("date-time")) => {
            JavaType::imported("OffsetDateTime", "java.time.OffsetDateTime")
        }
        (PrimitiveKind::String, Some("uuid")) => JavaType::imported("UUID", "java.util.UUID"),
        (PrimitiveKind::String, _) => JavaType::simple("String"),
        (PrimitiveKind::Integer, Some("int64")) => JavaType::simple("Long"),
        (PrimitiveKind::Integer, _) => JavaType::simple("Integer"),
        (PrimitiveKind::Number, Some("float")) => JavaType::simple("Float"),
        (PrimitiveKind::Number, Some("double")) => JavaType::simple("Double"),
        (PrimitiveKind::Number, _) => JavaType::imported("BigDecimal", "java.math.BigDecimal"),
        (PrimitiveKind::Boolean, _) => JavaType::simple("Boolean"),
    }
}

/// Simplified mapping used for path, query and header parameters.
pub fn param_type(schema: &Schema) -> JavaType {
    match &schema.kind {
        SchemaKind::Primitive {
            kind: PrimitiveKind::Integer,
            format,
        } if format.as_deref() == Some("int64") => JavaType::simple("Long"),
        SchemaKind::Primitive {
            kind: PrimitiveKind::Integer,
            ..
        } => JavaType::simple("Integer"),
        SchemaKind::Primitive {
            kind: PrimitiveKind::Number,
            ..
        } => JavaType::simple("Double"),
        SchemaKind::Primitive {
            kind: PrimitiveKind::Boolean,
            ..
        } => JavaType::simple("Boolean"),
        _ => JavaType::simple("String"),
    }
}

/// Class-name stem of an operation (`processPayment` → `ProcessPayment`).
pub fn operation_class(op: &Operation) -> String {
    type_case(&op.id)
}

pub fn request_hint(op: &Operation) -> String {
    op.request_schema()
        .and_then(|s| s.title.as_deref())
        .map(type_case)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{}Request", operation_class(op)))
}

pub fn request_type(op: &Operation) -> Option<JavaType> {
    op.request_schema()
        .map(|schema| java_type(schema, &request_hint(op)))
}

/// Whether a response is named like a success: a 2xx, or the `default`
/// response when the client returns it.
fn reads_as_success(op: &Operation, response: &Response) -> bool {
    response.is_success() || primary_response(op).is_some_and(|p| p.status == response.status)
}

/// Record name hint for one response of an operation.
///
/// The first success response is `{Op}Response` and the first failure
/// response `{Op}ErrorResponse`; later ones carry their status key. A
/// `default` response the client returns counts as a success.
pub fn response_hint(op: &Operation, response: &Response) -> String {
    let class = operation_class(op);
    let success = reads_as_success(op, response);
    let first = op
        .responses
        .iter()
        .find(|r| reads_as_success(op, r) == success)
        .is_some_and(|r| r.status == response.status);
    let stem = if success { "Response" } else { "ErrorResponse" };
    if first {
        format!("{class}{stem}")
    } else {
        format!("{class}{stem}{}", status_suffix(&response.status))
    }
}

fn status_suffix(status: &str) -> String {
    let mut chars = status.chars().filter(char::is_ascii_alphanumeric);
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.collect::<String>(),
        None => String::new(),
    }
}

/// Response a client method returns: `200`, then `201`, then `default`.
pub fn primary_response(op: &Operation) -> Option<&Response> {
    ["200", "201", "default"].iter().find_map(|status| {
        op.responses
            .iter()
            .find(|r| r.status == *status && r.schema.is_some())
    })
}

pub fn response_type(op: &Operation) -> JavaType {
    primary_response(op)
        .and_then(|response| {
            response
                .schema
                .as_ref()
                .map(|schema| java_type(schema, &response_hint(op, response)))
        })
        .unwrap_or_else(JavaType::void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{HttpMethod, Property, RequestBody};

    fn object(props: Vec<(&str, Schema)>) -> Schema {
        Schema::new(SchemaKind::Object {
            properties: props
                .into_iter()
                .map(|(name, schema)| Property {
                    name: name.to_string(),
                    schema,
                    required: false,
                })
                .collect(),
        })
    }

    fn op_with(responses: Vec<Response>, body: Option<Schema>) -> Operation {
        Operation {
            id: "processPayment".into(),
            method: HttpMethod::Post,
            path: "/payments".into(),
            summary: None,
            description: None,
            primary_tag: "Transactions".into(),
            tags: vec!["Transactions".into()],
            parameters: vec![],
            request_body: body.map(|schema| RequestBody {
                content_type: "application/json".into(),
                schema,
                required: true,
            }),
            responses,
            id_synthesized: false,
        }
    }

    fn response(status: &str, schema: Option<Schema>) -> Response {
        Response {
            status: status.into(),
            description: None,
            schema,
        }
    }

    #[test]
    fn test_primitive_table() {
        let cases = [
            (PrimitiveKind::String, None, "String"),
            (PrimitiveKind::String, Some("date"), "LocalDate"),
            (PrimitiveKind::String, Some("date-time"), "OffsetDateTime"),
            (PrimitiveKind::String, Some("uuid"), "UUID"),
            (PrimitiveKind::Integer, None, "Integer"),
            (PrimitiveKind::Integer, Some("int64"), "Long"),
            (PrimitiveKind::Number, None, "BigDecimal"),
            (PrimitiveKind::Number, Some("float"), "Float"),
            (PrimitiveKind::Number, Some("double"), "Double"),
            (PrimitiveKind::Boolean, None, "Boolean"),
        ];
        for (kind, format, expected) in cases {
            assert_eq!(java_type(&Schema::primitive(kind, format), "X").name, expected);
        }
    }

    #[test]
    fn test_imports_follow_type() {
        let ty = java_type(&Schema::primitive(PrimitiveKind::String, Some("date-time")), "X");
        assert!(ty.imports.contains("java.time.OffsetDateTime"));
        let list = java_type(
            &Schema::new(SchemaKind::Array {
                items: Box::new(Schema::primitive(PrimitiveKind::Number, None)),
            }),
            "X",
        );
        assert_eq!(list.name, "List<BigDecimal>");
        assert!(list.imports.contains("java.util.List"));
        assert!(list.imports.contains("java.math.BigDecimal"));
    }

    #[test]
    fn test_records_and_items() {
        let card = object(vec![("number", Schema::primitive(PrimitiveKind::String, None))]);
        assert_eq!(java_type(&card, "PaymentCard").name, "PaymentCard");
        assert_eq!(java_type(&card.clone().with_name("card-details"), "Ignored").name, "CardDetails");

        let lines = Schema::new(SchemaKind::Array {
            items: Box::new(card),
        });
        let ty = java_type(&lines, "OrderLines");
        assert_eq!(ty.name, "List<OrderLinesItem>");
        assert_eq!(ty.record.as_deref(), Some("OrderLinesItem"));
        assert!(ty.cascades_validation());
        assert_eq!(
            ty.body_type_argument(),
            "new ParameterizedTypeReference<List<OrderLinesItem>>() {}"
        );
    }

    #[test]
    fn test_free_form_and_cycle() {
        assert_eq!(java_type(&object(vec![]), "X").name, "Map<String, Object>");
        assert_eq!(java_type(&Schema::any(), "X").name, "Object");
        let cycle = Schema::new(SchemaKind::Cycle {
            target: "node".into(),
        });
        assert_eq!(java_type(&cycle, "X").name, "Node");
    }

    #[test]
    fn test_param_types() {
        assert_eq!(param_type(&Schema::primitive(PrimitiveKind::Integer, Some("int64"))).name, "Long");
        assert_eq!(param_type(&Schema::primitive(PrimitiveKind::Number, None)).name, "Double");
        assert_eq!(param_type(&Schema::primitive(PrimitiveKind::String, Some("uuid"))).name, "String");
    }

    #[test]
    fn test_response_naming() {
        let body = object(vec![("id", Schema::primitive(PrimitiveKind::String, None))]);
        let op = op_with(
            vec![
                response("201", Some(body.clone())),
                response("202", Some(body.clone())),
                response("400", Some(body.clone())),
                response("default", Some(body.clone())),
            ],
            Some(body),
        );
        assert_eq!(response_hint(&op, &op.responses[0]), "ProcessPaymentResponse");
        assert_eq!(response_hint(&op, &op.responses[1]), "ProcessPaymentResponse202");
        assert_eq!(response_hint(&op, &op.responses[2]), "ProcessPaymentErrorResponse");
        assert_eq!(response_hint(&op, &op.responses[3]), "ProcessPaymentErrorResponseDefault");
        assert_eq!(response_type(&op).name, "ProcessPaymentResponse");
        assert_eq!(request_type(&op).map(|t| t.name).as_deref(), Some("ProcessPaymentRequest"));
    }

    #[test]
    fn test_default_only_response_is_named_as_success() {
        let body = object(vec![("id", Schema::primitive(PrimitiveKind::String, None))]);
        let op = op_with(
            vec![response("default", Some(body.clone())), response("400", Some(body))],
            None,
        );
        assert_eq!(response_hint(&op, &op.responses[0]), "ProcessPaymentResponse");
        assert_eq!(response_hint(&op, &op.responses[1]), "ProcessPaymentErrorResponse");
        assert_eq!(response_type(&op).name, "ProcessPaymentResponse");
    }

    #[test]
    fn test_missing_response_is_void() {
        let op = op_with(vec![response("204", None)], None);
        assert!(response_type(&op).is_void());
        assert!(request_type(&op).is_none());
    }

    #[test]
    fn test_titled_request_body() {
        let mut body = object(vec![("id", Schema::primitive(PrimitiveKind::String, None))]);
        body.title = Some("sale request".into());
        let op = op_with(vec![], Some(body));
        assert_eq!(request_hint(&op), "SaleRequest");
    }
}
