use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP verbs in the order operations are read from a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Catalog order used when walking a path item.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    /// Lower-case key as it appears in a path item.
    pub fn key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    pub fn as_upper(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    AnyOf,
    OneOf,
}

/// Validation facets carried through to generated annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
    pub enum_values: Vec<String>,
}

/// Shape of a resolved schema node.
///
/// References never survive resolution: a `$ref` is replaced by its target and
/// the component name is kept on [`Schema::name`]. A reference back to a
/// schema that is still being resolved becomes [`SchemaKind::Cycle`].
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
    },
    Array {
        items: Box<Schema>,
    },
    Object {
        properties: Vec<Property>,
    },
    Composed {
        composition: Composition,
        members: Vec<Schema>,
    },
    /// Back-edge to an enclosing component on the current resolution path.
    Cycle {
        target: String,
    },
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Component name when this node was reached through a `$ref`.
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    /// Discriminator property name of a polymorphic schema.
    pub discriminator: Option<String>,
    pub constraints: Constraints,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Schema {
            kind,
            name: None,
            title: None,
            description: None,
            nullable: false,
            discriminator: None,
            constraints: Constraints::default(),
        }
    }

    pub fn primitive(kind: PrimitiveKind, format: Option<&str>) -> Self {
        Schema::new(SchemaKind::Primitive {
            kind,
            format: format.map(str::to_string),
        })
    }

    pub fn any() -> Self {
        Schema::new(SchemaKind::Any)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Object with at least one declared property.
    pub fn is_record(&self) -> bool {
        matches!(&self.kind, SchemaKind::Object { properties } if !properties.is_empty())
    }

    pub fn properties(&self) -> &[Property] {
        match &self.kind {
            SchemaKind::Object { properties } => properties,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub schema: Schema,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub content_type: String,
    pub schema: Schema,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status key as written in the document (`200`, `4XX`, `default`).
    pub status: String,
    pub description: Option<String>,
    pub schema: Option<Schema>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status.starts_with('2')
    }
}

/// One addressable operation of a resolved specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Unique within a catalog; synthesized from verb and path when undeclared.
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub primary_tag: String,
    /// Distinct tags in declaration order, never empty.
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<Response>,
    pub id_synthesized: bool,
}

impl Operation {
    /// Summary when present, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    pub fn request_schema(&self) -> Option<&Schema> {
        self.request_body.as_ref().map(|b| &b.schema)
    }

    /// Response schema chosen by status preference `200`, `201`, then `default`.
    pub fn response_schema(&self) -> Option<&Schema> {
        ["200", "201", "default"].iter().find_map(|status| {
            self.responses
                .iter()
                .find(|r| r.status == *status)
                .and_then(|r| r.schema.as_ref())
        })
    }
}

/// Descriptive data about a loaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMetadata {
    pub source: String,
    pub title: String,
    pub version: String,
    pub size_bytes: usize,
    /// Base64 SHA-256 prefix of the raw document.
    pub fingerprint: String,
    /// Path component of the first server URL, if any.
    pub base_path: Option<String>,
}

/// Fully resolved specification: metadata, operations and named schemas.
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    pub metadata: SpecMetadata,
    pub operations: Vec<Operation>,
    pub schemas: BTreeMap<String, Schema>,
}
