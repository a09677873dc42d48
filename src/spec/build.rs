use super::types::{
    Composition, Constraints, HttpMethod, Operation, Parameter, ParameterLocation,
    PrimitiveKind, Property, RequestBody, Response, Schema, SchemaKind,
};
use crate::error::{EngineError, EngineResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

const JSON_CONTENT: &str = "application/json";

/// Split a local component reference into `(section, name)`.
///
/// Only `#/components/<section>/<name>` is accepted; JSON-pointer escapes in
/// the name are decoded.
pub fn split_component_ref(reference: &str) -> Option<(&str, String)> {
    let rest = reference.strip_prefix("#/components/")?;
    let (section, name) = rest.split_once('/')?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some((section, name.replace("~1", "/").replace("~0", "~")))
}

/// Resolves `$ref`s and composition against one document.
///
/// `stack` holds the component names currently being expanded; meeting one
/// of them again yields a [`SchemaKind::Cycle`] instead of recursing.
pub struct Resolver<'a> {
    root: &'a Value,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Resolver {
            root,
            stack: Vec::new(),
        }
    }

    fn component(&self, reference: &str, expected: &str) -> EngineResult<(&'a Value, String)> {
        let unresolvable = || EngineError::SpecUnresolvable {
            reference: reference.to_string(),
        };
        let (section, name) = split_component_ref(reference).ok_or_else(unresolvable)?;
        if section != expected {
            return Err(unresolvable());
        }
        let target = self
            .root
            .get("components")
            .and_then(|c| c.get(section))
            .and_then(|s| s.get(name.as_str()))
            .ok_or_else(unresolvable)?;
        Ok((target, name))
    }

    /// Follow `$ref` chains on non-schema objects (parameters, bodies, responses).
    fn deref(&self, value: &'a Value, section: &str) -> EngineResult<&'a Value> {
        let mut current = value;
        let mut seen = HashSet::new();
        while let Some(reference) = current.get("$ref").and_then(Value::as_str) {
            if !seen.insert(reference.to_string()) {
                return Err(EngineError::SpecUnresolvable {
                    reference: reference.to_string(),
                });
            }
            current = self.component(reference, section)?.0;
        }
        Ok(current)
    }

    /// Resolve a schema value into a reference-free [`Schema`].
    pub fn resolve_schema(&mut self, value: &Value) -> EngineResult<Schema> {
        if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
            return self.resolve_schema_ref(reference);
        }
        let Some(obj) = value.as_object() else {
            // `true` / `{}`-style schemas accept anything
            return Ok(Schema::any());
        };

        if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
            return self.merge_all_of(obj, members);
        }
        for (key, composition) in [("oneOf", Composition::OneOf), ("anyOf", Composition::AnyOf)] {
            if let Some(members) = obj.get(key).and_then(Value::as_array) {
                return self.compose(obj, composition, members);
            }
        }

        let (type_name, nullable_by_type) = schema_type(obj);
        let kind = match type_name.as_deref() {
            Some("object") => SchemaKind::Object {
                properties: self.properties(obj)?,
            },
            None if obj.contains_key("properties") => SchemaKind::Object {
                properties: self.properties(obj)?,
            },
            Some("array") => {
                let items = match obj.get("items") {
                    Some(items) => self.resolve_schema(items)?,
                    None => Schema::any(),
                };
                SchemaKind::Array {
                    items: Box::new(items),
                }
            }
            Some("string") => primitive(PrimitiveKind::String, obj),
            None if obj.contains_key("enum") => primitive(PrimitiveKind::String, obj),
            Some("integer") => primitive(PrimitiveKind::Integer, obj),
            Some("number") => primitive(PrimitiveKind::Number, obj),
            Some("boolean") => primitive(PrimitiveKind::Boolean, obj),
            _ => SchemaKind::Any,
        };
        let mut schema = Schema::new(kind);
        annotate(&mut schema, obj);
        schema.nullable |= nullable_by_type;
        Ok(schema)
    }

    fn resolve_schema_ref(&mut self, reference: &str) -> EngineResult<Schema> {
        let (target, name) = self.component(reference, "schemas")?;
        if self.stack.contains(&name) {
            debug!(schema = %name, "cyclic reference, emitting back-edge");
            return Ok(Schema::new(SchemaKind::Cycle {
                target: name.clone(),
            })
            .with_name(name));
        }
        self.stack.push(name.clone());
        let resolved = self.resolve_schema(target);
        self.stack.pop();
        let mut schema = resolved?;
        // the outermost reference names the node
        schema.name = Some(name);
        Ok(schema)
    }

    fn properties(&mut self, obj: &Map<String, Value>) -> EngineResult<Vec<Property>> {
        let required: HashSet<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let mut properties = Vec::new();
        if let Some(props) = obj.get("properties").and_then(Value::as_object) {
            for (name, value) in props {
                properties.push(Property {
                    name: name.clone(),
                    schema: self.resolve_schema(value)?,
                    required: required.contains(name.as_str()),
                });
            }
        }
        Ok(properties)
    }

    /// Structural merge of `allOf` members into one object.
    fn merge_all_of(&mut self, obj: &Map<String, Value>, members: &[Value]) -> EngineResult<Schema> {
        let mut resolved = Vec::with_capacity(members.len());
        for member in members {
            resolved.push(self.resolve_schema(member)?);
        }
        let own = self.properties(obj)?;
        if own.is_empty() && resolved.len() == 1 && !resolved[0].is_record() {
            // single-member wrapper used to attach docs to a reference
            let mut single = resolved.remove(0);
            annotate(&mut single, obj);
            return Ok(single);
        }

        let mut merged: Vec<Property> = Vec::new();
        let mut discriminator = None;
        for member in resolved.into_iter() {
            discriminator = discriminator.or(member.discriminator.clone());
            match member.kind {
                SchemaKind::Object { properties } => {
                    for prop in properties {
                        merge_property(&mut merged, prop);
                    }
                }
                other => debug!(kind = ?other, "allOf member is not an object, skipped"),
            }
        }
        for prop in own {
            merge_property(&mut merged, prop);
        }
        let mut schema = Schema::new(SchemaKind::Object { properties: merged });
        annotate(&mut schema, obj);
        schema.discriminator = schema.discriminator.or(discriminator);
        Ok(schema)
    }

    fn compose(
        &mut self,
        obj: &Map<String, Value>,
        composition: Composition,
        members: &[Value],
    ) -> EngineResult<Schema> {
        let mut resolved = Vec::new();
        let mut nullable = false;
        for member in members {
            if member.get("type").and_then(Value::as_str) == Some("null") {
                nullable = true;
                continue;
            }
            resolved.push(self.resolve_schema(member)?);
        }
        let mut schema = if resolved.len() == 1 {
            resolved.remove(0)
        } else {
            Schema::new(SchemaKind::Composed {
                composition,
                members: resolved,
            })
        };
        annotate(&mut schema, obj);
        schema.nullable |= nullable;
        Ok(schema)
    }

    fn parameter(&mut self, value: &'a Value) -> EngineResult<Option<Parameter>> {
        let value = self.deref(value, "parameters")?;
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let location = match value.get("in").and_then(Value::as_str) {
            Some("path") => ParameterLocation::Path,
            Some("query") => ParameterLocation::Query,
            Some("header") => ParameterLocation::Header,
            other => {
                debug!(parameter = %name, location = ?other, "parameter location not bound, skipped");
                return Ok(None);
            }
        };
        let schema = match value.get("schema") {
            Some(schema) => self.resolve_schema(schema)?,
            None => Schema::primitive(PrimitiveKind::String, None),
        };
        Ok(Some(Parameter {
            required: location == ParameterLocation::Path
                || value.get("required").and_then(Value::as_bool).unwrap_or(false),
            name,
            location,
            schema,
            description: string_field(value, "description"),
        }))
    }

    fn request_body(&mut self, value: &'a Value) -> EngineResult<Option<RequestBody>> {
        let value = self.deref(value, "requestBodies")?;
        let Some((content_type, media)) = preferred_media(value) else {
            return Ok(None);
        };
        let Some(schema) = media.get("schema") else {
            return Ok(None);
        };
        Ok(Some(RequestBody {
            content_type,
            schema: self.resolve_schema(schema)?,
            required: value.get("required").and_then(Value::as_bool).unwrap_or(false),
        }))
    }

    fn response(&mut self, status: &str, value: &'a Value) -> EngineResult<Response> {
        let value = self.deref(value, "responses")?;
        let schema = match preferred_media(value).and_then(|(_, media)| media.get("schema")) {
            Some(schema) => Some(self.resolve_schema(schema)?),
            None => None,
        };
        Ok(Response {
            status: status.to_string(),
            description: string_field(value, "description"),
            schema,
        })
    }
}

fn merge_property(merged: &mut Vec<Property>, prop: Property) {
    match merged.iter_mut().find(|p| p.name == prop.name) {
        Some(existing) => {
            existing.required |= prop.required;
            existing.schema = prop.schema;
        }
        None => merged.push(prop),
    }
}

/// Declared type, accepting the 3.1 `type: [T, "null"]` form.
fn schema_type(obj: &Map<String, Value>) -> (Option<String>, bool) {
    match obj.get("type") {
        Some(Value::String(t)) => (Some(t.clone()), false),
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let first = names.into_iter().find(|t| *t != "null").map(str::to_string);
            (first, nullable)
        }
        _ => (None, false),
    }
}

fn primitive(kind: PrimitiveKind, obj: &Map<String, Value>) -> SchemaKind {
    SchemaKind::Primitive {
        kind,
        format: obj.get("format").and_then(Value::as_str).map(str::to_string),
    }
}

fn annotate(schema: &mut Schema, obj: &Map<String, Value>) {
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    schema.title = text("title").or(schema.title.take());
    schema.description = text("description").or(schema.description.take());
    schema.nullable |= obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    if let Some(property) = obj
        .get("discriminator")
        .and_then(|d| d.get("propertyName"))
        .and_then(Value::as_str)
    {
        schema.discriminator = Some(property.to_string());
    }
    let constraints = Constraints {
        min_length: obj.get("minLength").and_then(Value::as_u64),
        max_length: obj.get("maxLength").and_then(Value::as_u64),
        minimum: obj.get("minimum").and_then(Value::as_f64),
        maximum: obj.get("maximum").and_then(Value::as_f64),
        pattern: text("pattern"),
        enum_values: obj
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };
    if constraints != Constraints::default() {
        schema.constraints = constraints;
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// JSON media type when declared, otherwise the first one.
fn preferred_media(value: &Value) -> Option<(String, &Value)> {
    let content = value.get("content")?.as_object()?;
    content
        .get(JSON_CONTENT)
        .map(|media| (JSON_CONTENT.to_string(), media))
        .or_else(|| content.iter().next().map(|(k, v)| (k.clone(), v)))
}

fn tags_of(op: &Value) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    if let Some(list) = op.get("tags").and_then(Value::as_array) {
        for tag in list.iter().filter_map(Value::as_str) {
            if !tag.trim().is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
    }
    if tags.is_empty() {
        tags.push("default".to_string());
    }
    tags
}

/// Resolve every component schema, keyed by component name.
pub fn build_schemas(root: &Value) -> EngineResult<BTreeMap<String, Schema>> {
    let mut schemas = BTreeMap::new();
    let Some(components) = root
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
    else {
        return Ok(schemas);
    };
    for name in components.keys() {
        let reference = format!("#/components/schemas/{}", name.replace('~', "~0").replace('/', "~1"));
        let schema = Resolver::new(root).resolve_schema_ref(&reference)?;
        schemas.insert(name.clone(), schema);
    }
    Ok(schemas)
}

/// Build resolved operations in document order.
///
/// Paths are walked as declared and verbs in [`HttpMethod::ALL`] order.
/// Undeclared ids are left empty for the catalog to synthesize.
pub fn build_operations(root: &Value) -> EngineResult<Vec<Operation>> {
    let mut operations = Vec::new();
    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        return Ok(operations);
    };
    let mut resolver = Resolver::new(root);
    for (path, item) in paths {
        let shared: &[Value] = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for method in HttpMethod::ALL {
            let Some(op) = item.get(method.key()) else {
                continue;
            };
            let mut parameters: Vec<Parameter> = Vec::new();
            let own = op.get("parameters").and_then(Value::as_array);
            for raw in shared.iter().chain(own.into_iter().flatten()) {
                if let Some(param) = resolver.parameter(raw)? {
                    // operation-level declarations override path-level ones
                    parameters.retain(|p| !(p.name == param.name && p.location == param.location));
                    parameters.push(param);
                }
            }
            let request_body = match op.get("requestBody") {
                Some(body) => resolver.request_body(body)?,
                None => None,
            };
            let mut responses = Vec::new();
            if let Some(map) = op.get("responses").and_then(Value::as_object) {
                for (status, response) in map {
                    responses.push(resolver.response(status, response)?);
                }
            }
            let tags = tags_of(op);
            operations.push(Operation {
                id: string_field(op, "operationId")
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_default(),
                method,
                path: path.clone(),
                summary: string_field(op, "summary"),
                description: string_field(op, "description"),
                primary_tag: tags[0].clone(),
                tags,
                parameters,
                request_body,
                responses,
                id_synthesized: false,
            });
        }
    }
    Ok(operations)
}
