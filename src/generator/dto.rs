use super::artifact::{ArtifactGenerator, GenerationContext};
use super::naming::{escape_string_literal, member_case, sanitize_comment, type_case};
use super::schema::{item_hint, java_type, record_name, request_hint, response_hint};
use super::templates::{DataTypeTemplate, FieldView};
use super::writer::WrittenFile;
use crate::error::EngineResult;
use crate::layout::Category;
use crate::spec::{Composition, Operation, PrimitiveKind, Schema, SchemaKind};
use askama::Template;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

const LOMBOK_ANNOTATIONS: &[&str] = &[
    "@Data",
    "@Builder",
    "@NoArgsConstructor",
    "@AllArgsConstructor",
    "@JsonInclude(JsonInclude.Include.NON_NULL)",
];

const RECORD_IMPORTS: &[&str] = &[
    "com.fasterxml.jackson.annotation.JsonInclude",
    "com.fasterxml.jackson.annotation.JsonProperty",
    "lombok.AllArgsConstructor",
    "lombok.Builder",
    "lombok.Data",
    "lombok.NoArgsConstructor",
];

/// Emits one record per object or union schema reachable from an operation.
///
/// Records land in the primary tag's data type package. A record is emitted at
/// most once per package per run, so a component shared by several operations
/// of a tag is written once.
#[derive(Debug, Default)]
pub struct DataTypeGenerator {
    emitted: HashSet<String>,
}

impl DataTypeGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records reachable from `op`, named, in discovery order.
pub fn collect_records<'s>(op: &'s Operation) -> Vec<(String, &'s Schema)> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    if let Some(schema) = op.request_schema() {
        collect(schema, &request_hint(op), &mut found, &mut seen);
    }
    for response in &op.responses {
        if let Some(schema) = &response.schema {
            collect(schema, &response_hint(op, response), &mut found, &mut seen);
        }
    }
    for param in &op.parameters {
        collect(&param.schema, &type_case(&param.name), &mut found, &mut seen);
    }
    found
}

fn collect<'s>(
    schema: &'s Schema,
    hint: &str,
    found: &mut Vec<(String, &'s Schema)>,
    seen: &mut HashSet<String>,
) {
    match &schema.kind {
        SchemaKind::Object { properties } if !properties.is_empty() => {
            let name = record_name(schema, hint);
            if !seen.insert(name.clone()) {
                return;
            }
            found.push((name.clone(), schema));
            for prop in properties {
                collect(&prop.schema, &format!("{name}{}", type_case(&prop.name)), found, seen);
            }
        }
        SchemaKind::Composed { members, .. } => {
            let name = record_name(schema, hint);
            if !seen.insert(name.clone()) {
                return;
            }
            found.push((name.clone(), schema));
            for (i, member) in members.iter().enumerate() {
                collect(member, &option_hint(&name, i), found, seen);
            }
        }
        SchemaKind::Array { items } => collect(items, &item_hint(schema, hint), found, seen),
        _ => {}
    }
}

fn option_hint(union: &str, index: usize) -> String {
    format!("{union}Option{}", index + 1)
}

/// Bean validation and Jackson annotations for one field.
fn field_annotations(
    wire: &str,
    schema: &Schema,
    required: bool,
    cascades: bool,
    imports: &mut BTreeSet<String>,
) -> Vec<String> {
    let mut annotations = vec![format!("@JsonProperty(\"{}\")", escape_string_literal(wire))];
    let mut use_constraint = |name: &str| {
        imports.insert(format!("jakarta.validation.constraints.{name}"));
    };
    if required {
        use_constraint("NotNull");
        annotations.push("@NotNull".to_string());
    }

    let c = &schema.constraints;
    if c.min_length.is_some() || c.max_length.is_some() {
        use_constraint("Size");
        let mut args = Vec::new();
        if let Some(min) = c.min_length {
            args.push(format!("min = {min}"));
        }
        if let Some(max) = c.max_length {
            args.push(format!("max = {max}"));
        }
        annotations.push(format!("@Size({})", args.join(", ")));
    }
    if let Some(pattern) = &c.pattern {
        use_constraint("Pattern");
        annotations.push(format!("@Pattern(regexp = \"{}\")", escape_string_literal(pattern)));
    }
    if let SchemaKind::Primitive { kind, format } = &schema.kind {
        if format.as_deref() == Some("email") {
            use_constraint("Email");
            annotations.push("@Email".to_string());
        }
        let integral = *kind == PrimitiveKind::Integer;
        for (bound, value) in [("Min", c.minimum), ("Max", c.maximum)] {
            let Some(value) = value else { continue };
            if integral {
                use_constraint(bound);
                annotations.push(format!("@{bound}({})", value.trunc() as i64));
            } else {
                use_constraint(&format!("Decimal{bound}"));
                annotations.push(format!("@Decimal{bound}(\"{value}\")"));
            }
        }
    }
    if cascades {
        imports.insert("jakarta.validation.Valid".to_string());
        annotations.push("@Valid".to_string());
    }
    annotations
}

fn field_doc(schema: &Schema) -> String {
    let mut doc = schema
        .description
        .as_deref()
        .map(sanitize_comment)
        .unwrap_or_default()
        .replace('\n', " ");
    if !schema.constraints.enum_values.is_empty() {
        if !doc.is_empty() {
            doc.push(' ');
        }
        doc.push_str(&format!(
            "Allowed values: {}.",
            sanitize_comment(&schema.constraints.enum_values.join(", "))
        ));
    }
    doc
}

/// Build the template data for one record.
pub fn record_template(package: &str, name: &str, schema: &Schema) -> DataTypeTemplate {
    let mut imports: BTreeSet<String> = RECORD_IMPORTS.iter().map(|s| s.to_string()).collect();
    let mut fields = Vec::new();

    match &schema.kind {
        SchemaKind::Composed { members, .. } => {
            for (i, member) in members.iter().enumerate() {
                let ty = java_type(member, &option_hint(name, i));
                imports.extend(ty.imports.iter().cloned());
                let wire = format!("option{}", i + 1);
                fields.push(FieldView {
                    doc: field_doc(member),
                    annotations: field_annotations(&wire, member, false, ty.cascades_validation(), &mut imports),
                    java_type: ty.name,
                    name: wire,
                });
            }
        }
        _ => {
            for prop in schema.properties() {
                let ty = java_type(&prop.schema, &format!("{name}{}", type_case(&prop.name)));
                imports.extend(ty.imports.iter().cloned());
                fields.push(FieldView {
                    doc: field_doc(&prop.schema),
                    annotations: field_annotations(
                        &prop.name,
                        &prop.schema,
                        prop.required,
                        ty.cascades_validation(),
                        &mut imports,
                    ),
                    java_type: ty.name,
                    name: member_case(&prop.name),
                });
            }
        }
    }

    let mut class_annotations: Vec<String> = LOMBOK_ANNOTATIONS.iter().map(|s| s.to_string()).collect();
    if let Some(property) = &schema.discriminator {
        imports.insert("com.fasterxml.jackson.annotation.JsonTypeInfo".to_string());
        class_annotations.push(format!(
            "@JsonTypeInfo(use = JsonTypeInfo.Id.NAME, property = \"{}\")",
            escape_string_literal(property)
        ));
    }

    let mut doc: Vec<String> = schema
        .description
        .as_deref()
        .or(schema.title.as_deref())
        .map(|text| sanitize_comment(text).lines().map(str::to_string).collect())
        .unwrap_or_default();
    if let SchemaKind::Composed { composition, members } = &schema.kind {
        let rule = match composition {
            Composition::OneOf => "Exactly one",
            Composition::AnyOf => "At least one",
        };
        doc.push(format!("{rule} of the {} option fields is set.", members.len()));
    }

    DataTypeTemplate {
        package: package.to_string(),
        imports: imports.into_iter().collect(),
        doc,
        class_annotations,
        class_name: name.to_string(),
        fields,
    }
}

impl ArtifactGenerator for DataTypeGenerator {
    fn name(&self) -> &'static str {
        "dto"
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>> {
        let package = ctx.layout.tag_package(Category::DataTypes, &op.primary_tag);
        let mut written = Vec::new();
        for (name, schema) in collect_records(op) {
            let key = format!("{package}.{name}");
            if self.emitted.contains(&key) {
                debug!(record = %key, "record already emitted");
                continue;
            }
            let rendered = record_template(&package, &name, schema).render()?;
            written.push(ctx.writer.write_source(&package, &name, &rendered)?);
            self.emitted.insert(key);
        }
        Ok(written)
    }
}
