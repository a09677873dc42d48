use super::artifact::{ArtifactGenerator, GenerationContext};
use super::mapping_rules::{
    FieldRule, REQUEST_RULES, RESPONSE_RULES, STATUS_TABLE, UNMAPPED_RESULT, UNMAPPED_STATUS,
};
use super::naming::escape_string_literal;
use super::schema::operation_class;
use super::templates::{FieldMapperTemplate, MappingLineView, StatusPairView};
use super::writer::WrittenFile;
use crate::error::EngineResult;
use crate::layout::Category;
use crate::migrate::find_legacy_operation;
use crate::spec::Operation;
use askama::Template;

const MAPPER_IMPORTS: &[&str] = &[
    "java.math.BigDecimal",
    "java.time.OffsetDateTime",
    "java.time.format.DateTimeFormatter",
    "java.util.LinkedHashMap",
    "java.util.Map",
];

/// `{OpClass}Mapper`
pub fn mapper_class(op: &Operation) -> String {
    format!("{}Mapper", operation_class(op))
}

/// Emits the legacy/target field mapper of every operation (migrations only).
#[derive(Debug, Default)]
pub struct FieldMapperGenerator;

impl FieldMapperGenerator {
    pub fn new() -> Self {
        FieldMapperGenerator
    }
}

fn lines(rules: &[FieldRule], var: &str) -> Vec<MappingLineView> {
    rules
        .iter()
        .map(|rule| MappingLineView {
            target: rule.target.to_string(),
            expression: rule.transform.java_expression(var, rule.source),
        })
        .collect()
}

pub fn mapper_template(ctx: &GenerationContext<'_>, op: &Operation) -> FieldMapperTemplate {
    let legacy_operation = ctx
        .legacy
        .and_then(|legacy| find_legacy_operation(legacy, op))
        .map(|legacy| escape_string_literal(&legacy.id))
        .unwrap_or_default();

    let pairs = |flip: bool| -> Vec<StatusPairView> {
        STATUS_TABLE
            .iter()
            .map(|&(status, result)| {
                let (from, to) = if flip { (result, status) } else { (status, result) };
                StatusPairView {
                    from: from.to_string(),
                    to: to.to_string(),
                }
            })
            .collect()
    };

    FieldMapperTemplate {
        package: ctx.layout.tag_package(Category::Mapper, &op.primary_tag),
        imports: MAPPER_IMPORTS.iter().map(|s| s.to_string()).collect(),
        class_name: mapper_class(op),
        operation_id: escape_string_literal(&op.id),
        legacy_operation,
        request_lines: lines(REQUEST_RULES, "legacy"),
        response_lines: lines(RESPONSE_RULES, "target"),
        status_to_result: pairs(false),
        result_to_status: pairs(true),
        unmapped_result: UNMAPPED_RESULT.to_string(),
        unmapped_status: UNMAPPED_STATUS.to_string(),
    }
}

impl ArtifactGenerator for FieldMapperGenerator {
    fn name(&self) -> &'static str {
        "mapper"
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>> {
        let template = mapper_template(ctx, op);
        let file = ctx
            .writer
            .write_source(&template.package, &template.class_name, &template.render()?)?;
        Ok(vec![file])
    }
}
