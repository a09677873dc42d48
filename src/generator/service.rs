use super::artifact::{ArtifactGenerator, GenerationContext};
use super::binding::OperationBinding;
use super::client::client_class;
use super::naming::type_case;
use super::templates::{ServiceMethodView, ServiceTemplate};
use super::writer::WrittenFile;
use crate::error::EngineResult;
use crate::layout::Category;
use crate::spec::Operation;
use askama::Template;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

const SERVICE_IMPORTS: &[&str] = &[
    "jakarta.validation.ConstraintViolation",
    "jakarta.validation.ValidationException",
    "jakarta.validation.Validator",
    "java.util.NoSuchElementException",
    "java.util.Set",
    "java.util.stream.Collectors",
    "lombok.RequiredArgsConstructor",
    "lombok.extern.slf4j.Slf4j",
    "org.springframework.stereotype.Service",
    "org.springframework.web.reactive.function.client.WebClientResponseException",
    "reactor.core.publisher.Mono",
];

/// `{Tag}Service`
pub fn service_class(tag: &str) -> String {
    format!("{}Service", type_case(tag))
}

/// Emits one validating, error-mapping service per tag.
#[derive(Debug, Default)]
pub struct ServiceGenerator {
    emitted: HashSet<String>,
}

impl ServiceGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn service_template(ctx: &GenerationContext<'_>, tag: &str) -> ServiceTemplate {
    let bindings: Vec<OperationBinding> = ctx
        .tag_operations(tag)
        .into_iter()
        .map(OperationBinding::new)
        .collect();

    let mut imports: BTreeSet<String> = SERVICE_IMPORTS.iter().map(|s| s.to_string()).collect();
    imports.insert(format!(
        "{}.{}",
        ctx.layout.tag_package(Category::Client, tag),
        client_class(tag)
    ));
    for binding in &bindings {
        imports.extend(binding.imports());
    }
    if bindings.iter().any(OperationBinding::uses_records) {
        imports.insert(format!("{}.*", ctx.layout.tag_package(Category::DataTypes, tag)));
    }

    ServiceTemplate {
        package: ctx.layout.tag_package(Category::Service, tag),
        imports: imports.into_iter().collect(),
        tag: tag.to_string(),
        class_name: service_class(tag),
        client_class: client_class(tag),
        methods: bindings
            .iter()
            .map(|b| ServiceMethodView {
                doc: b.doc.clone(),
                name: b.method_name.clone(),
                signature: b.signature(),
                arguments: b.arguments(),
                response_type: b.response.name.clone(),
                operation_id: b.operation_id.clone(),
                has_body: b.has_body(),
            })
            .collect(),
    }
}

impl ArtifactGenerator for ServiceGenerator {
    fn name(&self) -> &'static str {
        "service"
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>> {
        let tag = &op.primary_tag;
        if self.emitted.contains(tag) {
            debug!(tag = %tag, operation = %op.id, "service already generated for tag");
            return Ok(Vec::new());
        }
        let template = service_template(ctx, tag);
        let file = ctx
            .writer
            .write_source(&template.package, &template.class_name, &template.render()?)?;
        self.emitted.insert(tag.clone());
        Ok(vec![file])
    }
}
