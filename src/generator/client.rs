use super::artifact::{ArtifactGenerator, GenerationContext};
use super::binding::OperationBinding;
use super::naming::type_case;
use super::templates::{ClientMethodView, ClientTemplate};
use super::writer::WrittenFile;
use crate::error::EngineResult;
use crate::layout::Category;
use crate::spec::Operation;
use askama::Template;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

const CLIENT_IMPORTS: &[&str] = &[
    "java.nio.charset.StandardCharsets",
    "java.time.Duration",
    "java.util.Collections",
    "lombok.extern.slf4j.Slf4j",
    "org.springframework.beans.factory.annotation.Value",
    "org.springframework.http.HttpMethod",
    "org.springframework.http.MediaType",
    "org.springframework.stereotype.Component",
    "org.springframework.web.reactive.function.client.ClientResponse",
    "org.springframework.web.reactive.function.client.WebClient",
    "org.springframework.web.reactive.function.client.WebClientResponseException",
    "org.springframework.web.util.UriComponentsBuilder",
    "reactor.core.publisher.Mono",
    "reactor.util.retry.Retry",
];

/// `{Tag}Client`
pub fn client_class(tag: &str) -> String {
    format!("{}Client", type_case(tag))
}

/// Emits one outbound WebClient binding per tag.
#[derive(Debug, Default)]
pub struct ClientGenerator {
    emitted: HashSet<String>,
}

impl ClientGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn method_view(binding: &OperationBinding) -> ClientMethodView {
    ClientMethodView {
        doc: binding.doc.clone(),
        name: binding.method_name.clone(),
        signature: binding.signature(),
        response_type: binding.response.name.clone(),
        body_type_argument: binding.response.body_type_argument(),
        operation_id: binding.operation_id.clone(),
        verb: binding.verb.to_string(),
        path: binding.path.clone(),
        path_args: binding
            .path_params
            .iter()
            .map(|p| p.member.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        query_params: binding.query_params.clone(),
        query_map: binding.query_map,
        has_headers: !binding.headers.is_empty(),
        has_body: binding.has_body(),
    }
}

/// Template data for the client of `tag`, built from every operation of the tag.
pub fn client_template(ctx: &GenerationContext<'_>, tag: &str) -> ClientTemplate {
    let bindings: Vec<OperationBinding> = ctx
        .tag_operations(tag)
        .into_iter()
        .map(OperationBinding::new)
        .collect();

    let mut imports: BTreeSet<String> = CLIENT_IMPORTS.iter().map(|s| s.to_string()).collect();
    for binding in &bindings {
        imports.extend(binding.imports());
        if binding.response.name.contains('<') {
            imports.insert("org.springframework.core.ParameterizedTypeReference".to_string());
        }
    }
    if bindings.iter().any(OperationBinding::uses_records) {
        imports.insert(format!("{}.*", ctx.layout.tag_package(Category::DataTypes, tag)));
    }

    let client = &ctx.settings.client;
    ClientTemplate {
        package: ctx.layout.tag_package(Category::Client, tag),
        imports: imports.into_iter().collect(),
        tag: tag.to_string(),
        class_name: client_class(tag),
        base_url_placeholder: client.base_url_placeholder(),
        timeout_placeholder: client.timeout_placeholder(),
        max_retries_placeholder: client.max_retries_placeholder(),
        methods: bindings.iter().map(method_view).collect(),
    }
}

impl ArtifactGenerator for ClientGenerator {
    fn name(&self) -> &'static str {
        "client"
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>> {
        let tag = &op.primary_tag;
        if self.emitted.contains(tag) {
            debug!(tag = %tag, operation = %op.id, "client already generated for tag");
            return Ok(Vec::new());
        }
        let template = client_template(ctx, tag);
        let file = ctx
            .writer
            .write_source(&template.package, &template.class_name, &template.render()?)?;
        self.emitted.insert(tag.clone());
        Ok(vec![file])
    }
}
