use super::artifact::{ArtifactGenerator, GenerationContext};
use super::binding::OperationBinding;
use super::naming::{escape_string_literal, package_case, type_case};
use super::service::service_class;
use super::templates::{EndpointTemplate, RouteView};
use super::writer::WrittenFile;
use crate::error::{EngineError, EngineResult};
use crate::layout::Category;
use crate::spec::{HttpMethod, Operation};
use askama::Template;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

const ENDPOINT_IMPORTS: &[&str] = &[
    "jakarta.validation.ValidationException",
    "java.util.Map",
    "lombok.RequiredArgsConstructor",
    "lombok.extern.slf4j.Slf4j",
    "org.springframework.http.MediaType",
    "org.springframework.http.ResponseEntity",
    "org.springframework.validation.annotation.Validated",
    "org.springframework.web.bind.annotation.ExceptionHandler",
    "org.springframework.web.bind.annotation.RequestMapping",
    "org.springframework.web.bind.annotation.RestController",
    "reactor.core.publisher.Mono",
];

const ANNOTATION_PACKAGE: &str = "org.springframework.web.bind.annotation";

/// `{Tag}Controller`
pub fn endpoint_class(tag: &str) -> String {
    format!("{}Controller", type_case(tag))
}

/// Route annotation for a verb, `None` for verbs routes cannot bind.
pub fn mapping_annotation(method: HttpMethod) -> Option<&'static str> {
    match method {
        HttpMethod::Get => Some("GetMapping"),
        HttpMethod::Post => Some("PostMapping"),
        HttpMethod::Put => Some("PutMapping"),
        HttpMethod::Delete => Some("DeleteMapping"),
        HttpMethod::Patch => Some("PatchMapping"),
        HttpMethod::Head | HttpMethod::Options | HttpMethod::Trace => None,
    }
}

/// Fails for operations whose verb has no route annotation.
///
/// Such an operation gets no artifacts at all, so it is checked before any
/// generator runs for it.
pub fn ensure_routable(op: &Operation) -> EngineResult<()> {
    match mapping_annotation(op.method) {
        Some(_) => Ok(()),
        None => Err(EngineError::generation(
            &op.id,
            format!("HTTP method {} cannot be bound to a route", op.method),
        )),
    }
}

/// Class-level route: `{route_prefix}/{tag package}`.
pub fn tag_base_path(route_prefix: &str, tag: &str) -> String {
    format!("{}/{}", route_prefix.trim_end_matches('/'), package_case(tag))
}

/// Strip the server base path from an operation path that already carries it.
pub fn route_path(path: &str, base_path: Option<&str>) -> String {
    let stripped = base_path
        .map(|base| base.trim_end_matches('/'))
        .filter(|base| !base.is_empty())
        .and_then(|base| path.strip_prefix(base))
        .filter(|rest| rest.is_empty() || rest.starts_with('/'));
    match stripped {
        Some("") => "/".to_string(),
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}

/// Emits one reactive REST controller per tag.
#[derive(Debug, Default)]
pub struct EndpointGenerator {
    emitted: HashSet<String>,
}

impl EndpointGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn route_view(
    op: &Operation,
    mapping: &str,
    base_path: Option<&str>,
    imports: &mut BTreeSet<String>,
) -> RouteView {
    let binding = OperationBinding::new(op);
    let mut use_annotation = |name: &str| {
        imports.insert(format!("{ANNOTATION_PACKAGE}.{name}"));
    };
    use_annotation(mapping);

    let mut params = Vec::new();
    for p in &binding.path_params {
        use_annotation("PathVariable");
        params.push(format!("@PathVariable(\"{}\") {} {}", p.wire, p.java_type, p.member));
    }
    for p in &binding.query_params {
        use_annotation("RequestParam");
        params.push(format!(
            "@RequestParam(value = \"{}\", required = {}) {} {}",
            p.wire, p.required, p.java_type, p.member
        ));
    }
    if binding.query_map {
        use_annotation("RequestParam");
        params.push("@RequestParam Map<String, Object> queryParams".to_string());
    }
    for p in &binding.headers {
        use_annotation("RequestHeader");
        params.push(format!(
            "@RequestHeader(value = \"{}\", required = {}) {} {}",
            p.wire, p.required, p.java_type, p.member
        ));
    }
    if let Some(request) = &binding.request {
        use_annotation("RequestBody");
        imports.insert("jakarta.validation.Valid".to_string());
        params.push(format!("@Valid @RequestBody {} request", request.name));
    }

    let created = op.method == HttpMethod::Post;
    if created {
        imports.insert(format!("{ANNOTATION_PACKAGE}.ResponseStatus"));
        imports.insert("org.springframework.http.HttpStatus".to_string());
    }
    let wrap = match (binding.response.is_void(), created) {
        (true, true) => ".then(Mono.fromSupplier(() -> ResponseEntity.status(HttpStatus.CREATED).<Void>build()))",
        (true, false) => ".then(Mono.fromSupplier(() -> ResponseEntity.noContent().<Void>build()))",
        (false, true) => ".map(body -> ResponseEntity.status(HttpStatus.CREATED).body(body))",
        (false, false) => ".map(ResponseEntity::ok)",
    };
    imports.extend(binding.imports());

    RouteView {
        doc: binding.doc.clone(),
        name: binding.method_name.clone(),
        operation_id: binding.operation_id.clone(),
        verb: binding.verb.to_string(),
        mapping: mapping.to_string(),
        path: escape_string_literal(&route_path(&op.path, base_path)),
        consumes_json: !matches!(op.method, HttpMethod::Get | HttpMethod::Delete),
        created,
        params,
        headers: binding.headers.clone(),
        arguments: binding.arguments(),
        response_type: binding.response.name.clone(),
        wrap: wrap.to_string(),
    }
}

/// Template data for the controller of `tag`; operations whose verb cannot be
/// routed are left out.
pub fn endpoint_template(ctx: &GenerationContext<'_>, tag: &str) -> EndpointTemplate {
    let base_path = ctx.catalog.metadata().base_path.as_deref();
    let mut imports: BTreeSet<String> = ENDPOINT_IMPORTS.iter().map(|s| s.to_string()).collect();
    imports.insert(format!(
        "{}.{}",
        ctx.layout.tag_package(Category::Service, tag),
        service_class(tag)
    ));

    let mut routes = Vec::new();
    let mut uses_records = false;
    for op in ctx.tag_operations(tag) {
        let Some(mapping) = mapping_annotation(op.method) else {
            continue;
        };
        uses_records |= OperationBinding::new(op).uses_records();
        routes.push(route_view(op, mapping, base_path, &mut imports));
    }
    if uses_records {
        imports.insert(format!("{}.*", ctx.layout.tag_package(Category::DataTypes, tag)));
    }

    EndpointTemplate {
        package: ctx.layout.tag_package(Category::Endpoint, tag),
        imports: imports.into_iter().collect(),
        tag: tag.to_string(),
        class_name: endpoint_class(tag),
        base_path: escape_string_literal(&tag_base_path(&ctx.settings.route_prefix, tag)),
        service_class: service_class(tag),
        routes,
    }
}

impl ArtifactGenerator for EndpointGenerator {
    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>> {
        ensure_routable(op)?;
        let tag = &op.primary_tag;
        if self.emitted.contains(tag) {
            debug!(tag = %tag, operation = %op.id, "controller already generated for tag");
            return Ok(Vec::new());
        }
        let template = endpoint_template(ctx, tag);
        let file = ctx
            .writer
            .write_source(&template.package, &template.class_name, &template.render()?)?;
        self.emitted.insert(tag.clone());
        Ok(vec![file])
    }
}
