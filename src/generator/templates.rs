use askama::Template;

use super::binding::BoundParam;

/// One field of a generated record.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub doc: String,
    pub annotations: Vec<String>,
    pub java_type: String,
    pub name: String,
}

/// Template data for a data-transfer record (`data_type.java.txt`)
#[derive(Template)]
#[template(path = "data_type.java.txt", escape = "none")]
pub struct DataTypeTemplate {
    pub package: String,
    pub imports: Vec<String>,
    pub doc: Vec<String>,
    pub class_annotations: Vec<String>,
    pub class_name: String,
    pub fields: Vec<FieldView>,
}

/// One outbound call of a client binding.
#[derive(Debug, Clone)]
pub struct ClientMethodView {
    pub doc: Vec<String>,
    pub name: String,
    pub signature: String,
    pub response_type: String,
    pub body_type_argument: String,
    pub operation_id: String,
    pub verb: String,
    pub path: String,
    pub path_args: String,
    pub query_params: Vec<BoundParam>,
    pub query_map: bool,
    pub has_headers: bool,
    pub has_body: bool,
}

/// Template data for the per-tag outbound client (`client.java.txt`)
#[derive(Template)]
#[template(path = "client.java.txt", escape = "none")]
pub struct ClientTemplate {
    pub package: String,
    pub imports: Vec<String>,
    pub tag: String,
    pub class_name: String,
    pub base_url_placeholder: String,
    pub timeout_placeholder: String,
    pub max_retries_placeholder: String,
    pub methods: Vec<ClientMethodView>,
}

/// One delegating method of a service.
#[derive(Debug, Clone)]
pub struct ServiceMethodView {
    pub doc: Vec<String>,
    pub name: String,
    pub signature: String,
    pub arguments: String,
    pub response_type: String,
    pub operation_id: String,
    pub has_body: bool,
}

/// Template data for the per-tag service layer (`service.java.txt`)
#[derive(Template)]
#[template(path = "service.java.txt", escape = "none")]
pub struct ServiceTemplate {
    pub package: String,
    pub imports: Vec<String>,
    pub tag: String,
    pub class_name: String,
    pub client_class: String,
    pub methods: Vec<ServiceMethodView>,
}

/// One inbound route of an endpoint binding.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub doc: Vec<String>,
    pub name: String,
    pub operation_id: String,
    pub verb: String,
    pub mapping: String,
    pub path: String,
    pub consumes_json: bool,
    pub created: bool,
    pub params: Vec<String>,
    pub headers: Vec<BoundParam>,
    pub arguments: String,
    pub response_type: String,
    pub wrap: String,
}

/// Template data for the per-tag inbound controller (`endpoint.java.txt`)
#[derive(Template)]
#[template(path = "endpoint.java.txt", escape = "none")]
pub struct EndpointTemplate {
    pub package: String,
    pub imports: Vec<String>,
    pub tag: String,
    pub class_name: String,
    pub base_path: String,
    pub service_class: String,
    pub routes: Vec<RouteView>,
}

/// A field assignment inside a mapper method.
#[derive(Debug, Clone)]
pub struct MappingLineView {
    pub target: String,
    pub expression: String,
}

#[derive(Debug, Clone)]
pub struct StatusPairView {
    pub from: String,
    pub to: String,
}

/// Template data for the per-operation field mapper (`field_mapper.java.txt`)
#[derive(Template)]
#[template(path = "field_mapper.java.txt", escape = "none")]
pub struct FieldMapperTemplate {
    pub package: String,
    pub imports: Vec<String>,
    pub class_name: String,
    pub operation_id: String,
    pub legacy_operation: String,
    pub request_lines: Vec<MappingLineView>,
    pub response_lines: Vec<MappingLineView>,
    pub status_to_result: Vec<StatusPairView>,
    pub result_to_status: Vec<StatusPairView>,
    pub unmapped_result: String,
    pub unmapped_status: String,
}
