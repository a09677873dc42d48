//! # Generator Module
//!
//! Turns the operations of an [`OperationCatalog`](crate::spec::OperationCatalog)
//! into Java / Spring Boot sources placed in a project's detected layout.
//!
//! ## Artifacts
//!
//! For every operation, in this order:
//!
//! - **Data types** ([`DataTypeGenerator`]): one Lombok record per object or
//!   union schema reachable from the operation, with Jackson and Bean
//!   Validation annotations.
//! - **Client** ([`ClientGenerator`]): one WebClient binding per tag with
//!   bounded retries and an overall timeout.
//! - **Service** ([`ServiceGenerator`]): one service per tag that validates
//!   request bodies and maps upstream status codes to exceptions.
//! - **Endpoint** ([`EndpointGenerator`]): one reactive controller per tag.
//! - **Field mapper** ([`FieldMapperGenerator`], migrations only): one
//!   interface per operation converting between legacy and target payloads.
//!
//! Client, service and endpoint artifacts are tag-scoped: the first operation
//! of a tag triggers the complete artifact, built from every operation of the
//! tag in the catalog.
//!
//! ## Templates
//!
//! Sources are rendered with Askama from `templates/*.java.txt`. The template
//! data structs live in [`templates`]; every string that needs Java escaping is
//! escaped before it reaches a template.
//!
//! ## Naming
//!
//! All identifiers go through [`type_case`], [`member_case`] and
//! [`package_case`], so the same input always yields the same name in every
//! artifact.

mod artifact;
mod binding;
mod client;
mod dto;
mod endpoint;
pub mod mapping_rules;
mod mapper;
mod naming;
mod schema;
mod service;
pub mod templates;
mod writer;

pub use artifact::{ArtifactGenerator, GenerationContext};
pub use binding::{path_placeholders, BoundParam, OperationBinding, MAX_INDIVIDUAL_QUERY_PARAMS};
pub use client::{client_class, ClientGenerator};
pub use dto::{collect_records, DataTypeGenerator};
pub use endpoint::{
    endpoint_class, ensure_routable, mapping_annotation, route_path, tag_base_path,
    EndpointGenerator,
};
pub use mapper::{mapper_class, FieldMapperGenerator};
pub use naming::*;
pub use schema::{java_type, operation_class, param_type, JavaType};
pub use service::{service_class, ServiceGenerator};
pub use writer::{ArtifactWriter, FileChange, WrittenFile};

/// Generators of one run, in per-operation order.
///
/// The field mapper only takes part in migrations.
pub fn generators(migrating: bool) -> Vec<Box<dyn ArtifactGenerator>> {
    let mut all: Vec<Box<dyn ArtifactGenerator>> = vec![
        Box::new(DataTypeGenerator::new()),
        Box::new(ClientGenerator::new()),
        Box::new(ServiceGenerator::new()),
        Box::new(EndpointGenerator::new()),
    ];
    if migrating {
        all.push(Box::new(FieldMapperGenerator::new()));
    }
    all
}
