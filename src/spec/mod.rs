//! # Spec Module
//!
//! Loads OpenAPI 3 documents and turns them into a reference-free schema and
//! operation graph.
//!
//! ## Overview
//!
//! - [`load_spec`] reads a file or a `bundled:` resource, validates it as
//!   OpenAPI 3 and records title, version, size and fingerprint.
//! - [`Resolver`] replaces every `$ref` with its target, merges `allOf`,
//!   keeps `oneOf`/`anyOf` as composed unions and cuts cycles with a back-edge.
//! - [`OperationCatalog`] indexes the operations by id and tag and answers
//!   scope and fuzzy lookups.
//!
//! ```rust,ignore
//! use specforge::spec::{load_spec, OperationCatalog};
//!
//! let catalog = OperationCatalog::new("target", load_spec("openapi.yaml")?);
//! for op in catalog.find_by_tags(&["Transactions"]) {
//!     println!("{} {} {}", op.method, op.path, op.id);
//! }
//! ```

mod build;
mod catalog;
mod load;
mod types;

pub use build::*;
pub use catalog::*;
pub use load::*;
pub use types::*;
