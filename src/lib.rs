//! # SpecForge
//!
//! **SpecForge** generates Spring Boot integration code from OpenAPI 3
//! specifications and migrates legacy form-encoded / XML integrations of an
//! existing Java project to JSON.
//!
//! ## Architecture
//!
//! - **[`spec`]** - loading, reference resolution and the operation catalog
//! - **[`layout`]** - package layout detection of an existing project
//! - **[`generator`]** - data type, client, service, endpoint and field mapper artifacts
//! - **[`migrate`]** - lossless rewrite of legacy source files and operation correlation
//! - **[`syntax`]** - the lossless Java syntax tree the migration edits
//! - **[`report`]** - Markdown report and JSON summary of a run
//! - **[`engine`]** - the orchestrator running a request through every stage
//! - **[`request`]** - run request, plan and response types
//! - **[`config`]** - project settings (`specforge.toml`)
//! - **[`logging`]** - tracing subscriber setup
//! - **[`cli`]** - the `specforge-gen` command line
//!
//! ## Run Flow
//!
//! ```text
//! RunRequest --validate--> RunPlan
//!     ScanLayout   LayoutDetector::detect
//!     LoadSpecs    load_spec + OperationCatalog (target, legacy)
//!     FilterScope  all | tags | operation ids
//!     Backup       git checkout -b <label>      (migrate, not dry-run)
//!     Generate     dto -> client -> service -> endpoint [-> mapper]
//!     Migrate      MigrationEngine::run         (migrate only)
//!     Report       Markdown + JSON summary
//!     Finalize     success | partial | failed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use specforge::request::RunRequest;
//!
//! let mut request = RunRequest::new("scaffold");
//! request.target_spec_path = Some("bundled:target-gateway.yaml".into());
//! request.project_root = "../payments-service".into();
//! let response = specforge::engine::run(&request);
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod layout;
pub mod logging;
pub mod migrate;
pub mod report;
pub mod request;
pub mod spec;
pub mod syntax;

pub use engine::{assemble, run, Orchestrator};
pub use error::{EngineError, EngineResult};
pub use request::{RunRequest, RunResponse, RunStatus};
