//! Error taxonomy for a generation or migration run.
//!
//! Errors fall into two classes. Fatal errors (bad configuration, a spec that
//! cannot be found/parsed/resolved, an undetectable layout) stop the run before
//! any file is produced. Everything else is scoped to one unit of work: the
//! orchestrator records it in the run result and moves on to the next unit.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the engine can report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid mode/scope combination or missing required input.
    #[error("Invalid request: {0}")]
    FatalConfig(String),

    /// The specification path (or bundled resource) does not exist.
    #[error("OpenAPI spec not found: {path}")]
    SpecNotFound { path: String },

    /// The document is not a parseable OpenAPI 3 description.
    #[error("Failed to parse OpenAPI spec {path}: {diagnostics}")]
    SpecParse { path: String, diagnostics: String },

    /// A `$ref` does not match any component.
    #[error("Unresolvable reference: {reference}")]
    SpecUnresolvable { reference: String },

    /// No base package could be inferred from the project tree.
    #[error("Could not detect project layout under {}: {reason}", .root.display())]
    LayoutUndetectable { root: PathBuf, reason: String },

    /// One operation failed to generate.
    #[error("Failed to generate {operation_id}: {message}")]
    Generation {
        operation_id: String,
        message: String,
    },

    /// One legacy file failed to migrate.
    #[error("Failed to migrate {}: {message}", .path.display())]
    Migration { path: PathBuf, message: String },

    /// The run report could not be rendered or written.
    #[error("Failed to write report: {0}")]
    Report(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl EngineError {
    /// Whether this error aborts the whole run rather than a single unit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::FatalConfig(_)
                | EngineError::SpecNotFound { .. }
                | EngineError::SpecParse { .. }
                | EngineError::SpecUnresolvable { .. }
                | EngineError::LayoutUndetectable { .. }
        )
    }

    pub fn generation(operation_id: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Generation {
            operation_id: operation_id.into(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classes() {
        assert!(EngineError::FatalConfig("x".into()).is_fatal());
        assert!(EngineError::SpecNotFound { path: "a".into() }.is_fatal());
        assert!(EngineError::SpecUnresolvable {
            reference: "#/components/schemas/X".into()
        }
        .is_fatal());
        assert!(!EngineError::generation("op", "boom").is_fatal());
        assert!(!EngineError::Report("disk full".into()).is_fatal());
    }

    #[test]
    fn test_generation_message_names_operation() {
        let err = EngineError::generation("processPayment", "unsupported verb HEAD");
        assert_eq!(
            err.to_string(),
            "Failed to generate processPayment: unsupported verb HEAD"
        );
    }
}
