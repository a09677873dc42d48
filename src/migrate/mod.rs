//! # Migration Engine
//!
//! Finds source files that still speak the legacy form-encoded / XML wire
//! format and rewrites them to JSON, and correlates target operations with
//! their legacy counterparts.
//!
//! ## File selection
//!
//! Every `.java` file below the source root whose text contains one of the
//! [`rules::FILE_INDICATORS`] is parsed. Inside it, routines that mention a
//! trigger (see [`rules`]) are treated as legacy call sites.
//!
//! ## Rewrites
//!
//! - route annotations negotiate `application/json`;
//! - `Document`/`Element` parameters become `Map<String, Object>`;
//! - `processXml`/`marshal`/`unmarshal` calls become
//!   `objectMapper.writeValueAsString`;
//! - legacy imports are dropped and the replacement imports added.
//!
//! A file is written back only if something changed; untouched files keep
//! their bytes. Under dry-run the changed files are reported but not written.

mod correlate;
mod rewrite;
pub mod rules;

pub use correlate::{correlate, find_legacy_operation, MatchKind};
pub use rewrite::{is_legacy_routine, rewrite_source, rewrite_unit, Edit, Rewrite};

use crate::error::EngineError;
use crate::request::OperationMapping;
use crate::spec::{Operation, OperationCatalog};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// What a migration pass changed and what it left for a human.
#[derive(Debug, Default)]
pub struct MigrationOutcome {
    pub updated_files: Vec<PathBuf>,
    pub mappings: Vec<OperationMapping>,
    pub errors: Vec<EngineError>,
    pub todos: Vec<String>,
}

/// Rewrites legacy integration code in a project tree.
pub struct MigrationEngine<'a> {
    legacy: &'a OperationCatalog,
    dry_run: bool,
}

impl<'a> MigrationEngine<'a> {
    pub fn new(legacy: &'a OperationCatalog, dry_run: bool) -> Self {
        MigrationEngine { legacy, dry_run }
    }

    /// Correlate `scoped` target operations and rewrite every candidate file
    /// below `source_root`.
    pub fn run(&self, source_root: &Path, scoped: &[&Operation]) -> MigrationOutcome {
        let mut outcome = MigrationOutcome::default();

        for op in scoped {
            let legacy = find_legacy_operation(self.legacy, op);
            if legacy.is_none() {
                outcome.todos.push(format!(
                    "Map legacy integration for {} manually: no legacy operation matched",
                    op.id
                ));
            }
            outcome.mappings.push(OperationMapping {
                legacy_operation: legacy.map(|l| l.id.clone()),
                target_operation: op.id.clone(),
                tag: op.primary_tag.clone(),
            });
        }

        for path in java_files(source_root) {
            match self.migrate_file(&path) {
                Ok(Some(rewrite)) => {
                    for class in &rewrite.types {
                        outcome.todos.push(format!(
                            "Inject an ObjectMapper into {class} ({})",
                            path.display()
                        ));
                    }
                    outcome.updated_files.push(path);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "skipping file");
                    outcome.errors.push(err);
                }
            }
        }
        info!(
            updated = outcome.updated_files.len(),
            errors = outcome.errors.len(),
            "migration pass finished"
        );
        outcome
    }

    /// Rewrite one file; `Ok(None)` when it is not a candidate or nothing applied.
    pub fn migrate_file(&self, path: &Path) -> Result<Option<Rewrite>, EngineError> {
        let failed = |message: String| EngineError::Migration {
            path: path.to_path_buf(),
            message,
        };
        let source = fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
        if !rules::is_candidate_file(&source) {
            return Ok(None);
        }
        let Some(rewrite) = rewrite_source(&source).map_err(failed)? else {
            return Ok(None);
        };
        if self.dry_run {
            info!(path = %path.display(), edits = rewrite.edits.len(), "dry-run: would rewrite");
        } else {
            fs::write(path, &rewrite.source).map_err(|e| failed(e.to_string()))?;
            info!(path = %path.display(), edits = rewrite.edits.len(), "rewrote legacy source");
        }
        Ok(Some(rewrite))
    }
}

fn java_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests;
