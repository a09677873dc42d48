//! # Orchestrator
//!
//! Drives one run through its stages:
//!
//! ```text
//! ScanLayout -> LoadSpecs -> FilterScope -> [Backup] -> Generate -> [Migrate] -> Report -> Finalize
//! ```
//!
//! `Backup` and `Migrate` only run in migrate mode, and `Backup` is skipped
//! under dry-run. The first three stages fail the run outright; from
//! `Generate` on every unit of work (one operation, one legacy file) returns
//! its own result and failures are collected into the [`GenerationResult`]
//! instead of stopping the run.
//!
//! [`assemble`] builds the orchestrator and all of its collaborators from a
//! [`RunRequest`]; [`run`] is the one-call entry point used by the CLI.

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::generator::{
    ensure_routable, generators, ArtifactWriter, FileChange, GenerationContext, WrittenFile,
};
use crate::layout::{persist_layout, source_root, DetectedLayout, LayoutDetector};
use crate::migrate::MigrationEngine;
use crate::report::{ReportBuilder, ReportEncoder, ReportInput};
use crate::request::{
    FileChanges, OperationMapping, RunPlan, RunRequest, RunResponse, RunStatus, Scope,
};
use crate::spec::{load_spec, Operation, OperationCatalog};
use anyhow::Context;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, info_span, warn};

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ScanLayout,
    LoadSpecs,
    FilterScope,
    Backup,
    Generate,
    Migrate,
    Report,
    Finalize,
}

impl Stage {
    /// The stage after `self` for `plan`, `None` once finalized.
    pub fn next(self, plan: &RunPlan) -> Option<Stage> {
        let migrating = plan.mode.is_migrate();
        match self {
            Stage::ScanLayout => Some(Stage::LoadSpecs),
            Stage::LoadSpecs => Some(Stage::FilterScope),
            Stage::FilterScope if migrating && !plan.dry_run => Some(Stage::Backup),
            Stage::FilterScope | Stage::Backup => Some(Stage::Generate),
            Stage::Generate if migrating => Some(Stage::Migrate),
            Stage::Generate | Stage::Migrate => Some(Stage::Report),
            Stage::Report => Some(Stage::Finalize),
            Stage::Finalize => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Accumulator owned by the orchestrator for the lifetime of a run.
///
/// Stages only append to it, so a failure late in the run never discards
/// what earlier stages produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub changes: FileChanges,
    pub operation_mappings: Vec<OperationMapping>,
    pub errors: Vec<String>,
    pub todos: Vec<String>,
    /// Operations generated and files migrated without error.
    pub completed_units: usize,
    pub report_path: Option<PathBuf>,
    /// Set once by [`GenerationResult::finalize`].
    pub status: Option<RunStatus>,
}

impl GenerationResult {
    /// Status implied by the errors and completed units so far.
    pub fn current_status(&self) -> RunStatus {
        RunStatus::determine(self.errors.len(), self.completed_units)
    }

    pub fn finalize(&mut self) -> RunStatus {
        let status = self.current_status();
        self.status = Some(status);
        status
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(RunStatus::Success)
    }

    pub fn is_partial_success(&self) -> bool {
        self.status == Some(RunStatus::Partial)
    }

    pub fn record_files(&mut self, files: impl IntoIterator<Item = WrittenFile>) {
        for file in files {
            let list = match file.change {
                FileChange::Created => &mut self.changes.created,
                FileChange::Updated => &mut self.changes.updated,
            };
            push_unique(list, file.path);
        }
    }

    pub fn record_error(&mut self, err: &EngineError) {
        self.errors.push(err.to_string());
    }

    /// Fill in legacy ids for known target operations, append the rest.
    pub fn merge_mappings(&mut self, mappings: impl IntoIterator<Item = OperationMapping>) {
        for mapping in mappings {
            match self
                .operation_mappings
                .iter_mut()
                .find(|m| m.target_operation == mapping.target_operation)
            {
                Some(existing) => existing.legacy_operation = mapping.legacy_operation,
                None => self.operation_mappings.push(mapping),
            }
        }
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: PathBuf) {
    if !list.contains(&path) {
        list.push(path);
    }
}

/// Target operations selected by `scope`, in catalog order.
///
/// # Errors
///
/// [`EngineError::FatalConfig`] when nothing matches.
pub fn filter_scope<'c>(catalog: &'c OperationCatalog, scope: &Scope) -> EngineResult<Vec<&'c Operation>> {
    let selected: Vec<&Operation> = match scope {
        Scope::All => catalog.operations().iter().collect(),
        Scope::Tags(tags) => catalog.find_by_tags(tags),
        Scope::Operations(ids) => {
            let found = catalog.find_by_ids(ids);
            if found.len() < ids.len() {
                debug!(requested = ids.len(), found = found.len(), "unknown operation ids dropped");
            }
            found
        }
    };
    if selected.is_empty() {
        return Err(EngineError::FatalConfig(
            "No operations found matching the specified scope".to_string(),
        ));
    }
    Ok(selected)
}

/// Create a recovery branch named `label` in `project_root`.
///
/// `SPECFORGE_GIT_BIN` overrides the git executable.
pub fn create_checkpoint(project_root: &Path, label: &str) -> anyhow::Result<()> {
    let git = std::env::var("SPECFORGE_GIT_BIN").unwrap_or_else(|_| "git".to_string());
    let output = Command::new(&git)
        .args(["checkout", "-b", label])
        .current_dir(project_root)
        .output()
        .with_context(|| format!("Failed to run {git}"))?;
    if !output.status.success() {
        anyhow::bail!(
            "git checkout -b {label} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// One run: a validated plan plus the settings and encoder it uses.
pub struct Orchestrator {
    plan: RunPlan,
    settings: EngineSettings,
    encoder: ReportEncoder,
}

/// Validate `request` and wire up an [`Orchestrator`] for it.
///
/// Settings are read from the project root (see [`EngineSettings::load`]).
pub fn assemble(request: &RunRequest) -> EngineResult<Orchestrator> {
    let plan = request.validate()?;
    let settings = EngineSettings::load(&plan.project_root)
        .map_err(|e| EngineError::FatalConfig(format!("{e:#}")))?;
    Ok(Orchestrator::new(plan, settings))
}

/// Assemble and run `request`; always yields a response.
pub fn run(request: &RunRequest) -> RunResponse {
    match assemble(request) {
        Ok(orchestrator) => orchestrator.run(),
        Err(err) => {
            error!(error = %err, "run rejected");
            RunResponse::fatal(request.mode.trim(), request.scope.trim(), &err)
        }
    }
}

impl Orchestrator {
    pub fn new(plan: RunPlan, settings: EngineSettings) -> Self {
        Orchestrator {
            plan,
            settings,
            encoder: ReportEncoder::new(),
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Execute every stage and build the response.
    pub fn run(&self) -> RunResponse {
        let span = info_span!("run", mode = %self.plan.mode, scope = %self.plan.scope);
        let _guard = span.enter();
        let mode = self.plan.mode.as_str();
        let scope = self.plan.scope.as_str();

        let mut result = GenerationResult::default();
        match self.execute(&mut result) {
            Ok(layout) => {
                let status = result.status.unwrap_or_else(|| result.current_status());
                info!(
                    %status,
                    created = result.changes.created.len(),
                    updated = result.changes.updated.len(),
                    errors = result.errors.len(),
                    "run finished"
                );
                let mut response = RunResponse::new(status, mode, scope).with_layout(&layout);
                response.operation_mappings = result.operation_mappings;
                response.changes = result.changes;
                response.todos = result.todos;
                response.errors = result.errors;
                response.report_path = result.report_path;
                response
            }
            Err(err) => {
                error!(error = %err, "run aborted");
                RunResponse::fatal(mode, scope, &err)
            }
        }
    }

    fn enter(&self, stage: Stage) {
        info!(%stage, "entering stage");
    }

    /// Runs the stage sequence; only the fatal stages return `Err`.
    fn execute(&self, result: &mut GenerationResult) -> EngineResult<DetectedLayout> {
        let started_at = Local::now();
        let project_root = &self.plan.project_root;

        self.enter(Stage::ScanLayout);
        let layout = LayoutDetector::new(&self.settings.source_dir).detect(project_root)?;
        if !self.plan.dry_run {
            persist_layout(project_root, &layout);
        }

        self.enter(Stage::LoadSpecs);
        let target = OperationCatalog::new("target", load_spec(&self.plan.target_spec)?);
        let legacy = match &self.plan.legacy_spec {
            Some(location) => Some(OperationCatalog::new("legacy", load_spec(location)?)),
            None => None,
        };
        for catalog in std::iter::once(&target).chain(legacy.as_ref()) {
            result.todos.extend(catalog.warnings().iter().cloned());
        }

        self.enter(Stage::FilterScope);
        let scoped = filter_scope(&target, &self.plan.scope)?;
        info!(operations = scoped.len(), "operations in scope");

        let mut stage = Stage::FilterScope;
        while let Some(next) = stage.next(&self.plan) {
            stage = next;
            self.enter(stage);
            match stage {
                Stage::Backup => self.backup(),
                Stage::Generate => {
                    let writer =
                        ArtifactWriter::new(self.settings.output_root(project_root), self.plan.dry_run);
                    let ctx = GenerationContext {
                        layout: &layout,
                        catalog: &target,
                        legacy: legacy.as_ref(),
                        settings: &self.settings,
                        writer: &writer,
                    };
                    self.generate(&ctx, &scoped, result);
                }
                Stage::Migrate => {
                    if let Some(legacy) = &legacy {
                        self.migrate(legacy, &scoped, result);
                    }
                }
                Stage::Report => {
                    let catalogs: Vec<&OperationCatalog> =
                        std::iter::once(&target).chain(legacy.as_ref()).collect();
                    self.report(&catalogs, &layout, started_at, result);
                }
                Stage::Finalize => {
                    result.finalize();
                }
                Stage::ScanLayout | Stage::LoadSpecs | Stage::FilterScope => {}
            }
        }
        Ok(layout)
    }

    fn backup(&self) {
        match create_checkpoint(&self.plan.project_root, &self.plan.backup_label) {
            Ok(()) => info!(label = %self.plan.backup_label, "created backup checkpoint"),
            Err(err) => warn!(
                label = %self.plan.backup_label,
                error = %format!("{err:#}"),
                "backup checkpoint not created, continuing"
            ),
        }
    }

    fn generate(&self, ctx: &GenerationContext<'_>, scoped: &[&Operation], result: &mut GenerationResult) {
        let mut pipeline = generators(self.plan.mode.is_migrate());
        for op in scoped {
            let mut outcome = ensure_routable(op);
            if let Err(err) = &outcome {
                warn!(operation = %op.id, method = %op.method, error = %err, "operation skipped");
            }
            if outcome.is_ok() {
                for generator in pipeline.iter_mut() {
                    match generator.generate(ctx, op) {
                        Ok(files) => result.record_files(files),
                        Err(err) => {
                            warn!(operation = %op.id, generator = generator.name(), error = %err, "generation failed");
                            outcome = Err(err);
                            break;
                        }
                    }
                }
            }
            match outcome {
                Ok(()) => result.completed_units += 1,
                Err(err @ EngineError::Generation { .. }) => result.record_error(&err),
                Err(err) => result.record_error(&EngineError::generation(&op.id, err.to_string())),
            }
            result.operation_mappings.push(OperationMapping {
                legacy_operation: None,
                target_operation: op.id.clone(),
                tag: op.primary_tag.clone(),
            });
        }
    }

    fn migrate(&self, legacy: &OperationCatalog, scoped: &[&Operation], result: &mut GenerationResult) {
        let root = source_root(&self.plan.project_root, &self.settings.source_dir);
        let outcome = MigrationEngine::new(legacy, self.plan.dry_run).run(&root, scoped);
        result.completed_units += outcome.updated_files.len();
        for path in outcome.updated_files {
            push_unique(&mut result.changes.updated, path);
        }
        result.merge_mappings(outcome.mappings);
        for err in &outcome.errors {
            result.record_error(err);
        }
        result.todos.extend(outcome.todos);
    }

    fn report(
        &self,
        catalogs: &[&OperationCatalog],
        layout: &DetectedLayout,
        started_at: DateTime<Local>,
        result: &mut GenerationResult,
    ) {
        let builder = ReportBuilder::new(
            &self.encoder,
            self.settings.report_root(&self.plan.project_root),
        );
        let input = ReportInput {
            plan: &self.plan,
            catalogs,
            layout: Some(layout),
            result,
            status: result.current_status(),
            started_at,
        };
        match builder.publish(&input, self.plan.dry_run) {
            Ok(path) => result.report_path = path,
            Err(err) => warn!(error = %err, "report not rendered"),
        }
    }
}
