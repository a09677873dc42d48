//! Run report: a Markdown document for humans and a JSON summary of counts.
//!
//! Both files are named after the run's mode, scope and start time and land
//! in the configured report directory. Rendering always happens so template
//! problems surface under dry-run too; writing is skipped under dry-run and a
//! failed write is only logged.

use crate::engine::GenerationResult;
use crate::error::{EngineError, EngineResult};
use crate::layout::DetectedLayout;
use crate::request::{RunMode, RunPlan, RunStatus, Scope};
use crate::spec::OperationCatalog;
use askama::Template;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Checklist entries every report ends with.
pub const DEFAULT_TODOS: &[&str] = &[
    "Review generated code for correctness",
    "Update authentication configuration in application properties",
    "Configure API base URL and credentials",
    "Run integration tests against sandbox environment",
    "Review and update error handling as needed",
    "Verify PCI compliance for card data handling",
];

/// Added to [`DEFAULT_TODOS`] for migrate runs.
pub const MIGRATE_TODOS: &[&str] = &[
    "Test backward compatibility with existing clients",
    "Plan migration strategy for production",
    "Update API documentation",
];

const FILE_STAMP: &str = "%Y%m%d_%H%M%S";

/// The JSON encoder shared by the report and the summary of one run.
///
/// Built once by the orchestrator and handed to whatever needs to serialize.
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    indent: &'static [u8],
}

impl Default for ReportEncoder {
    fn default() -> Self {
        ReportEncoder { indent: b"  " }
    }
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print `value` as JSON.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> EngineResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| EngineError::Report(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| EngineError::Report(e.to_string()))
    }
}

/// Everything a report describes.
#[derive(Clone, Copy)]
pub struct ReportInput<'a> {
    pub plan: &'a RunPlan,
    /// Loaded catalogs, target first.
    pub catalogs: &'a [&'a OperationCatalog],
    pub layout: Option<&'a DetectedLayout>,
    pub result: &'a GenerationResult,
    pub status: RunStatus,
    pub started_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct ConfigRow {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct SpecView {
    pub label: String,
    pub path: String,
    pub title: String,
    pub size: String,
    pub hash: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct MappingRow {
    pub legacy: String,
    pub target: String,
    pub tag: String,
}

/// Template data for `report.md.txt`
#[derive(Template)]
#[template(path = "report.md.txt", escape = "none")]
pub struct ReportTemplate {
    pub generated: String,
    pub config_rows: Vec<ConfigRow>,
    pub specs: Vec<SpecView>,
    pub has_layout: bool,
    pub layout_json: String,
    pub mappings: Vec<MappingRow>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    pub todos: Vec<String>,
    pub status_label: &'static str,
    pub summary: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeStats {
    created: usize,
    updated: usize,
    deleted: usize,
}

/// Machine-readable summary: identifiers and counts only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    timestamp: String,
    mode: RunMode,
    scope: &'a str,
    status: RunStatus,
    operation_count: usize,
    unmapped_count: usize,
    change_stats: ChangeStats,
    error_count: usize,
    todo_count: usize,
}

/// `SUCCESS`, `PARTIAL SUCCESS` or `FAILED`
pub fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "SUCCESS",
        RunStatus::Partial => "PARTIAL SUCCESS",
        RunStatus::Failed => "FAILED",
    }
}

fn status_sentence(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "Code generation completed successfully.",
        RunStatus::Partial => {
            "Code generation completed with some errors. Please review the errors section."
        }
        RunStatus::Failed => "Code generation failed. Please check the errors and try again.",
    }
}

/// `Codegen_Report_{mode}_{scope}_{yyyyMMdd_HHmmss}.md`
pub fn report_file_name(mode: RunMode, scope: &Scope, at: DateTime<Local>) -> String {
    format!("Codegen_Report_{mode}_{scope}_{}.md", at.format(FILE_STAMP))
}

/// `codegen-summary-{yyyyMMdd_HHmmss}.json`
pub fn summary_file_name(at: DateTime<Local>) -> String {
    format!("codegen-summary-{}.json", at.format(FILE_STAMP))
}

/// Byte count as `N bytes`, `N KB` or `N MB`, rounded down.
pub fn display_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    match bytes {
        b if b >= MB => format!("{} MB", b / MB),
        b if b >= KB => format!("{} KB", b / KB),
        b => format!("{b} bytes"),
    }
}

fn config_rows(plan: &RunPlan) -> Vec<ConfigRow> {
    let mut rows = vec![
        ConfigRow {
            name: "Mode",
            value: plan.mode.to_string(),
        },
        ConfigRow {
            name: "Scope",
            value: plan.scope.to_string(),
        },
        ConfigRow {
            name: "Project Root",
            value: plan.project_root.display().to_string(),
        },
        ConfigRow {
            name: "Dry Run",
            value: plan.dry_run.to_string(),
        },
    ];
    match &plan.scope {
        Scope::Tags(tags) => rows.push(ConfigRow {
            name: "Selected Tags",
            value: tags.join(", "),
        }),
        Scope::Operations(ids) => rows.push(ConfigRow {
            name: "Selected Operations",
            value: ids.join(", "),
        }),
        Scope::All => {}
    }
    rows
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Run-specific follow-ups first, then the standing checklist.
fn checklist(mode: RunMode, todos: &[String]) -> Vec<String> {
    let extras: &[&str] = if mode.is_migrate() { MIGRATE_TODOS } else { &[] };
    todos
        .iter()
        .cloned()
        .chain(DEFAULT_TODOS.iter().chain(extras).map(|t| t.to_string()))
        .collect()
}

/// Renders and writes the report files of one run.
pub struct ReportBuilder<'e> {
    encoder: &'e ReportEncoder,
    report_dir: PathBuf,
}

impl<'e> ReportBuilder<'e> {
    pub fn new(encoder: &'e ReportEncoder, report_dir: impl Into<PathBuf>) -> Self {
        ReportBuilder {
            encoder,
            report_dir: report_dir.into(),
        }
    }

    pub fn template(&self, input: &ReportInput<'_>) -> EngineResult<ReportTemplate> {
        let layout_json = match input.layout {
            Some(layout) => self.encoder.encode(layout)?,
            None => String::new(),
        };
        let result = input.result;
        Ok(ReportTemplate {
            generated: input.started_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            config_rows: config_rows(input.plan),
            specs: input
                .catalogs
                .iter()
                .map(|catalog| {
                    let meta = catalog.metadata();
                    SpecView {
                        label: catalog.label().to_string(),
                        path: meta.source.clone(),
                        title: meta.title.clone(),
                        size: display_size(meta.size_bytes),
                        hash: format!("{}...", meta.fingerprint),
                        version: meta.version.clone(),
                    }
                })
                .collect(),
            has_layout: input.layout.is_some(),
            layout_json,
            mappings: result
                .operation_mappings
                .iter()
                .map(|m| MappingRow {
                    legacy: m.legacy_operation.clone().unwrap_or_else(|| "N/A".to_string()),
                    target: m.target_operation.clone(),
                    tag: m.tag.clone(),
                })
                .collect(),
            created: display_paths(&result.changes.created),
            updated: display_paths(&result.changes.updated),
            deleted: display_paths(&result.changes.deleted),
            errors: result.errors.clone(),
            todos: checklist(input.plan.mode, &result.todos),
            status_label: status_label(input.status),
            summary: status_sentence(input.status),
        })
    }

    /// The Markdown report, ending with a newline.
    pub fn render(&self, input: &ReportInput<'_>) -> EngineResult<String> {
        let mut markdown = self.template(input)?.render()?;
        if !markdown.ends_with('\n') {
            markdown.push('\n');
        }
        Ok(markdown)
    }

    /// The JSON summary.
    pub fn summary(&self, input: &ReportInput<'_>) -> EngineResult<String> {
        let result = input.result;
        let summary = RunSummary {
            timestamp: input.started_at.format(FILE_STAMP).to_string(),
            mode: input.plan.mode,
            scope: input.plan.scope.as_str(),
            status: input.status,
            operation_count: result.operation_mappings.len(),
            unmapped_count: result
                .operation_mappings
                .iter()
                .filter(|m| m.legacy_operation.is_none())
                .count(),
            change_stats: ChangeStats {
                created: result.changes.created.len(),
                updated: result.changes.updated.len(),
                deleted: result.changes.deleted.len(),
            },
            error_count: result.errors.len(),
            todo_count: result.todos.len(),
        };
        self.encoder.encode(&summary)
    }

    /// Render both files and, unless `dry_run`, write them.
    ///
    /// Returns the report path when it was written. Rendering errors are
    /// returned; write errors are logged and yield `Ok(None)`.
    pub fn publish(&self, input: &ReportInput<'_>, dry_run: bool) -> EngineResult<Option<PathBuf>> {
        let markdown = self.render(input)?;
        let summary = self.summary(input)?;
        if dry_run {
            info!(dir = %self.report_dir.display(), "dry-run: report rendered, not written");
            return Ok(None);
        }

        let report_path = self.report_dir.join(report_file_name(
            input.plan.mode,
            &input.plan.scope,
            input.started_at,
        ));
        let summary_path = self.report_dir.join(summary_file_name(input.started_at));
        match write_pair(&report_path, &markdown, &summary_path, &summary) {
            Ok(()) => {
                info!(path = %report_path.display(), "wrote run report");
                Ok(Some(report_path))
            }
            Err(err) => {
                let err = EngineError::Report(err.to_string());
                warn!(error = %err, "report not written");
                Ok(None)
            }
        }
    }
}

fn write_pair(report: &Path, markdown: &str, summary: &Path, json: &str) -> std::io::Result<()> {
    if let Some(parent) = report.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(report, markdown)?;
    fs::write(summary, format!("{json}\n"))
}
