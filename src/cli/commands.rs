use crate::config::EngineSettings;
use crate::engine;
use crate::layout::LayoutDetector;
use crate::report::status_label;
use crate::request::{RunRequest, RunResponse, DEFAULT_BACKUP_LABEL};
use crate::spec::{load_spec, OperationCatalog};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for SpecForge
///
/// Generates Spring Boot integration code from OpenAPI specifications and
/// migrates legacy XML integrations to JSON.
#[derive(Parser)]
#[command(name = "specforge-gen")]
#[command(version, about = "SpecForge code generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate (and in migrate mode, migrate) code for a project
    Run(RunArgs),
    /// Print the detected package layout of a project as JSON
    Detect {
        /// Project root to scan
        #[arg(short, long, default_value = ".")]
        project_root: PathBuf,

        /// Source directory relative to the project root (overrides settings)
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },
    /// List the operations of a specification
    Inspect {
        /// Path to the OpenAPI specification (YAML or JSON) or `bundled:<name>`
        #[arg(short, long)]
        spec: String,

        /// Only list operations carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
}

/// Flags of the `run` command, one per request field.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// migrate (alias upgrade) or scaffold (alias create)
    #[arg(short, long, env = "SPECFORGE_MODE")]
    pub mode: String,

    /// all, tags or operations
    #[arg(long, default_value = "all")]
    pub scope: String,

    /// Tags to generate when scope is `tags` (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Operation ids to generate when scope is `operations`
    #[arg(long = "operations", value_delimiter = ',')]
    pub operation_ids: Vec<String>,

    /// Legacy specification, required in migrate mode
    #[arg(long, env = "SPECFORGE_LEGACY_SPEC")]
    pub legacy_spec: Option<String>,

    /// Target specification
    #[arg(long, env = "SPECFORGE_TARGET_SPEC")]
    pub target_spec: Option<String>,

    /// Root of the project to generate into
    #[arg(short, long, default_value = ".")]
    pub project_root: PathBuf,

    /// Name of the recovery branch created before migrating
    #[arg(long, default_value = DEFAULT_BACKUP_LABEL)]
    pub backup_label: String,

    /// Compute every change without writing files
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the run response as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl RunArgs {
    pub fn to_request(&self) -> RunRequest {
        RunRequest {
            mode: self.mode.clone(),
            scope: self.scope.clone(),
            tags: self.tags.clone(),
            operation_ids: self.operation_ids.clone(),
            legacy_spec_path: self.legacy_spec.clone(),
            target_spec_path: self.target_spec.clone(),
            project_root: self.project_root.clone(),
            backup_label: self.backup_label.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// Human-readable rendering of a run response.
pub fn describe_response(response: &RunResponse) -> String {
    let mut lines = vec![format!(
        "{} run ({} scope): {}",
        response.mode,
        response.scope,
        status_label(response.status)
    )];
    if let Some(base) = &response.base_package {
        lines.push(format!("base package: {base}"));
    }
    lines.push(format!(
        "files: {} created, {} updated, {} deleted",
        response.changes.created.len(),
        response.changes.updated.len(),
        response.changes.deleted.len()
    ));
    for mapping in &response.operation_mappings {
        lines.push(format!(
            "  {} <- {}",
            mapping.target_operation,
            mapping.legacy_operation.as_deref().unwrap_or("N/A")
        ));
    }
    for error in &response.errors {
        lines.push(format!("error: {error}"));
    }
    for todo in &response.todos {
        lines.push(format!("todo: {todo}"));
    }
    if let Some(path) = &response.report_path {
        lines.push(format!("report: {}", path.display()));
    }
    lines.join("\n")
}

/// Execute the CLI command and return the process exit code
///
/// `run` exits 0 on success, 2 on partial success and 1 on failure; the
/// other commands exit 0 unless they return an error.
///
/// # Errors
///
/// Returns an error if a specification cannot be loaded, a layout cannot be
/// detected or the output cannot be encoded.
pub fn run_cli(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Run(args) => {
            let response = engine::run(&args.to_request());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", describe_response(&response));
            }
            Ok(response.status.exit_code())
        }
        Commands::Detect {
            project_root,
            source_dir,
        } => {
            let mut settings = EngineSettings::load(&project_root)?;
            if let Some(dir) = source_dir {
                settings.source_dir = dir;
            }
            let layout = LayoutDetector::new(settings.source_dir)
                .detect(&project_root)
                .with_context(|| format!("Failed to detect layout of {}", project_root.display()))?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
            Ok(0)
        }
        Commands::Inspect { spec, tag } => {
            let catalog = OperationCatalog::new("inspect", load_spec(&spec)?);
            let meta = catalog.metadata();
            println!("{} {} ({} operations)", meta.title, meta.version, catalog.len());
            for line in inspect_lines(&catalog, tag.as_deref()) {
                println!("{line}");
            }
            Ok(0)
        }
    }
}

/// One line per operation: verb, path, id and tags.
pub fn inspect_lines(catalog: &OperationCatalog, tag: Option<&str>) -> Vec<String> {
    let operations = match tag {
        Some(tag) => catalog.find_by_tags(&[tag]),
        None => catalog.operations().iter().collect(),
    };
    operations
        .into_iter()
        .map(|op| {
            format!(
                "{:<7} {:<40} {} [{}]",
                op.method.as_upper(),
                op.path,
                op.id,
                op.tags.join(", ")
            )
        })
        .collect()
}
