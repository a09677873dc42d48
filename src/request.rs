//! Run invocation contract: what a caller asks for and what it gets back.
//!
//! [`RunRequest`] is the loosely typed wire form (strings, optional paths).
//! [`RunRequest::validate`] turns it into a [`RunPlan`] or fails with
//! [`EngineError::FatalConfig`] before any work starts.

use crate::error::{EngineError, EngineResult};
use crate::layout::DetectedLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_BACKUP_LABEL: &str = "backup/specforge-migration";

fn default_scope() -> String {
    "all".to_string()
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_backup_label() -> String {
    DEFAULT_BACKUP_LABEL.to_string()
}

/// A run as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub mode: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "operations")]
    pub operation_ids: Vec<String>,
    #[serde(default)]
    pub legacy_spec_path: Option<String>,
    #[serde(default)]
    pub target_spec_path: Option<String>,
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    #[serde(default = "default_backup_label", alias = "backupBranch")]
    pub backup_label: String,
    #[serde(default)]
    pub dry_run: bool,
}

impl RunRequest {
    /// A request with the documented defaults for everything but the mode.
    pub fn new(mode: impl Into<String>) -> Self {
        RunRequest {
            mode: mode.into(),
            scope: default_scope(),
            tags: Vec::new(),
            operation_ids: Vec::new(),
            legacy_spec_path: None,
            target_spec_path: None,
            project_root: default_project_root(),
            backup_label: default_backup_label(),
            dry_run: false,
        }
    }

    /// Check mode/scope/path combinations and build the plan.
    ///
    /// # Errors
    ///
    /// [`EngineError::FatalConfig`] naming the first rule that failed.
    pub fn validate(&self) -> EngineResult<RunPlan> {
        let invalid = |reason: &str| EngineError::FatalConfig(reason.to_string());

        let mode = RunMode::parse(&self.mode)
            .ok_or_else(|| invalid("mode must be 'migrate' or 'scaffold'"))?;

        let scope = match self.scope.trim().to_ascii_lowercase().as_str() {
            "all" => Scope::All,
            "tags" => {
                let tags = non_blank(&self.tags);
                if tags.is_empty() {
                    return Err(invalid("tags must be specified when scope is 'tags'"));
                }
                Scope::Tags(tags)
            }
            "operations" | "operationids" => {
                let ids = non_blank(&self.operation_ids);
                if ids.is_empty() {
                    return Err(invalid(
                        "operations must be specified when scope is 'operations'",
                    ));
                }
                Scope::Operations(ids)
            }
            _ => return Err(invalid("scope must be 'all', 'tags' or 'operations'")),
        };

        let target_spec = present(&self.target_spec_path)
            .ok_or_else(|| invalid("targetSpecPath is required"))?;
        let legacy_spec = present(&self.legacy_spec_path);
        match (mode, &legacy_spec) {
            (RunMode::Migrate, None) => {
                return Err(invalid("legacySpecPath is required in migrate mode"))
            }
            (RunMode::Scaffold, Some(_)) => {
                return Err(invalid("legacySpecPath is only accepted in migrate mode"))
            }
            _ => {}
        }

        let backup_label = match self.backup_label.trim() {
            "" => default_backup_label(),
            label => label.to_string(),
        };

        Ok(RunPlan {
            mode,
            scope,
            legacy_spec,
            target_spec,
            project_root: self.project_root.clone(),
            backup_label,
            dry_run: self.dry_run,
        })
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Whether the run converts a legacy integration or scaffolds a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Migrate,
    Scaffold,
}

impl RunMode {
    /// Accepts the current names and the older `upgrade`/`create` aliases.
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "migrate" | "upgrade" => Some(RunMode::Migrate),
            "scaffold" | "create" => Some(RunMode::Scaffold),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Migrate => "migrate",
            RunMode::Scaffold => "scaffold",
        }
    }

    pub fn is_migrate(self) -> bool {
        self == RunMode::Migrate
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which target operations a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Tags(Vec<String>),
    Operations(Vec<String>),
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Tags(_) => "tags",
            Scope::Operations(_) => "operations",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub mode: RunMode,
    pub scope: Scope,
    /// Set exactly when `mode` is [`RunMode::Migrate`].
    pub legacy_spec: Option<String>,
    pub target_spec: String,
    pub project_root: PathBuf,
    pub backup_label: String,
    pub dry_run: bool,
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    /// Success without errors, partial when something still completed.
    pub fn determine(error_count: usize, completed_units: usize) -> Self {
        match (error_count, completed_units) {
            (0, _) => RunStatus::Success,
            (_, 0) => RunStatus::Failed,
            _ => RunStatus::Partial,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Partial => 2,
            RunStatus::Failed => 1,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        })
    }
}

/// A target operation and the legacy operation it replaces, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMapping {
    #[serde(rename = "legacy")]
    pub legacy_operation: Option<String>,
    #[serde(rename = "target")]
    pub target_operation: String,
    pub tag: String,
}

/// Files a run created, updated or deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl FileChanges {
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

/// What a run returns to its caller. Absent fields are omitted from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub status: RunStatus,
    pub mode: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_types_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper_package: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation_mappings: Vec<OperationMapping>,
    #[serde(default)]
    pub changes: FileChanges,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub todos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    /// Set only when a fatal error stopped the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResponse {
    /// An empty response echoing `mode` and `scope`.
    pub fn new(status: RunStatus, mode: impl Into<String>, scope: impl Into<String>) -> Self {
        RunResponse {
            status,
            mode: mode.into(),
            scope: scope.into(),
            base_package: None,
            endpoint_package: None,
            service_package: None,
            data_types_package: None,
            client_package: None,
            mapper_package: None,
            operation_mappings: Vec::new(),
            changes: FileChanges::default(),
            todos: Vec::new(),
            errors: Vec::new(),
            report_path: None,
            error: None,
        }
    }

    /// A failed response carrying a single fatal error.
    pub fn fatal(mode: impl Into<String>, scope: impl Into<String>, error: &EngineError) -> Self {
        let message = error.to_string();
        let mut response = RunResponse::new(RunStatus::Failed, mode, scope);
        response.errors.push(message.clone());
        response.error = Some(message);
        response
    }

    /// Copy the detected packages into the response.
    pub fn with_layout(mut self, layout: &DetectedLayout) -> Self {
        self.base_package = Some(layout.base_package.clone());
        self.endpoint_package = Some(layout.endpoint.clone());
        self.service_package = Some(layout.service.clone());
        self.data_types_package = Some(layout.data_types.clone());
        self.client_package = Some(layout.client.clone());
        self.mapper_package = Some(layout.mapper.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> RunRequest {
        serde_json::from_value(value).unwrap()
    }

    fn reason(req: &RunRequest) -> String {
        req.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_defaults() {
        let req = request(json!({"mode": "scaffold", "targetSpecPath": "bundled:target-gateway.yaml"}));
        assert_eq!(req.scope, "all");
        assert_eq!(req.project_root, PathBuf::from("."));
        assert_eq!(req.backup_label, DEFAULT_BACKUP_LABEL);
        assert!(!req.dry_run);

        let plan = req.validate().unwrap();
        assert_eq!(plan.mode, RunMode::Scaffold);
        assert_eq!(plan.scope, Scope::All);
        assert_eq!(plan.legacy_spec, None);
    }

    #[test]
    fn test_aliases() {
        let req = request(json!({
            "mode": "upgrade",
            "scope": "operationIds",
            "operations": ["processPayment"],
            "legacySpecPath": "legacy.yaml",
            "targetSpecPath": "target.yaml",
            "backupBranch": "backup/x"
        }));
        let plan = req.validate().unwrap();
        assert_eq!(plan.mode, RunMode::Migrate);
        assert_eq!(plan.scope, Scope::Operations(vec!["processPayment".into()]));
        assert_eq!(plan.backup_label, "backup/x");
        assert_eq!(RunMode::parse("create"), Some(RunMode::Scaffold));
    }

    #[test]
    fn test_invalid_combinations() {
        let mut req = RunRequest::new("rebuild");
        req.target_spec_path = Some("t.yaml".into());
        assert_eq!(reason(&req), "Invalid request: mode must be 'migrate' or 'scaffold'");

        req.mode = "scaffold".into();
        req.scope = "tags".into();
        req.tags = vec!["  ".into()];
        assert_eq!(reason(&req), "Invalid request: tags must be specified when scope is 'tags'");

        req.scope = "operations".into();
        assert!(reason(&req).contains("operations must be specified"));

        req.scope = "everything".into();
        assert!(reason(&req).contains("scope must be"));

        req.scope = "all".into();
        req.target_spec_path = None;
        assert_eq!(reason(&req), "Invalid request: targetSpecPath is required");

        req.target_spec_path = Some("t.yaml".into());
        req.mode = "migrate".into();
        assert!(reason(&req).contains("legacySpecPath is required"));

        req.mode = "scaffold".into();
        req.legacy_spec_path = Some("l.yaml".into());
        assert!(reason(&req).contains("only accepted in migrate mode"));
    }

    #[test]
    fn test_validation_errors_are_fatal() {
        let err = RunRequest::new("scaffold").validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_status_determination() {
        assert_eq!(RunStatus::determine(0, 0), RunStatus::Success);
        assert_eq!(RunStatus::determine(1, 2), RunStatus::Partial);
        assert_eq!(RunStatus::determine(1, 0), RunStatus::Failed);
        assert_eq!(RunStatus::Partial.exit_code(), 2);
    }

    #[test]
    fn test_response_omits_absent_fields() {
        let response = RunResponse::new(RunStatus::Success, "scaffold", "all");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "mode": "scaffold",
                "scope": "all",
                "changes": {"created": [], "updated": [], "deleted": []}
            })
        );
    }

    #[test]
    fn test_mapping_serializes_short_keys() {
        let mapping = OperationMapping {
            legacy_operation: None,
            target_operation: "getTransaction".into(),
            tag: "Transactions".into(),
        };
        assert_eq!(
            serde_json::to_value(&mapping).unwrap(),
            json!({"legacy": null, "target": "getTransaction", "tag": "Transactions"})
        );
    }
}
