//! # Engine Settings
//!
//! Optional per-project settings read from `specforge.toml` in the project
//! root, plus environment overrides.
//!
//! ## File format
//!
//! ```toml
//! source_dir = "src/main/java"
//! output_dir = "build/generated/java"   # defaults to source_dir
//! report_dir = "reports"                # defaults to the project root
//! route_prefix = "/api"
//!
//! [client]
//! base_url_property = "specforge.client.base-url"
//! base_url_default = "http://localhost:8080"
//! timeout = "PT30S"
//! max_retries = 3
//! ```
//!
//! ## Environment Variables
//!
//! - `SPECFORGE_SOURCE_DIR` overrides `source_dir`
//! - `SPECFORGE_OUTPUT_DIR` overrides `output_dir`
//! - `SPECFORGE_REPORT_DIR` overrides `report_dir`
//!
//! Relative directories resolve against the project root.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// File name looked up in the project root.
pub const SETTINGS_FILE: &str = "specforge.toml";

/// Settings of the generated outbound clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Spring property holding the upstream base URL.
    pub base_url_property: String,
    pub base_url_default: String,
    /// ISO-8601 duration of the overall call timeout.
    pub timeout: String,
    pub max_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            base_url_property: "specforge.client.base-url".to_string(),
            base_url_default: "http://localhost:8080".to_string(),
            timeout: "PT30S".to_string(),
            max_retries: 3,
        }
    }
}

impl ClientSettings {
    /// Sibling property of the base URL: `specforge.client.timeout` for
    /// `specforge.client.base-url`.
    fn sibling_property(&self, key: &str) -> String {
        match self.base_url_property.rsplit_once('.') {
            Some((prefix, _)) => format!("{prefix}.{key}"),
            None => format!("{}.{key}", self.base_url_property),
        }
    }

    /// `${property:default}` for the base URL.
    pub fn base_url_placeholder(&self) -> String {
        format!("${{{}:{}}}", self.base_url_property, self.base_url_default)
    }

    pub fn timeout_placeholder(&self) -> String {
        format!("${{{}:{}}}", self.sibling_property("timeout"), self.timeout)
    }

    pub fn max_retries_placeholder(&self) -> String {
        format!("${{{}:{}}}", self.sibling_property("max-retries"), self.max_retries)
    }
}

/// Where sources are read from and written to, and how artifacts are shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub source_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub route_prefix: String,
    pub client: ClientSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            source_dir: PathBuf::from("src/main/java"),
            output_dir: None,
            report_dir: None,
            route_prefix: "/api".to_string(),
            client: ClientSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Read `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist and an error when it
    /// exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: EngineSettings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        Ok(Some(settings))
    }

    /// Settings for `project_root`: the settings file if present, else
    /// defaults, then environment overrides.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let mut settings = Self::from_file(&project_root.join(SETTINGS_FILE))?.unwrap_or_default();
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    /// Apply `SPECFORGE_*_DIR` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        if let Some(dir) = non_empty("SPECFORGE_SOURCE_DIR") {
            self.source_dir = dir;
        }
        if let Some(dir) = non_empty("SPECFORGE_OUTPUT_DIR") {
            self.output_dir = Some(dir);
        }
        if let Some(dir) = non_empty("SPECFORGE_REPORT_DIR") {
            self.report_dir = Some(dir);
        }
    }

    /// Root generated sources are written below.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.output_dir.as_ref().unwrap_or(&self.source_dir))
    }

    /// Directory reports are written to.
    pub fn report_root(&self, project_root: &Path) -> PathBuf {
        match &self.report_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineSettings::from_file(&dir.path().join(SETTINGS_FILE))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            "route_prefix = \"/v2\"\n\n[client]\nmax_retries = 5\n",
        )
        .unwrap();
        let settings = EngineSettings::from_file(&path).unwrap().unwrap();
        assert_eq!(settings.route_prefix, "/v2");
        assert_eq!(settings.source_dir, PathBuf::from("src/main/java"));
        assert_eq!(settings.client.max_retries, 5);
        assert_eq!(settings.client.timeout, "PT30S");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "route_prefix = [").unwrap();
        let err = EngineSettings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings"));
    }

    #[test]
    fn test_overrides_and_roots() {
        let vars: HashMap<&str, &str> = [
            ("SPECFORGE_OUTPUT_DIR", "generated"),
            ("SPECFORGE_REPORT_DIR", ""),
        ]
        .into_iter()
        .collect();
        let mut settings = EngineSettings::default();
        settings.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        let root = Path::new("/project");
        assert_eq!(settings.output_root(root), PathBuf::from("/project/generated"));
        assert_eq!(settings.report_root(root), PathBuf::from("/project"));
        assert_eq!(
            EngineSettings::default().output_root(root),
            PathBuf::from("/project/src/main/java")
        );
    }

    #[test]
    fn test_client_placeholders() {
        let client = ClientSettings::default();
        assert_eq!(
            client.base_url_placeholder(),
            "${specforge.client.base-url:http://localhost:8080}"
        );
        assert_eq!(client.timeout_placeholder(), "${specforge.client.timeout:PT30S}");
        assert_eq!(client.max_retries_placeholder(), "${specforge.client.max-retries:3}");
    }
}
