//! # Layout Detection
//!
//! Infers where generated sources belong in an existing Spring project: the
//! base package plus one package per artifact category.
//!
//! ## Base package
//!
//! Chosen by the first rule that yields a result:
//!
//! 1. exactly one file carries an application entry marker
//!    (`@SpringBootApplication`, `@EnableAutoConfiguration`): its package;
//! 2. the package with the most component markers (`@Service`,
//!    `@RestController`, ...);
//! 3. the shortest package prefix shared by at least half of all packages.
//!
//! ## Category packages
//!
//! For each [`Category`], a direct child of the base named after one of its
//! conventional fragments wins; otherwise the child holding most of the
//! category's markers; otherwise `{base}.{category}`.

use crate::error::{EngineError, EngineResult};
use crate::generator::package_case;
use crate::syntax::CompilationUnit;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Annotations that mark the application entry point.
pub const ENTRY_MARKERS: &[&str] = &["SpringBootApplication", "EnableAutoConfiguration"];

/// Framework stereotypes counted when no entry point is unique.
pub const COMPONENT_MARKERS: &[&str] = &[
    "SpringBootApplication",
    "Component",
    "Service",
    "Controller",
    "RestController",
    "Repository",
    "Configuration",
];

/// File name of the persisted detection result.
pub const LAYOUT_FILE: &str = "detected-layout.json";

/// Kind of artifact a package holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    DataTypes,
    Client,
    Service,
    Endpoint,
    Mapper,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::DataTypes,
        Category::Client,
        Category::Service,
        Category::Endpoint,
        Category::Mapper,
    ];

    /// Default child package name.
    pub fn name(self) -> &'static str {
        match self {
            Category::DataTypes => "dto",
            Category::Client => "client",
            Category::Service => "service",
            Category::Endpoint => "controller",
            Category::Mapper => "mapper",
        }
    }

    /// Conventional child package names, in preference order.
    pub fn fragments(self) -> &'static [&'static str] {
        match self {
            Category::DataTypes => &["dto", "dtos", "model", "models", "domain", "entity", "entities"],
            Category::Client => &["client", "clients", "integration", "external"],
            Category::Service => &["service", "services", "business", "logic"],
            Category::Endpoint => &["controller", "controllers", "web", "rest", "api"],
            Category::Mapper => &["mapper", "mappers", "mapping", "converter", "converters"],
        }
    }

    /// Annotations that identify a file of this category.
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Category::DataTypes => &["Entity", "Data"],
            Category::Client => &["FeignClient"],
            Category::Service => &["Service"],
            Category::Endpoint => &["Controller", "RestController"],
            Category::Mapper => &["Mapper"],
        }
    }
}

/// Packages generated artifacts are placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLayout {
    pub base_package: String,
    pub data_types: String,
    pub client: String,
    pub service: String,
    pub endpoint: String,
    pub mapper: String,
    pub error: String,
}

impl DetectedLayout {
    /// Layout with every category at its default child of `base`.
    pub fn with_defaults(base: &str) -> Self {
        let child = |c: Category| format!("{base}.{}", c.name());
        DetectedLayout {
            base_package: base.to_string(),
            data_types: child(Category::DataTypes),
            client: child(Category::Client),
            service: child(Category::Service),
            endpoint: child(Category::Endpoint),
            mapper: child(Category::Mapper),
            error: format!("{base}.error"),
        }
    }

    pub fn package(&self, category: Category) -> &str {
        match category {
            Category::DataTypes => &self.data_types,
            Category::Client => &self.client,
            Category::Service => &self.service,
            Category::Endpoint => &self.endpoint,
            Category::Mapper => &self.mapper,
        }
    }

    fn package_mut(&mut self, category: Category) -> &mut String {
        match category {
            Category::DataTypes => &mut self.data_types,
            Category::Client => &mut self.client,
            Category::Service => &mut self.service,
            Category::Endpoint => &mut self.endpoint,
            Category::Mapper => &mut self.mapper,
        }
    }

    /// `{category package}.{tag}` for tag-grouped artifacts.
    pub fn tag_package(&self, category: Category, tag: &str) -> String {
        format!("{}.{}", self.package(category), package_case(tag))
    }

    /// Reject a blank base or any blank category package.
    pub fn validate(&self, root: &Path) -> EngineResult<()> {
        let blank = |reason: String| EngineError::LayoutUndetectable {
            root: root.to_path_buf(),
            reason,
        };
        if self.base_package.trim().is_empty() {
            return Err(blank("base package is blank".to_string()));
        }
        for category in Category::ALL {
            if self.package(category).trim().is_empty() {
                return Err(blank(format!("{} package is blank", category.name())));
            }
        }
        Ok(())
    }
}

/// Package and type-level annotations of one scanned source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub annotations: BTreeSet<String>,
}

impl SourceFile {
    /// Read package and top-level type annotations from Java source text.
    pub fn parse(path: PathBuf, content: &str) -> Self {
        let unit = CompilationUnit::parse(content);
        let annotations = unit
            .types()
            .flat_map(|t| t.annotations().map(|a| a.simple_name().to_string()))
            .collect();
        SourceFile {
            path,
            package: unit.package().unwrap_or_default().to_string(),
            annotations,
        }
    }

    fn has_any(&self, markers: &[&str]) -> bool {
        markers.iter().any(|m| self.annotations.contains(*m))
    }

    fn count(&self, markers: &[&str]) -> usize {
        markers
            .iter()
            .filter(|m| self.annotations.contains(**m))
            .count()
    }
}

/// Directory scanned for sources: `{root}/{source_dir}` or the root itself.
pub fn source_root(project_root: &Path, source_dir: &Path) -> PathBuf {
    let candidate = project_root.join(source_dir);
    if candidate.is_dir() {
        candidate
    } else {
        project_root.to_path_buf()
    }
}

/// Every readable `.java` file below `dir`, in path order.
pub fn scan_sources(dir: &Path) -> Vec<SourceFile> {
    let mut files: Vec<SourceFile> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
        .filter_map(|e| match fs::read_to_string(e.path()) {
            Ok(content) => Some(SourceFile::parse(e.path().to_path_buf(), &content)),
            Err(err) => {
                warn!(path = %e.path().display(), error = %err, "skipping unreadable source");
                None
            }
        })
        .collect();
    files.retain(|f| !f.package.is_empty());
    files
}

/// Detects the package layout of a project tree.
#[derive(Debug, Clone)]
pub struct LayoutDetector {
    source_dir: PathBuf,
}

impl LayoutDetector {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        LayoutDetector {
            source_dir: source_dir.into(),
        }
    }

    /// Scan `project_root` and infer its layout.
    ///
    /// # Errors
    ///
    /// [`EngineError::LayoutUndetectable`] when no packaged Java file exists or
    /// no base package can be chosen.
    pub fn detect(&self, project_root: &Path) -> EngineResult<DetectedLayout> {
        let dir = source_root(project_root, &self.source_dir);
        let files = scan_sources(&dir);
        info!(dir = %dir.display(), files = files.len(), "scanned project sources");
        let layout = detect_from_sources(&files).ok_or_else(|| EngineError::LayoutUndetectable {
            root: project_root.to_path_buf(),
            reason: if files.is_empty() {
                format!("no Java sources with a package declaration under {}", dir.display())
            } else {
                "no entry point, component marker or common package prefix".to_string()
            },
        })?;
        layout.validate(project_root)?;
        info!(base = %layout.base_package, "detected project layout");
        Ok(layout)
    }
}

/// Infer the layout from already scanned files.
pub fn detect_from_sources(files: &[SourceFile]) -> Option<DetectedLayout> {
    let base = choose_base(files)?;
    let mut layout = DetectedLayout::with_defaults(&base);
    for category in Category::ALL {
        if let Some(found) = locate_category(files, &base, category) {
            *layout.package_mut(category) = found;
        }
    }
    Some(layout)
}

fn choose_base(files: &[SourceFile]) -> Option<String> {
    let entries: Vec<&SourceFile> = files.iter().filter(|f| f.has_any(ENTRY_MARKERS)).collect();
    if let [entry] = entries.as_slice() {
        debug!(package = %entry.package, "base from application entry point");
        return Some(entry.package.clone());
    }

    let mut density: BTreeMap<&str, usize> = BTreeMap::new();
    for file in files {
        *density.entry(&file.package).or_default() += file.count(COMPONENT_MARKERS);
    }
    if let Some((package, _)) = best(density.into_iter()) {
        debug!(package, "base from component marker density");
        return Some(package.to_string());
    }

    let packages: BTreeSet<&str> = files.iter().map(|f| f.package.as_str()).collect();
    let mut prefixes: BTreeMap<String, usize> = BTreeMap::new();
    for package in &packages {
        let parts: Vec<&str> = package.split('.').collect();
        for len in 1..parts.len() {
            *prefixes.entry(parts[..len].join(".")).or_default() += 1;
        }
    }
    let prefix = prefixes
        .into_iter()
        .filter(|(_, count)| count * 2 >= packages.len())
        .min_by(|(a, _), (b, _)| a.split('.').count().cmp(&b.split('.').count()).then(a.cmp(b)))
        .map(|(prefix, _)| prefix);
    if let Some(prefix) = &prefix {
        debug!(prefix = %prefix, "base from common package prefix");
    }
    prefix
}

/// Highest positive count; ties go to the shorter, then lexically smaller key.
fn best<'a>(counts: impl Iterator<Item = (&'a str, usize)>) -> Option<(&'a str, usize)> {
    counts.filter(|(_, count)| *count > 0).max_by(|(a, ca), (b, cb)| {
        ca.cmp(cb)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| b.cmp(a))
    })
}

fn locate_category(files: &[SourceFile], base: &str, category: Category) -> Option<String> {
    let prefix = format!("{base}.");
    let child_of = |package: &str| -> Option<String> {
        package
            .strip_prefix(&prefix)
            .and_then(|rest| rest.split('.').next())
            .map(str::to_string)
    };
    let children: BTreeSet<String> = files.iter().filter_map(|f| child_of(&f.package)).collect();

    if let Some(fragment) = category
        .fragments()
        .iter()
        .find(|fragment| children.contains(**fragment))
    {
        return Some(format!("{base}.{fragment}"));
    }

    let mut density: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        if let Some(child) = child_of(&file.package) {
            *density.entry(child).or_default() += file.count(category.markers());
        }
    }
    best(density.iter().map(|(k, v)| (k.as_str(), *v))).map(|(child, _)| format!("{base}.{child}"))
}

/// Best-effort write of the layout next to the project; failures only warn.
pub fn persist_layout(project_root: &Path, layout: &DetectedLayout) {
    let path = project_root.join(LAYOUT_FILE);
    let written = serde_json::to_string_pretty(layout)
        .map_err(std::io::Error::other)
        .and_then(|json| fs::write(&path, json + "\n"));
    match written {
        Ok(()) => debug!(path = %path.display(), "persisted detected layout"),
        Err(err) => warn!(path = %path.display(), error = %err, "could not persist detected layout"),
    }
}

#[cfg(test)]
mod tests;
