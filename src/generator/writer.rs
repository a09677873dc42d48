use crate::error::EngineResult;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether a write produced a new file or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    Created,
    Updated,
}

/// A file a generator produced (or would have produced under dry-run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub change: FileChange,
}

/// Places generated sources under the output root and performs the writes.
///
/// In dry-run mode every path and classification is computed exactly as in a
/// real run, but nothing touches the file system.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_root: PathBuf,
    dry_run: bool,
}

impl ArtifactWriter {
    pub fn new(output_root: impl Into<PathBuf>, dry_run: bool) -> Self {
        ArtifactWriter {
            output_root: output_root.into(),
            dry_run,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// `{output_root}/{package as directories}/{class}.java`
    pub fn path_for(&self, package: &str, class: &str) -> PathBuf {
        let mut path = self.output_root.clone();
        path.extend(package.split('.').filter(|p| !p.is_empty()));
        path.push(format!("{class}.java"));
        path
    }

    /// Write a Java source for `class` in `package`.
    pub fn write_source(&self, package: &str, class: &str, content: &str) -> EngineResult<WrittenFile> {
        let path = self.path_for(package, class);
        self.write(path, content)
    }

    /// Write `content` to `path`, ending it with exactly one newline.
    pub fn write(&self, path: PathBuf, content: &str) -> EngineResult<WrittenFile> {
        let change = if path.exists() {
            FileChange::Updated
        } else {
            FileChange::Created
        };
        if self.dry_run {
            debug!(path = %path.display(), ?change, "dry-run: skipping write");
            return Ok(WrittenFile { path, change });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut body = content.trim_end().to_string();
        body.push('\n');
        fs::write(&path, body)?;
        info!(path = %path.display(), ?change, "wrote artifact");
        Ok(WrittenFile { path, change })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_package() {
        let writer = ArtifactWriter::new("/out", true);
        assert_eq!(
            writer.path_for("com.acme.dto.transactions", "PaymentRequest"),
            PathBuf::from("/out/com/acme/dto/transactions/PaymentRequest.java")
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), true);
        let written = writer.write_source("a.b", "C", "class C {}").unwrap();
        assert_eq!(written.change, FileChange::Created);
        assert!(!written.path.exists());
    }

    #[test]
    fn test_second_write_is_update() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), false);
        let first = writer.write_source("a.b", "C", "class C {}").unwrap();
        let second = writer.write_source("a.b", "C", "class C {}\n\n").unwrap();
        assert_eq!(first.change, FileChange::Created);
        assert_eq!(second.change, FileChange::Updated);
        assert_eq!(fs::read_to_string(&second.path).unwrap(), "class C {}\n");
    }
}
