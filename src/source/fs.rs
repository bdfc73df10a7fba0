//! Filesystem-backed codebase handle.
//!
//! Enumerates source files under a root directory and serves whole-file
//! text on demand. No function or class extraction happens here; files
//! scanned this way carry empty structural lists, and the per-scope
//! handles remain the job of the external accessor.

use super::{ClassSource, CodebaseSource, FileSource, FunctionSource};
use crate::core::Language;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file discovered on disk. Text is read lazily at metric time.
#[derive(Clone, Debug)]
pub struct FsFile {
    path: PathBuf,
}

impl FsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileSource for FsFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn source_text(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn classes(&self) -> Vec<&dyn ClassSource> {
        Vec::new()
    }

    fn functions(&self) -> Vec<&dyn FunctionSource> {
        Vec::new()
    }
}

/// A codebase rooted at a directory on disk
#[derive(Clone, Debug)]
pub struct FsCodebase {
    project_name: String,
    revision: Option<String>,
    files: Vec<FsFile>,
}

impl FsCodebase {
    /// Walk `root` and collect every file whose extension maps to a known
    /// language. Hidden directories are skipped.
    pub fn scan(root: impl AsRef<Path>, project_name: impl Into<String>) -> Result<Self> {
        let root = root.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_hidden(e.path()))
        {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if Language::from_path(entry.path()) != Language::Unknown {
                files.push(FsFile::new(entry.path()));
            }
        }

        log::debug!(
            "Scanned {} source files under {}",
            files.len(),
            root.display()
        );

        Ok(Self {
            project_name: project_name.into(),
            revision: None,
            files,
        })
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') && n.len() > 1)
        .unwrap_or(false)
}

impl CodebaseSource for FsCodebase {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn revision(&self) -> Option<String> {
        self.revision.clone()
    }

    fn files(&self) -> Result<Vec<&dyn FileSource>> {
        Ok(self.files.iter().map(|f| f as &dyn FileSource).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_directories_are_skipped() {
        assert!(is_hidden(Path::new("/repo/.git")));
        assert!(is_hidden(Path::new(".cache")));
        assert!(!is_hidden(Path::new("/repo/src")));
        assert!(!is_hidden(Path::new(".")));
    }
}
