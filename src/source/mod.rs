//! Structural source handles consumed by the metrics engine.
//!
//! The engine never parses source itself: callers hand it handles that can
//! name a scope, locate it, and produce its raw text. Function and class
//! extraction belongs to the external accessor; the handles here only carry
//! what that layer already found. Source text retrieval is fallible, and
//! the engine degrades to a warning when it fails.

pub mod fs;

use crate::core::Language;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// A function or method scope
pub trait FunctionSource: Send + Sync {
    fn name(&self) -> &str;
    fn file_path(&self) -> &Path;
    fn start_line(&self) -> usize;
    fn end_line(&self) -> usize;
    /// Raw text of the function body, including the signature line
    fn source_text(&self) -> Result<String>;
    fn parameter_count(&self) -> Option<usize> {
        None
    }
    fn nesting_depth(&self) -> Option<u32> {
        None
    }
    /// Flags and counts below come from the external pattern engines
    /// that extracted this scope; absent hints leave the metric fields
    /// at their defaults
    fn is_recursive(&self) -> Option<bool> {
        None
    }
    fn is_dead(&self) -> Option<bool> {
        None
    }
    fn has_unused_params(&self) -> Option<bool> {
        None
    }
    fn call_site_count(&self) -> Option<usize> {
        None
    }
    fn dependency_count(&self) -> Option<usize> {
        None
    }
}

/// A class or type-declaration scope
pub trait ClassSource: Send + Sync {
    fn name(&self) -> &str;
    fn file_path(&self) -> &Path;
    fn start_line(&self) -> usize;
    fn end_line(&self) -> usize;
    /// Raw text of the whole class body, methods included
    fn source_text(&self) -> Result<String>;
    /// Declared base-type names, in declaration order
    fn base_types(&self) -> Vec<String> {
        Vec::new()
    }
    fn attribute_count(&self) -> Option<usize> {
        None
    }
    fn methods(&self) -> Vec<&dyn FunctionSource>;
}

/// One source file
pub trait FileSource: Send + Sync {
    fn path(&self) -> &Path;
    /// Explicit language id; when absent the engine derives one from the
    /// file extension
    fn language(&self) -> Option<Language> {
        None
    }
    fn source_text(&self) -> Result<String>;
    fn classes(&self) -> Vec<&dyn ClassSource>;
    /// Free functions, excluding methods already owned by a class
    fn functions(&self) -> Vec<&dyn FunctionSource>;
    fn import_count(&self) -> Option<usize> {
        None
    }
    fn global_var_count(&self) -> Option<usize> {
        None
    }
    fn interface_count(&self) -> Option<usize> {
        None
    }
    fn is_test_file(&self) -> Option<bool> {
        None
    }
    fn test_coverage_estimate(&self) -> Option<f64> {
        None
    }
}

/// A whole project
pub trait CodebaseSource: Send + Sync {
    fn project_name(&self) -> &str;
    fn revision(&self) -> Option<String> {
        None
    }
    /// Enumerate the project's files. Failure here is the one fault that
    /// aborts a run.
    fn files(&self) -> Result<Vec<&dyn FileSource>>;
}

/// In-memory function handle, the standard carrier for pre-extracted scopes
#[derive(Clone, Debug)]
pub struct InMemoryFunction {
    pub name: String,
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub source: String,
    pub parameter_count: Option<usize>,
    pub nesting_depth: Option<u32>,
    pub is_recursive: Option<bool>,
    pub is_dead: Option<bool>,
    pub has_unused_params: Option<bool>,
    pub call_site_count: Option<usize>,
    pub dependency_count: Option<usize>,
}

impl InMemoryFunction {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let source = source.into();
        let end_line = source.lines().count().max(1);
        Self {
            name: name.into(),
            file: file.into(),
            start_line: 1,
            end_line,
            source,
            parameter_count: None,
            nesting_depth: None,
            is_recursive: None,
            is_dead: None,
            has_unused_params: None,
            call_site_count: None,
            dependency_count: None,
        }
    }

    pub fn with_lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = Some(count);
        self
    }

    pub fn marked_dead(mut self) -> Self {
        self.is_dead = Some(true);
        self
    }

    pub fn marked_recursive(mut self) -> Self {
        self.is_recursive = Some(true);
        self
    }
}

impl FunctionSource for InMemoryFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> &Path {
        &self.file
    }

    fn start_line(&self) -> usize {
        self.start_line
    }

    fn end_line(&self) -> usize {
        self.end_line
    }

    fn source_text(&self) -> Result<String> {
        Ok(self.source.clone())
    }

    fn parameter_count(&self) -> Option<usize> {
        self.parameter_count
    }

    fn nesting_depth(&self) -> Option<u32> {
        self.nesting_depth
    }

    fn is_recursive(&self) -> Option<bool> {
        self.is_recursive
    }

    fn is_dead(&self) -> Option<bool> {
        self.is_dead
    }

    fn has_unused_params(&self) -> Option<bool> {
        self.has_unused_params
    }

    fn call_site_count(&self) -> Option<usize> {
        self.call_site_count
    }

    fn dependency_count(&self) -> Option<usize> {
        self.dependency_count
    }
}

/// In-memory class handle
#[derive(Clone, Debug)]
pub struct InMemoryClass {
    pub name: String,
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub source: String,
    pub base_types: Vec<String>,
    pub attribute_count: Option<usize>,
    pub methods: Vec<InMemoryFunction>,
}

impl InMemoryClass {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let source = source.into();
        let end_line = source.lines().count().max(1);
        Self {
            name: name.into(),
            file: file.into(),
            start_line: 1,
            end_line,
            source,
            base_types: Vec::new(),
            attribute_count: None,
            methods: Vec::new(),
        }
    }

    pub fn with_lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    pub fn with_base_types(mut self, base_types: Vec<String>) -> Self {
        self.base_types = base_types;
        self
    }

    pub fn with_method(mut self, method: InMemoryFunction) -> Self {
        self.methods.push(method);
        self
    }
}

impl ClassSource for InMemoryClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> &Path {
        &self.file
    }

    fn start_line(&self) -> usize {
        self.start_line
    }

    fn end_line(&self) -> usize {
        self.end_line
    }

    fn source_text(&self) -> Result<String> {
        Ok(self.source.clone())
    }

    fn base_types(&self) -> Vec<String> {
        self.base_types.clone()
    }

    fn attribute_count(&self) -> Option<usize> {
        self.attribute_count
    }

    fn methods(&self) -> Vec<&dyn FunctionSource> {
        self.methods
            .iter()
            .map(|m| m as &dyn FunctionSource)
            .collect()
    }
}

/// In-memory file handle
#[derive(Clone, Debug, Default)]
pub struct InMemoryFile {
    pub path: PathBuf,
    pub language: Option<Language>,
    pub source: String,
    pub classes: Vec<InMemoryClass>,
    pub functions: Vec<InMemoryFunction>,
    pub import_count: Option<usize>,
    pub global_var_count: Option<usize>,
    pub interface_count: Option<usize>,
    pub is_test_file: Option<bool>,
    pub test_coverage_estimate: Option<f64>,
}

impl InMemoryFile {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_class(mut self, class: InMemoryClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_function(mut self, function: InMemoryFunction) -> Self {
        self.functions.push(function);
        self
    }
}

impl FileSource for InMemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn language(&self) -> Option<Language> {
        self.language
    }

    fn source_text(&self) -> Result<String> {
        Ok(self.source.clone())
    }

    fn classes(&self) -> Vec<&dyn ClassSource> {
        self.classes.iter().map(|c| c as &dyn ClassSource).collect()
    }

    fn functions(&self) -> Vec<&dyn FunctionSource> {
        self.functions
            .iter()
            .map(|f| f as &dyn FunctionSource)
            .collect()
    }

    fn import_count(&self) -> Option<usize> {
        self.import_count
    }

    fn global_var_count(&self) -> Option<usize> {
        self.global_var_count
    }

    fn interface_count(&self) -> Option<usize> {
        self.interface_count
    }

    fn is_test_file(&self) -> Option<bool> {
        self.is_test_file
    }

    fn test_coverage_estimate(&self) -> Option<f64> {
        self.test_coverage_estimate
    }
}

/// In-memory codebase handle
#[derive(Clone, Debug)]
pub struct InMemoryCodebase {
    pub project_name: String,
    pub revision: Option<String>,
    pub files: Vec<InMemoryFile>,
}

impl InMemoryCodebase {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            revision: None,
            files: Vec::new(),
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_file(mut self, file: InMemoryFile) -> Self {
        self.files.push(file);
        self
    }
}

impl CodebaseSource for InMemoryCodebase {
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
