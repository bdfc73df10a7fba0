pub mod errors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub use errors::{EngineError, Error, PersistenceError, RegistryError, Result};

/// Halstead operator/operand tallies with the classic derived measures.
///
/// Degenerate inputs yield 0.0 rather than NaN: volume is 0 when the
/// vocabulary is 1 or less, difficulty is 0 when there are no distinct
/// operands.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HalsteadMetrics {
    /// n1, distinct operators
    pub distinct_operators: u64,
    /// n2, distinct operands
    pub distinct_operands: u64,
    /// N1, total operators
    pub total_operators: u64,
    /// N2, total operands
    pub total_operands: u64,
}

impl HalsteadMetrics {
    pub fn new(
        distinct_operators: u64,
        distinct_operands: u64,
        total_operators: u64,
        total_operands: u64,
    ) -> Self {
        Self {
            distinct_operators,
            distinct_operands,
            total_operators,
            total_operands,
        }
    }

    /// n = n1 + n2
    pub fn vocabulary(&self) -> u64 {
        self.distinct_operators + self.distinct_operands
    }

    /// N = N1 + N2
    pub fn length(&self) -> u64 {
        self.total_operators + self.total_operands
    }

    /// V = N * log2(n), 0 when the vocabulary is degenerate
    pub fn volume(&self) -> f64 {
        let vocabulary = self.vocabulary();
        if vocabulary <= 1 {
            return 0.0;
        }
        self.length() as f64 * (vocabulary as f64).log2()
    }

    /// D = (n1 / 2) * (N2 / n2), 0 when there are no distinct operands
    pub fn difficulty(&self) -> f64 {
        if self.distinct_operands == 0 {
            return 0.0;
        }
        (self.distinct_operators as f64 / 2.0)
            * (self.total_operands as f64 / self.distinct_operands as f64)
    }

    /// E = D * V
    pub fn effort(&self) -> f64 {
        self.difficulty() * self.volume()
    }

    /// Fold another tally into this one. Used for the additive
    /// parent-plus-children aggregation at class and file scope.
    pub fn absorb(&mut self, other: &HalsteadMetrics) {
        self.distinct_operators += other.distinct_operators;
        self.distinct_operands += other.distinct_operands;
        self.total_operators += other.total_operators;
        self.total_operands += other.total_operands;
    }
}

/// Line-count breakdown shared by function, class, and file metrics.
///
/// Invariant: `comment + blank + source == total` for any classification
/// run. Logical lines are the subset of source lines that carry a
/// statement (structural-only lines excluded).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineCounts {
    pub total: usize,
    pub logical: usize,
    pub source: usize,
    pub comment: usize,
    pub blank: usize,
}

impl LineCounts {
    /// Comment lines over total lines, 0 when empty
    pub fn comment_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.comment as f64 / self.total as f64
    }

    /// Source lines over total lines, 0 when empty
    pub fn source_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.source as f64 / self.total as f64
    }

    /// Blank lines over total lines, 0 when empty
    pub fn blank_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.blank as f64 / self.total as f64
    }

    /// Logical lines over source lines, 0 when there is no source
    pub fn logical_ratio(&self) -> f64 {
        if self.source == 0 {
            return 0.0;
        }
        self.logical as f64 / self.source as f64
    }

    pub fn absorb(&mut self, other: &LineCounts) {
        self.total += other.total;
        self.logical += other.logical;
        self.source += other.source;
        self.comment += other.comment;
        self.blank += other.blank;
    }
}

/// Metrics for a single function or method
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionMetrics {
    pub name: String,
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    /// Always at least 1, even for empty bodies
    pub cyclomatic: u32,
    pub halstead: HalsteadMetrics,
    pub maintainability_index: f64,
    pub lines: LineCounts,
    pub parameter_count: usize,
    pub nesting_depth: u32,
    pub is_recursive: bool,
    pub is_dead: bool,
    pub has_unused_params: bool,
    pub call_site_count: usize,
    pub dependency_count: usize,
    pub calculated_at: DateTime<Utc>,
}

impl FunctionMetrics {
    pub fn new(name: String, file: PathBuf, start_line: usize, end_line: usize) -> Self {
        Self {
            name,
            file,
            start_line,
            end_line,
            cyclomatic: 1,
            halstead: HalsteadMetrics::default(),
            maintainability_index: 0.0,
            lines: LineCounts::default(),
            parameter_count: 0,
            nesting_depth: 0,
            is_recursive: false,
            is_dead: false,
            has_unused_params: false,
            call_site_count: 0,
            dependency_count: 0,
            calculated_at: Utc::now(),
        }
    }

    pub fn is_complex(&self, threshold: u32) -> bool {
        self.cyclomatic > threshold
    }
}

/// Metrics for a class or type declaration.
///
/// Complexity, Halstead, and line counts at this scope follow the additive
/// convention: the class's own body value plus the sum of every embedded
/// method's value. The class body already contains the method source, so
/// methods are counted twice by intent; totals here are not comparable with
/// a deduplicated reading of the same metric.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub name: String,
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub cyclomatic: u32,
    pub halstead: HalsteadMetrics,
    pub maintainability_index: f64,
    pub lines: LineCounts,
    pub method_count: usize,
    pub attribute_count: usize,
    pub depth_of_inheritance: u32,
    pub number_of_children: usize,
    pub methods: Vec<FunctionMetrics>,
    pub has_dead_methods: bool,
}

impl ClassMetrics {
    pub fn new(name: String, file: PathBuf, start_line: usize, end_line: usize) -> Self {
        Self {
            name,
            file,
            start_line,
            end_line,
            cyclomatic: 1,
            halstead: HalsteadMetrics::default(),
            maintainability_index: 0.0,
            lines: LineCounts::default(),
            method_count: 0,
            attribute_count: 0,
            depth_of_inheritance: 0,
            number_of_children: 0,
            methods: Vec::new(),
            has_dead_methods: false,
        }
    }

    /// Methods per source line, 0 when there is no source
    pub fn method_density(&self) -> f64 {
        if self.lines.source == 0 {
            return 0.0;
        }
        self.method_count as f64 / self.lines.source as f64
    }
}

/// Metrics for one source file.
///
/// File-scope complexity/Halstead/line aggregates follow the same additive
/// convention as `ClassMetrics`: own-scope value plus the sums of embedded
/// class and function values.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileMetrics {
    pub path: PathBuf,
    pub language: Language,
    pub cyclomatic: u32,
    pub halstead: HalsteadMetrics,
    pub maintainability_index: f64,
    pub lines: LineCounts,
    pub class_count: usize,
    pub function_count: usize,
    pub import_count: usize,
    pub global_var_count: usize,
    pub interface_count: usize,
    pub classes: Vec<ClassMetrics>,
    pub functions: Vec<FunctionMetrics>,
    pub has_dead_code: bool,
    pub is_test_file: bool,
    pub test_coverage_estimate: f64,
}

impl FileMetrics {
    pub fn new(path: PathBuf, language: Language) -> Self {
        Self {
            path,
            language,
            cyclomatic: 1,
            halstead: HalsteadMetrics::default(),
            maintainability_index: 0.0,
            lines: LineCounts::default(),
            class_count: 0,
            function_count: 0,
            import_count: 0,
            global_var_count: 0,
            interface_count: 0,
            classes: Vec::new(),
            functions: Vec::new(),
            has_dead_code: false,
            is_test_file: false,
            test_coverage_estimate: 0.0,
        }
    }
}

/// Whole-codebase aggregates for one run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CodebaseMetrics {
    pub project_name: String,
    pub total_files: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub lines: LineCounts,
    pub total_cyclomatic_complexity: u64,
    pub total_halstead_volume: f64,
    pub average_cyclomatic_complexity: f64,
    /// Mean maintainability index over files with a computed MI (> 0)
    pub average_maintainability_index: f64,
    pub language_distribution: HashMap<String, usize>,
    pub files_with_dead_code: usize,
    pub test_file_count: usize,
    pub calculated_at: DateTime<Utc>,
    pub revision: Option<String>,
}

impl CodebaseMetrics {
    pub fn new(project_name: String) -> Self {
        Self {
            project_name,
            total_files: 0,
            total_functions: 0,
            total_classes: 0,
            lines: LineCounts::default(),
            total_cyclomatic_complexity: 0,
            total_halstead_volume: 0.0,
            average_cyclomatic_complexity: 0.0,
            average_maintainability_index: 0.0,
            language_distribution: HashMap::new(),
            files_with_dead_code: 0,
            test_file_count: 0,
            calculated_at: Utc::now(),
            revision: None,
        }
    }

    /// Test files over total files, 0 when empty
    pub fn test_file_ratio(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.test_file_count as f64 / self.total_files as f64
    }
}

/// Severity of a collected diagnostic
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// A recorded per-calculator or per-entity fault. Diagnostics are
/// collected, never thrown; a completed run always carries the full list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// Name of the calculator at fault, if the fault is calculator-scoped
    pub calculator: Option<String>,
    /// The function/class/file/codebase the fault occurred on
    pub entity: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            calculator: None,
            entity: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            calculator: None,
            entity: None,
            message: message.into(),
        }
    }

    pub fn for_calculator(mut self, calculator: impl Into<String>) -> Self {
        self.calculator = Some(calculator.into());
        self
    }

    pub fn for_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.calculator, &self.entity) {
            (Some(calc), Some(entity)) => write!(f, "[{calc}] {entity}: {}", self.message),
            (Some(calc), None) => write!(f, "[{calc}] {}", self.message),
            (None, Some(entity)) => write!(f, "{entity}: {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

/// Top-level result of a metrics run: codebase aggregates plus per-file
/// breakdowns and the consolidated diagnostic lists. Never mutated after
/// the run completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsData {
    pub codebase: CodebaseMetrics,
    pub file_metrics: HashMap<PathBuf, FileMetrics>,
    pub class_metrics: HashMap<PathBuf, Vec<ClassMetrics>>,
    pub function_metrics: HashMap<PathBuf, Vec<FunctionMetrics>>,
    pub duration_ms: u64,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl MetricsData {
    pub fn new(codebase: CodebaseMetrics) -> Self {
        Self {
            codebase,
            file_metrics: HashMap::new(),
            class_metrics: HashMap::new(),
            function_metrics: HashMap::new(),
            duration_ms: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Structured serialization for export and report consumers
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["rs"], Language::Rust),
            (&["py", "pyw"], Language::Python),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Language, &str)] = &[
            (Language::Rust, "Rust"),
            (Language::Python, "Python"),
            (Language::JavaScript, "JavaScript"),
            (Language::TypeScript, "TypeScript"),
            (Language::Unknown, "Unknown"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(l, _)| l == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}
