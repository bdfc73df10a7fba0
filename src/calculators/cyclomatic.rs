//! Cyclomatic complexity over pre-extracted source text.
//!
//! Complexity = 1 + the number of decision points found after comments and
//! string contents are blanked out. Decision points are grouped into six
//! per-language pattern categories, each individually toggleable through
//! configuration: conditional branches, loops, boolean short-circuit
//! operators, exception handling, switch/case labels, and ternary
//! expressions.
//!
//! Class and file scope follow the additive aggregation convention: the
//! entity's own source (which textually contains its children) is counted
//! once, and every embedded child's already-computed complexity is added
//! on top.

use super::strip::strip_comments_and_strings;
use super::{
    CalcOutcome, Calculator, CalculatorConfig, ConfigSchema, ConfigValueKind, FromConfig,
};
use crate::core::{ClassMetrics, Diagnostic, FileMetrics, FunctionMetrics, Language};
use crate::source::{ClassSource, FileSource, FunctionSource};
use once_cell::sync::Lazy;
use regex::Regex;

/// Decision-point patterns for one language, one entry per category
struct DecisionPatterns {
    conditionals: Vec<Regex>,
    loops: Vec<Regex>,
    logical_operators: Vec<Regex>,
    exception_handling: Vec<Regex>,
    case_labels: Vec<Regex>,
    ternaries: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

static RUST_PATTERNS: Lazy<DecisionPatterns> = Lazy::new(|| DecisionPatterns {
    conditionals: compile(&[r"\bif\b"]),
    loops: compile(&[r"\bwhile\b", r"\bfor\b", r"\bloop\b"]),
    logical_operators: compile(&[r"&&", r"\|\|"]),
    exception_handling: compile(&[r"\?"]),
    case_labels: compile(&[r"=>"]),
    ternaries: compile(&[]),
});

static PYTHON_PATTERNS: Lazy<DecisionPatterns> = Lazy::new(|| DecisionPatterns {
    conditionals: compile(&[r"\bif\b", r"\belif\b"]),
    loops: compile(&[r"\bfor\b", r"\bwhile\b"]),
    logical_operators: compile(&[r"\band\b", r"\bor\b"]),
    exception_handling: compile(&[r"\bexcept\b", r"\bfinally\b"]),
    case_labels: compile(&[r"\bcase\b"]),
    // Python's conditional expression reuses `if`, already counted above
    ternaries: compile(&[]),
});

static JS_PATTERNS: Lazy<DecisionPatterns> = Lazy::new(|| DecisionPatterns {
    conditionals: compile(&[r"\bif\b"]),
    loops: compile(&[r"\bfor\b", r"\bwhile\b", r"\bdo\b"]),
    logical_operators: compile(&[r"&&", r"\|\|", r"\?\?"]),
    exception_handling: compile(&[r"\bcatch\b", r"\bfinally\b"]),
    case_labels: compile(&[r"\bcase\b"]),
    // `?` that is not optional chaining or nullish coalescing
    ternaries: compile(&[r"\?[^.?]"]),
});

static GENERIC_PATTERNS: Lazy<DecisionPatterns> = Lazy::new(|| DecisionPatterns {
    conditionals: compile(&[r"\bif\b", r"\belif\b"]),
    loops: compile(&[r"\bfor\b", r"\bwhile\b"]),
    logical_operators: compile(&[r"&&", r"\|\|"]),
    exception_handling: compile(&[r"\bcatch\b", r"\bexcept\b"]),
    case_labels: compile(&[r"\bcase\b"]),
    ternaries: compile(&[]),
});

fn patterns_for(language: Language) -> &'static DecisionPatterns {
    match language {
        Language::Rust => &RUST_PATTERNS,
        Language::Python => &PYTHON_PATTERNS,
        Language::JavaScript | Language::TypeScript => &JS_PATTERNS,
        Language::Unknown => &GENERIC_PATTERNS,
    }
}

/// Counts decision points in stripped source text
pub struct CyclomaticComplexityCalculator {
    count_conditionals: bool,
    count_loops: bool,
    count_logical_operators: bool,
    count_exception_handling: bool,
    count_case_labels: bool,
    count_ternaries: bool,
}

impl Default for CyclomaticComplexityCalculator {
    fn default() -> Self {
        Self {
            count_conditionals: true,
            count_loops: true,
            count_logical_operators: true,
            count_exception_handling: true,
            count_case_labels: true,
            count_ternaries: true,
        }
    }
}

impl FromConfig for CyclomaticComplexityCalculator {
    fn from_config(config: &CalculatorConfig) -> Result<Self, crate::core::RegistryError> {
        Ok(Self {
            count_conditionals: config.get_bool("count_conditionals", true),
            count_loops: config.get_bool("count_loops", true),
            count_logical_operators: config.get_bool("count_logical_operators", true),
            count_exception_handling: config.get_bool("count_exception_handling", true),
            count_case_labels: config.get_bool("count_case_labels", true),
            count_ternaries: config.get_bool("count_ternaries", true),
        })
    }
}

impl CyclomaticComplexityCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    fn count_matches(patterns: &[Regex], text: &str) -> u32 {
        patterns
            .iter()
            .map(|p| p.find_iter(text).count() as u32)
            .sum()
    }

    /// Complexity of one scope's source: 1 + enabled decision points
    pub fn complexity_of_source(&self, source: &str, language: Language) -> u32 {
        let stripped = strip_comments_and_strings(source, language);
        let patterns = patterns_for(language);

        let mut decision_points = 0;
        if self.count_conditionals {
            decision_points += Self::count_matches(&patterns.conditionals, &stripped);
        }
        if self.count_loops {
            decision_points += Self::count_matches(&patterns.loops, &stripped);
        }
        if self.count_logical_operators {
            decision_points += Self::count_matches(&patterns.logical_operators, &stripped);
        }
        if self.count_exception_handling {
            decision_points += Self::count_matches(&patterns.exception_handling, &stripped);
        }
        if self.count_case_labels {
            decision_points += Self::count_matches(&patterns.case_labels, &stripped);
        }
        if self.count_ternaries {
            decision_points += Self::count_matches(&patterns.ternaries, &stripped);
        }

        1 + decision_points
    }
}

impl Calculator for CyclomaticComplexityCalculator {
    fn name(&self) -> &str {
        "cyclomatic_complexity"
    }

    fn description(&self) -> &str {
        "Counts linearly independent execution paths as 1 + decision points"
    }

    fn version(&self) -> &str {
        "1.2.0"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default()
            .field(
                "count_conditionals",
                ConfigValueKind::Bool,
                "Count if/elif branches as decision points",
            )
            .field(
                "count_loops",
                ConfigValueKind::Bool,
                "Count loop constructs as decision points",
            )
            .field(
                "count_logical_operators",
                ConfigValueKind::Bool,
                "Count boolean short-circuit operators as decision points",
            )
            .field(
                "count_exception_handling",
                ConfigValueKind::Bool,
                "Count exception-handling constructs as decision points",
            )
            .field(
                "count_case_labels",
                ConfigValueKind::Bool,
                "Count switch/case labels and match arms as decision points",
            )
            .field(
                "count_ternaries",
                ConfigValueKind::Bool,
                "Count ternary expressions as decision points",
            )
    }

    fn calculate_for_function(
        &self,
        source: &dyn FunctionSource,
        mut metrics: FunctionMetrics,
    ) -> CalcOutcome<FunctionMetrics> {
        let language = Language::from_path(source.file_path());
        match source.source_text() {
            Ok(text) => {
                metrics.cyclomatic = self.complexity_of_source(&text, language);
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, complexity skipped: {e}"))
                    .for_calculator(self.name())
                    .for_entity(source.name()),
            ),
        }
    }

    fn calculate_for_class(
        &self,
        source: &dyn ClassSource,
        mut metrics: ClassMetrics,
    ) -> CalcOutcome<ClassMetrics> {
        let language = Language::from_path(source.file_path());
        match source.source_text() {
            Ok(text) => {
                // Own body plus every method again: the additive convention
                let own = self.complexity_of_source(&text, language);
                let methods: u32 = metrics.methods.iter().map(|m| m.cyclomatic).sum();
                metrics.cyclomatic = own + methods;
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, complexity skipped: {e}"))
                    .for_calculator(self.name())
                    .for_entity(source.name()),
            ),
        }
    }

    fn calculate_for_file(
        &self,
        source: &dyn FileSource,
        mut metrics: FileMetrics,
    ) -> CalcOutcome<FileMetrics> {
        let language = metrics.language;
        match source.source_text() {
            Ok(text) => {
                let own = self.complexity_of_source(&text, language);
                let classes: u32 = metrics.classes.iter().map(|c| c.cyclomatic).sum();
                let functions: u32 = metrics.functions.iter().map(|f| f.cyclomatic).sum();
                metrics.cyclomatic = own + classes + functions;
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, complexity skipped: {e}"))
                    .for_calculator(self.name())
                    .for_entity(source.path().display().to_string()),
            ),
        }
    }
}
