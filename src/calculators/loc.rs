//! Line classification and counting.
//!
//! A per-language state machine walks the source line by line, tracking
//! blank lines, single-line comments, and multi-line comment state
//! (including same-line open-and-close), with optional docstring blocks
//! treated as comments. Every line lands in exactly one of
//! {blank, comment, source}; the invariant
//! `blank + comment + source == total` always holds. Within source lines,
//! logical lines exclude purely structural lines (lone braces,
//! semicolons, `pass`, ellipsis markers) and, when enabled, lines carrying
//! generated-code markers.
//!
//! # Limitations
//!
//! Comment markers inside string literals are not detected here; that
//! would require full parsing, and the count stays a close approximation
//! for such lines.

use super::{
    CalcOutcome, Calculator, CalculatorConfig, ConfigSchema, ConfigValueKind, FromConfig,
};
use crate::core::{ClassMetrics, Diagnostic, FileMetrics, FunctionMetrics, Language, LineCounts};
use crate::source::{ClassSource, FileSource, FunctionSource};
use serde::{Deserialize, Serialize};

/// Comment syntax driving the line state machine
#[derive(Clone, Copy, Debug)]
struct LineRules {
    line_prefixes: &'static [&'static str],
    block_delims: &'static [(&'static str, &'static str)],
    docstring_delims: &'static [&'static str],
    structural_words: &'static [&'static str],
}

fn rules_for(language: Language) -> LineRules {
    match language {
        Language::Rust => LineRules {
            line_prefixes: &["//"],
            block_delims: &[("/*", "*/")],
            docstring_delims: &[],
            structural_words: &[],
        },
        Language::Python => LineRules {
            line_prefixes: &["#"],
            block_delims: &[],
            docstring_delims: &["\"\"\"", "'''"],
            structural_words: &["pass", "..."],
        },
        Language::JavaScript | Language::TypeScript => LineRules {
            line_prefixes: &["//"],
            block_delims: &[("/*", "*/")],
            docstring_delims: &[],
            structural_words: &[],
        },
        Language::Unknown => LineRules {
            line_prefixes: &["//", "#"],
            block_delims: &[("/*", "*/")],
            docstring_delims: &[],
            structural_words: &["pass", "..."],
        },
    }
}

/// Documentation quality classification from the comment ratio
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentationQuality {
    WellDocumented,
    Adequate,
    Sparse,
    Undocumented,
}

/// Code density classification from the logical-line ratio
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CodeDensity {
    Dense,
    Moderate,
    Sparse,
}

/// Classifies every line and produces the count breakdown
pub struct LinesOfCodeCalculator {
    docstrings_as_comments: bool,
    skip_generated: bool,
    generated_markers: Vec<String>,
}

impl Default for LinesOfCodeCalculator {
    fn default() -> Self {
        Self {
            docstrings_as_comments: true,
            skip_generated: false,
            generated_markers: vec![
                "@generated".to_string(),
                "DO NOT EDIT".to_string(),
            ],
        }
    }
}

impl FromConfig for LinesOfCodeCalculator {
    fn from_config(config: &CalculatorConfig) -> Result<Self, crate::core::RegistryError> {
        let defaults = Self::default();
        Ok(Self {
            docstrings_as_comments: config.get_bool("docstrings_as_comments", true),
            skip_generated: config.get_bool("skip_generated", false),
            generated_markers: config
                .get_string_list("generated_markers")
                .unwrap_or(defaults.generated_markers),
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum BlockState {
    None,
    Comment { close: &'static str },
    Docstring { delim: &'static str },
}

impl LinesOfCodeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every line of `source` into the count breakdown
    pub fn count_source(&self, source: &str, language: Language) -> LineCounts {
        let rules = rules_for(language);
        let mut counts = LineCounts::default();
        let mut state = BlockState::None;

        for line in source.lines() {
            counts.total += 1;
            let trimmed = line.trim();

            match state {
                BlockState::Comment { close } => {
                    counts.comment += 1;
                    if let Some(pos) = line.find(close) {
                        // Trailing code after the close still reads as part
                        // of the comment line; only the state advances
                        let after = &line[pos + close.len()..];
                        state = self.reenter_after_close(after, rules);
                    }
                    continue;
                }
                BlockState::Docstring { delim } => {
                    counts.comment += 1;
                    if line.contains(delim) {
                        state = BlockState::None;
                    }
                    continue;
                }
                BlockState::None => {}
            }

            if trimmed.is_empty() {
                counts.blank += 1;
                continue;
            }

            if self.docstrings_as_comments {
                if let Some(delim) = rules
                    .docstring_delims
                    .iter()
                    .copied()
                    .find(|d| trimmed.starts_with(*d))
                {
                    counts.comment += 1;
                    // Same-line open and close needs a second occurrence
                    if trimmed[delim.len()..].find(delim).is_none() {
                        state = BlockState::Docstring { delim };
                    }
                    continue;
                }
            }

            if rules.line_prefixes.iter().any(|p| trimmed.starts_with(p)) {
                counts.comment += 1;
                continue;
            }

            if let Some(&(open, close)) = rules
                .block_delims
                .iter()
                .find(|(open, _)| trimmed.starts_with(open))
            {
                counts.comment += 1;
                let after_open = &trimmed[open.len()..];
                if let Some(pos) = after_open.find(close) {
                    state = self.reenter_after_close(&after_open[pos + close.len()..], rules);
                } else {
                    state = BlockState::Comment { close };
                }
                continue;
            }

            // A code line; a block comment may still open mid-line
            counts.source += 1;
            if self.is_logical(trimmed, rules) {
                counts.logical += 1;
            }
            if let Some(&(open, close)) = rules
                .block_delims
                .iter()
                .find(|(open, _)| trimmed.contains(*open))
            {
                if let Some(open_pos) = trimmed.find(open) {
                    let after_open = &trimmed[open_pos + open.len()..];
                    if !after_open.contains(close) {
                        state = BlockState::Comment { close };
                    }
                }
            }
        }

        counts
    }

    /// State after a block close with `after` text remaining on the line
    fn reenter_after_close(&self, after: &str, rules: LineRules) -> BlockState {
        if let Some(&(open, close)) = rules
            .block_delims
            .iter()
            .find(|(open, _)| after.contains(*open))
        {
            let open_pos = after.find(open).unwrap_or(0);
            if !after[open_pos + open.len()..].contains(close) {
                return BlockState::Comment { close };
            }
        }
        BlockState::None
    }

    /// Whether a source line carries a statement
    fn is_logical(&self, trimmed: &str, rules: LineRules) -> bool {
        if trimmed.chars().all(|c| "{}()[];,".contains(c)) {
            return false;
        }
        if rules.structural_words.contains(&trimmed) {
            return false;
        }
        if self.skip_generated
            && self
                .generated_markers
                .iter()
                .any(|marker| trimmed.contains(marker.as_str()))
        {
            return false;
        }
        true
    }

    /// Classify documentation quality from an already-computed breakdown
    pub fn documentation_quality(lines: &LineCounts) -> DocumentationQuality {
        let ratio = lines.comment_ratio();
        if ratio >= 0.25 {
            DocumentationQuality::WellDocumented
        } else if ratio >= 0.10 {
            DocumentationQuality::Adequate
        } else if ratio > 0.0 {
            DocumentationQuality::Sparse
        } else {
            DocumentationQuality::Undocumented
        }
    }

    /// Classify code density from an already-computed breakdown
    pub fn code_density(lines: &LineCounts) -> CodeDensity {
        let ratio = lines.logical_ratio();
        if ratio >= 0.8 {
            CodeDensity::Dense
        } else if ratio >= 0.5 {
            CodeDensity::Moderate
        } else {
            CodeDensity::Sparse
        }
    }
}

impl Calculator for LinesOfCodeCalculator {
    fn name(&self) -> &str {
        "lines_of_code"
    }

    fn description(&self) -> &str {
        "Classifies lines into blank/comment/source with a logical-line breakdown"
    }

    fn version(&self) -> &str {
        "1.3.1"
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default()
            .field(
                "docstrings_as_comments",
                ConfigValueKind::Bool,
                "Treat docstring-style block literals as comment lines",
            )
            .field(
                "skip_generated",
                ConfigValueKind::Bool,
                "Exclude generated-marker lines from the logical count",
            )
            .field(
                "generated_markers",
                ConfigValueKind::StringList,
                "Markers identifying generated lines",
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
                metrics.lines = self.count_source(&text, language);
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, line counts skipped: {e}"))
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
                metrics.lines = self.count_source(&text, language);
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, line counts skipped: {e}"))
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
                metrics.lines = self.count_source(&text, language);
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, line counts skipped: {e}"))
                    .for_calculator(self.name())
                    .for_entity(source.path().display().to_string()),
            ),
        }
    }
}
