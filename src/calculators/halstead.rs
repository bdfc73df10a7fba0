//! Halstead operator/operand tallies over pre-extracted source text.
//!
//! Tokenization walks the stripped source (comments gone, string contents
//! blanked but delimiters kept) and classifies tokens: symbolic operators
//! matched longest-first from a per-language table, keywords counted as
//! operators, numeric and string literals normalized to the canonical
//! `NUMBER`/`STRING` placeholders so distinct literal values do not
//! inflate operand cardinality, and identifiers counted as operands unless
//! they appear on the language's built-in-symbol exclusion list.
//!
//! Class and file scope use the additive convention: the entity's own
//! tally absorbs every embedded child's tally on top.

use super::strip::strip_comments_and_strings;
use super::{CalcOutcome, Calculator, CalculatorConfig, FromConfig};
use crate::core::{
    ClassMetrics, Diagnostic, FileMetrics, FunctionMetrics, HalsteadMetrics, Language,
};
use crate::source::{ClassSource, FileSource, FunctionSource};
use std::collections::HashMap;

/// Token classification tables for one language
struct TokenSpec {
    /// Symbolic operators, longest first so `<<=` wins over `<<` and `<`
    operators: &'static [&'static str],
    keywords: &'static [&'static str],
    /// Built-in symbols excluded from operand counts
    builtins: &'static [&'static str],
    string_delims: &'static [&'static str],
}

static RUST_SPEC: TokenSpec = TokenSpec {
    operators: &[
        "<<=", ">>=", "..=", "...", "::", "->", "=>", "==", "!=", "<=", ">=", "&&", "||", "+=",
        "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "..", "+", "-", "*", "/", "%", "=",
        "<", ">", "!", "&", "|", "^", "?", ".", ",", ";", ":", "(", ")", "{", "}", "[", "]", "#",
        "@",
    ],
    keywords: &[
        "fn", "let", "mut", "if", "else", "match", "while", "for", "loop", "return", "impl",
        "struct", "enum", "trait", "pub", "use", "mod", "const", "static", "ref", "move", "async",
        "await", "dyn", "where", "type", "unsafe", "in", "as", "break", "continue", "crate",
        "super",
    ],
    builtins: &[
        "String", "Vec", "Option", "Some", "None", "Result", "Ok", "Err", "Box", "self", "Self",
        "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "usize", "isize",
        "bool", "str", "println", "vec",
    ],
    string_delims: &["\""],
};

static PYTHON_SPEC: TokenSpec = TokenSpec {
    operators: &[
        "**=", "//=", "<<=", ">>=", "==", "!=", "<=", ">=", "->", "+=", "-=", "*=", "/=", "%=",
        "&=", "|=", "^=", "**", "//", "<<", ">>", ":=", "+", "-", "*", "/", "%", "=", "<", ">",
        "&", "|", "^", "~", ".", ",", ";", ":", "(", ")", "{", "}", "[", "]", "@",
    ],
    keywords: &[
        "def", "class", "if", "elif", "else", "for", "while", "return", "import", "from", "as",
        "try", "except", "finally", "with", "lambda", "pass", "break", "continue", "global",
        "nonlocal", "yield", "assert", "raise", "del", "not", "and", "or", "in", "is", "async",
        "await", "match", "case",
    ],
    builtins: &[
        "print", "len", "range", "str", "int", "float", "list", "dict", "set", "tuple", "bool",
        "type", "isinstance", "super", "self", "enumerate", "zip", "map", "filter", "sorted",
        "open", "None", "True", "False",
    ],
    string_delims: &["\"\"\"", "'''", "\"", "'"],
};

static JS_SPEC: TokenSpec = TokenSpec {
    operators: &[
        ">>>=", "===", "!==", ">>>", "**=", "<<=", ">>=", "&&=", "||=", "??=", "=>", "==", "!=",
        "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
        "^=", "**", "<<", ">>", "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~",
        "?", ".", ",", ";", ":", "(", ")", "{", "}", "[", "]",
    ],
    keywords: &[
        "function", "var", "let", "const", "if", "else", "for", "while", "do", "return", "class",
        "extends", "new", "delete", "typeof", "instanceof", "in", "of", "try", "catch", "finally",
        "throw", "switch", "case", "break", "continue", "default", "import", "export", "from",
        "async", "await", "yield", "static", "get", "set", "interface", "type", "enum",
        "implements", "readonly", "namespace", "declare", "public", "private", "protected",
    ],
    builtins: &[
        "console", "log", "Math", "JSON", "Object", "Array", "String", "Number", "Boolean",
        "Promise", "window", "document", "require", "module", "this", "super", "null",
        "undefined", "true", "false",
    ],
    string_delims: &["\"", "'", "`"],
};

fn spec_for(language: Language) -> &'static TokenSpec {
    match language {
        Language::Rust => &RUST_SPEC,
        Language::Python => &PYTHON_SPEC,
        Language::JavaScript | Language::TypeScript => &JS_SPEC,
        Language::Unknown => &JS_SPEC,
    }
}

/// Tallies distinct and total operators/operands per scope
#[derive(Default)]
pub struct HalsteadVolumeCalculator;

impl FromConfig for HalsteadVolumeCalculator {
    fn from_config(_config: &CalculatorConfig) -> Result<Self, crate::core::RegistryError> {
        Ok(Self)
    }
}

impl HalsteadVolumeCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize one scope's source into a Halstead tally
    pub fn tally_source(&self, source: &str, language: Language) -> HalsteadMetrics {
        let spec = spec_for(language);
        let stripped = strip_comments_and_strings(source, language);

        let mut operators: HashMap<String, u64> = HashMap::new();
        let mut operands: HashMap<String, u64> = HashMap::new();

        let bytes = stripped.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let rest = &stripped[i..];
            let ch = rest.chars().next().unwrap_or(' ');

            if ch.is_whitespace() {
                i += ch.len_utf8();
                continue;
            }

            // String literal: contents were blanked, delimiters survive
            if let Some(delim) = spec.string_delims.iter().find(|d| rest.starts_with(**d)) {
                let body = &rest[delim.len()..];
                let end = body.find(delim).map(|p| p + delim.len()).unwrap_or(0);
                *operands.entry("STRING".to_string()).or_insert(0) += 1;
                i += delim.len() + end;
                continue;
            }

            if ch.is_ascii_digit() {
                let len = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
                    .unwrap_or(rest.len());
                *operands.entry("NUMBER".to_string()).or_insert(0) += 1;
                i += len.max(1);
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                let len = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                let word = &rest[..len];
                if spec.keywords.contains(&word) {
                    *operators.entry(word.to_string()).or_insert(0) += 1;
                } else if !spec.builtins.contains(&word) {
                    *operands.entry(word.to_string()).or_insert(0) += 1;
                }
                i += len;
                continue;
            }

            if let Some(op) = spec.operators.iter().find(|op| rest.starts_with(**op)) {
                *operators.entry((*op).to_string()).or_insert(0) += 1;
                i += op.len();
                continue;
            }

            i += ch.len_utf8();
        }

        HalsteadMetrics {
            distinct_operators: operators.len() as u64,
            distinct_operands: operands.len() as u64,
            total_operators: operators.values().sum(),
            total_operands: operands.values().sum(),
        }
    }
}

impl Calculator for HalsteadVolumeCalculator {
    fn name(&self) -> &str {
        "halstead_volume"
    }

    fn description(&self) -> &str {
        "Derives Halstead volume, difficulty, and effort from operator and operand tallies"
    }

    fn version(&self) -> &str {
        "1.1.0"
    }

    fn calculate_for_function(
        &self,
        source: &dyn FunctionSource,
        mut metrics: FunctionMetrics,
    ) -> CalcOutcome<FunctionMetrics> {
        let language = Language::from_path(source.file_path());
        match source.source_text() {
            Ok(text) => {
                metrics.halstead = self.tally_source(&text, language);
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, halstead skipped: {e}"))
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
                let mut tally = self.tally_source(&text, language);
                for method in &metrics.methods {
                    tally.absorb(&method.halstead);
                }
                metrics.halstead = tally;
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, halstead skipped: {e}"))
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
                let mut tally = self.tally_source(&text, language);
                for class in &metrics.classes {
                    tally.absorb(&class.halstead);
                }
                for function in &metrics.functions {
                    tally.absorb(&function.halstead);
                }
                metrics.halstead = tally;
                CalcOutcome::ok(metrics)
            }
            Err(e) => CalcOutcome::unchanged(metrics).with_warning(
                Diagnostic::warning(format!("source unavailable, halstead skipped: {e}"))
                    .for_calculator(self.name())
                    .for_entity(source.path().display().to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(source: &str, language: Language) -> HalsteadMetrics {
        HalsteadVolumeCalculator::new().tally_source(source, language)
    }

    #[test]
    fn empty_source_is_all_zero() {
        let t = tally("", Language::Rust);
        assert_eq!(t, HalsteadMetrics::default());
        assert_eq!(t.volume(), 0.0);
        assert_eq!(t.difficulty(), 0.0);
    }

    #[test]
    fn distinct_literals_normalize_to_placeholders() {
        let t = tally("x = 1\ny = 2\nz = 3\n", Language::Python);
        // x, y, z and a single NUMBER bucket
        assert_eq!(t.distinct_operands, 4);
        assert_eq!(t.total_operands, 6);
    }

    #[test]
    fn string_literals_count_once_per_occurrence() {
        let t = tally("a = 'one'\nb = 'two'\n", Language::Python);
        // a, b, STRING
        assert_eq!(t.distinct_operands, 3);
        assert_eq!(t.total_operands, 4);
    }

    #[test]
    fn keywords_count_as_operators() {
        let t = tally("if x:\n    return y\n", Language::Python);
        // if, return, :
        assert_eq!(t.distinct_operators, 3);
        assert_eq!(t.total_operators, 3);
        assert_eq!(t.distinct_operands, 2);
    }

    #[test]
    fn builtins_are_excluded_from_operands() {
        let t = tally("print(value)", Language::Python);
        assert_eq!(t.distinct_operands, 1);
    }

    #[test]
    fn longest_operator_wins() {
        let t = tally("a <<= b", Language::Rust);
        assert_eq!(t.distinct_operators, 1);
        assert_eq!(t.total_operators, 1);
    }

    #[test]
    fn comments_do_not_contribute_tokens() {
        let with = tally("let x = 1; // y + z * w\n", Language::Rust);
        let without = tally("let x = 1;\n", Language::Rust);
        assert_eq!(with, without);
    }

    #[test]
    fn derived_values_match_reference_example() {
        let m = HalsteadMetrics::new(2, 3, 5, 4);
        assert_eq!(m.vocabulary(), 5);
        assert_eq!(m.length(), 9);
        assert!((m.volume() - 9.0 * 5.0_f64.log2()).abs() < 1e-9);
        assert!((m.difficulty() - 4.0 / 3.0).abs() < 1e-9);
        assert!((m.effort() - m.difficulty() * m.volume()).abs() < 1e-9);
    }
}
