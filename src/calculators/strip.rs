//! Language-aware comment and string-literal stripping.
//!
//! Token-counting calculators run over text, so comment bodies and string
//! contents must be blanked first to keep keywords inside them from
//! registering as decision points or operands. Stripping preserves the
//! line structure: every removed character becomes a space, newlines stay,
//! and string delimiters survive so the literal itself remains countable
//! as a single token.
//!
//! # Limitations
//!
//! - Raw strings with embedded delimiters (e.g. Rust `r#"..."#`) are
//!   treated as ordinary quoted strings.
//! - Shebang lines are not special-cased; `#` handling follows the
//!   language's comment syntax.

use crate::core::Language;

/// Per-language comment and string syntax
#[derive(Clone, Copy, Debug)]
struct StripSyntax {
    line_prefixes: &'static [&'static str],
    block_delims: &'static [(&'static str, &'static str)],
    /// Longest first, so triple quotes win over single quotes
    string_delims: &'static [&'static str],
    /// Whether escape sequences terminate delimiter matching inside strings
    strings_escape: bool,
    /// Rust block comments nest
    blocks_nest: bool,
}

fn syntax_for(language: Language) -> StripSyntax {
    match language {
        Language::Rust => StripSyntax {
            line_prefixes: &["//"],
            block_delims: &[("/*", "*/")],
            string_delims: &["\""],
            strings_escape: true,
            blocks_nest: true,
        },
        Language::Python => StripSyntax {
            line_prefixes: &["#"],
            block_delims: &[],
            string_delims: &["\"\"\"", "'''", "\"", "'"],
            strings_escape: true,
            blocks_nest: false,
        },
        Language::JavaScript | Language::TypeScript => StripSyntax {
            line_prefixes: &["//"],
            block_delims: &[("/*", "*/")],
            string_delims: &["\"", "'", "`"],
            strings_escape: true,
            blocks_nest: false,
        },
        // Conservative C-like defaults for anything unrecognized
        Language::Unknown => StripSyntax {
            line_prefixes: &["//", "#"],
            block_delims: &[("/*", "*/")],
            string_delims: &["\"", "'"],
            strings_escape: true,
            blocks_nest: false,
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Normal,
    LineComment,
    BlockComment {
        open: &'static str,
        close: &'static str,
        depth: usize,
    },
    InString {
        delim: &'static str,
    },
}

/// Blank comments and string contents from `source`, preserving line
/// structure and string delimiter tokens.
pub fn strip_comments_and_strings(source: &str, language: Language) -> String {
    let syntax = syntax_for(language);
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut state = State::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &source[i..];
        let ch = rest.chars().next().unwrap_or(' ');

        match state {
            State::Normal => {
                if let Some(&(open, close)) = syntax
                    .block_delims
                    .iter()
                    .find(|(open, _)| rest.starts_with(open))
                {
                    push_blank(&mut out, open);
                    state = State::BlockComment {
                        open,
                        close,
                        depth: 1,
                    };
                    i += open.len();
                } else if let Some(prefix) = syntax
                    .line_prefixes
                    .iter()
                    .find(|p| rest.starts_with(**p))
                {
                    push_blank(&mut out, prefix);
                    state = State::LineComment;
                    i += prefix.len();
                } else if let Some(delim) = syntax
                    .string_delims
                    .iter()
                    .copied()
                    .find(|d| rest.starts_with(*d))
                {
                    out.push_str(delim);
                    state = State::InString { delim };
                    i += delim.len();
                } else {
                    out.push(ch);
                    i += ch.len_utf8();
                }
            }
            State::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = State::Normal;
                } else {
                    out.push(' ');
                }
                i += ch.len_utf8();
            }
            State::BlockComment { open, close, depth } => {
                if syntax.blocks_nest && rest.starts_with(open) {
                    push_blank(&mut out, open);
                    state = State::BlockComment {
                        open,
                        close,
                        depth: depth + 1,
                    };
                    i += open.len();
                } else if rest.starts_with(close) {
                    push_blank(&mut out, close);
                    if depth > 1 {
                        state = State::BlockComment {
                            open,
                            close,
                            depth: depth - 1,
                        };
                    } else {
                        state = State::Normal;
                    }
                    i += close.len();
                } else {
                    out.push(if ch == '\n' { '\n' } else { ' ' });
                    i += ch.len_utf8();
                }
            }
            State::InString { delim } => {
                if syntax.strings_escape && ch == '\\' {
                    // Blank the escape and whatever it escapes
                    out.push(' ');
                    i += 1;
                    if let Some(next) = source[i..].chars().next() {
                        out.push(if next == '\n' { '\n' } else { ' ' });
                        i += next.len_utf8();
                    }
                } else if rest.starts_with(delim) {
                    out.push_str(delim);
                    state = State::Normal;
                    i += delim.len();
                } else {
                    out.push(if ch == '\n' { '\n' } else { ' ' });
                    i += ch.len_utf8();
                }
            }
        }
    }

    out
}

fn push_blank(out: &mut String, token: &str) {
    for ch in token.chars() {
        out.push(if ch == '\n' { '\n' } else { ' ' });
    }
}
