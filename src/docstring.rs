//! Docstring extraction.
//!
//! [`crate::grammar::lexer`] already accumulates the raw comment lines that
//! precede (or, for `arguments`/`properties` entries, trail) a declaration
//! as `(line, text)` pairs. This module applies the precedence and
//! indentation rules from the original `matlab.utils` helpers to turn that
//! raw run into a single normalized docstring: a block comment (`%{ ... %}`)
//! wins outright over any line/section comments also present; line and
//! section comments are otherwise concatenated in order; and the combined
//! text has its common leading indentation stripped.

/// Build a docstring from a comment run already extracted by the lexer.
///
/// `lines` is `(source_line, text_after_comment_marker)` in source order.
/// Returns `None` if the run is empty or entirely blank.
pub fn extract(lines: &[(usize, String)]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let joined: Vec<&str> = lines.iter().map(|(_, text)| text.as_str()).collect();
    let combined = joined.join("\n");
    let fixed = fix_indentation(&combined);
    if fixed.trim().is_empty() {
        None
    } else {
        Some(fixed)
    }
}

/// Strip the common leading whitespace shared by every non-blank line, the
/// way the original `fix_indentation` does: blank lines don't count toward
/// the minimum and are left untouched.
pub fn fix_indentation(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.chars().skip(min_indent).collect()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
