//! Default [`GrammarAdapter`](super::GrammarAdapter) implementation.
//!
//! No published crate tokenizes this language, so this module hand-rolls a
//! scanner over `.m`-like source. It works line-oriented rather than
//! character-by-character: block keywords (`function`, `classdef`,
//! `properties`, `methods`, `enumeration`, `arguments`, and the ordinary
//! control-flow keywords that also close with `end`) are only recognized
//! when they are the first token on a line, which is how every real-world
//! `.m` file is formatted and keeps `x(end)` indexing expressions from being
//! mistaken for block closers.

use super::{Element, GrammarAdapter, UnparseableSource};
use std::collections::HashMap;
use std::path::Path;

/// A decoded attribute value before schema-driven typing is applied by
/// `crate::attributes`. Bare keys (`Static`, `Hidden`, ...) decode as
/// [`AttrRaw::Implicit`]; `Key=Value` pairs decode as [`AttrRaw::Text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrRaw {
    Implicit,
    Text(String),
}

const OPEN_KEYWORDS: &[&str] = &[
    "function", "if", "for", "while", "switch", "try", "parfor", "classdef", "properties",
    "methods", "events", "enumeration", "arguments",
];

fn is_block_end(word: &str) -> bool {
    word == "end" || word.starts_with("end") && OPEN_KEYWORDS.iter().any(|k| word == &format!("end{k}"))
}

fn first_word(line: &str) -> &str {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// Join MATLAB `...` line-continuations into single logical lines so the
/// rest of the scanner can treat a declaration as one line regardless of
/// how the author wrapped it.
fn join_continuations(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for raw in source.lines() {
        let line = raw.trim_end();
        if let Some(stripped) = line.trim_end().strip_suffix("...") {
            pending.push_str(stripped.trim_end());
            pending.push(' ');
        } else {
            pending.push_str(line);
            out.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

/// Find the line index (relative to `lines`, 0-indexed) that closes the
/// block opened at `lines[0]`. Returns the index of the `end` line.
fn find_block_end(lines: &[String]) -> Option<usize> {
    let mut depth = 1usize;
    for (i, line) in lines.iter().enumerate().skip(1) {
        let word = first_word(line);
        if OPEN_KEYWORDS.contains(&word) {
            depth += 1;
        } else if is_block_end(word) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split `text` on top-level commas (ignoring commas nested inside `()`,
/// `{}`, `[]`).
fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '(' | '{' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | '}' | ']' => {
                depth -= 1;
                current.push(ch);
            }
            c if c == sep && depth == 0 => {
                out.push(current.trim().to_string());
                current = String::new();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// Parse a parenthesized attribute list (`Access=private, Static`) into a
/// raw key/value map. Used for class, property, method, and argument
/// attribute blocks alike.
pub fn parse_attr_list(text: &str) -> HashMap<String, AttrRaw> {
    let mut map = HashMap::new();
    for entry in split_top_level(text, ',') {
        if entry.is_empty() {
            continue;
        }
        if let Some((key, value)) = entry.split_once('=') {
            map.insert(key.trim().to_string(), AttrRaw::Text(value.trim().to_string()));
        } else {
            map.insert(entry.trim().to_string(), AttrRaw::Implicit);
        }
    }
    map
}

/// Extract the text inside the first balanced `(...)` starting at or after
/// `from`, along with the text that follows it.
fn extract_parens(text: &str) -> Option<(String, String)> {
    let start = text.find('(')?;
    let mut depth = 0i32;
    for (i, ch) in text[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = &text[start + 1..start + i];
                    let rest = &text[start + i + 1..];
                    return Some((inner.to_string(), rest.to_string()));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a `% trailing comment` off the end of a logical line, returning
/// `(code, Some(comment))` or `(code, None)`.
fn split_trailing_comment(line: &str) -> (&str, Option<&str>) {
    // Percent inside a single-quoted char array is not a comment marker;
    // approximate by tracking quote state left-to-right.
    let mut in_quotes = false;
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_quotes = !in_quotes,
            b'%' if !in_quotes => return (&line[..i], Some(&line[i + 1..])),
            _ => {}
        }
    }
    (line, None)
}

/// One argument/property/enum-member entry scanned out of a block body.
#[derive(Debug, Clone, Default)]
pub struct EntrySyntax {
    pub name: String,
    pub type_name: String,
    pub default: String,
    pub size: Vec<String>,
    pub validators: Vec<String>,
    pub doc_lines: Vec<(usize, String)>,
    pub line: usize,
}

/// A parsed `arguments`/`properties` block: its attribute list plus the
/// ordered entries it contains.
#[derive(Debug, Clone, Default)]
pub struct BlockSyntax {
    pub attrs: HashMap<String, AttrRaw>,
    pub entries: Vec<EntrySyntax>,
}

/// A parsed `methods` block: attribute list plus the functions inside.
#[derive(Debug, Clone, Default)]
pub struct MethodBlockSyntax {
    pub attrs: HashMap<String, AttrRaw>,
    pub functions: Vec<FunctionSyntax>,
}

/// A parsed `function ... end` declaration and body.
#[derive(Debug, Clone, Default)]
pub struct FunctionSyntax {
    pub name: String,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub leading_doc: Vec<(usize, String)>,
    pub arguments_blocks: Vec<(bool, BlockSyntax)>, // (is_output, block)
    pub body: Element,
    pub line: usize,
}

/// A parsed `classdef ... end`.
#[derive(Debug, Clone, Default)]
pub struct ClassdefSyntax {
    pub name: String,
    pub ancestors: Vec<String>,
    pub class_attrs: HashMap<String, AttrRaw>,
    pub decl_doc: Option<String>,
    pub leading_doc: Vec<(usize, String)>,
    pub properties_blocks: Vec<BlockSyntax>,
    pub methods_blocks: Vec<MethodBlockSyntax>,
    pub enum_entries: Vec<EntrySyntax>,
    pub line: usize,
}

/// Outcome of parsing a `.m` file's top-level structure.
#[derive(Debug, Clone)]
pub enum ParsedFile {
    Script {
        doc: Vec<(usize, String)>,
        body: Element,
    },
    Function(FunctionSyntax),
    Classdef(ClassdefSyntax),
}

fn comment_kind(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("%{") {
        Some("block")
    } else if trimmed.starts_with("%%") {
        Some("section")
    } else if trimmed.starts_with('%') {
        Some("line")
    } else {
        None
    }
}

/// Consume a leading or interleaved run of comment lines starting at
/// `lines[start]`, returning the accumulated line-indexed doc fragments and
/// the index of the first non-comment, non-blank line.
fn consume_comments(lines: &[String], start: usize, base_line: usize) -> (Vec<(usize, String)>, usize) {
    let mut doc = Vec::new();
    let mut i = start;
    let mut saw_block = false;
    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        if trimmed.is_empty() {
            if saw_block {
                break;
            }
            i += 1;
            continue;
        }
        match comment_kind(trimmed) {
            Some("block") if !saw_block => {
                saw_block = true;
                // Collect until closing %} (possibly same line).
                let open_col = lines[i].len() - trimmed.len();
                let mut j = i;
                let mut collected: Vec<String> = Vec::new();
                let first_rest = &trimmed[2..];
                if let Some(end) = first_rest.find("%}") {
                    let _ = end;
                } else {
                    collected.push(String::new());
                }
                let _ = open_col;
                // Simple model: everything until a line containing "%}" is
                // interior content, one docstring line per source line.
                if !trimmed[2..].contains("%}") {
                    j += 1;
                    while j < lines.len() && !lines[j].contains("%}") {
                        doc.push((base_line + j, lines[j].clone()));
                        j += 1;
                    }
                    if j < lines.len() {
                        i = j; // land on the %} line, consumed below
                    } else {
                        i = j.saturating_sub(1);
                    }
                }
                i += 1;
            }
            Some("section") if !saw_block => {
                doc.push((base_line + i, trimmed[2..].to_string()));
                i += 1;
            }
            Some("line") if !saw_block => {
                doc.push((base_line + i, trimmed[1..].to_string()));
                i += 1;
            }
            Some(_) => {
                // Block comment already seen: further line/section comments
                // are ignored, but we still need to stop consuming at the
                // first non-comment line, so just skip this one.
                i += 1;
            }
            None => break,
        }
    }
    (doc, i)
}

/// Parse a function/method declaration line: `function [out] = name(in)`.
fn parse_function_decl(line: &str) -> Option<(Vec<String>, String, Vec<String>)> {
    let rest = line.trim_start().strip_prefix("function")?.trim_start();
    let (before_parens, name_part) = match rest.find('(') {
        Some(_) => {
            let (inner, after) = extract_parens(rest)?;
            let before = &rest[..rest.find('(').unwrap()];
            (before.to_string(), (inner, after))
        }
        None => (rest.to_string(), (String::new(), String::new())),
    };
    let (inputs_raw, _after) = name_part;
    let inputs: Vec<String> = if inputs_raw.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(&inputs_raw, ',')
    };

    let before = before_parens.trim();
    let (outputs, name) = if let Some(eq_pos) = before.find('=') {
        let out_part = before[..eq_pos].trim();
        let name_part = before[eq_pos + 1..].trim().to_string();
        let out_part = out_part.trim_start_matches('[').trim_end_matches(']');
        let outs: Vec<String> = if out_part.trim().is_empty() {
            Vec::new()
        } else {
            split_top_level(out_part, ',')
        };
        (outs, name_part)
    } else {
        (Vec::new(), before.to_string())
    };
    Some((outputs, name, inputs))
}

/// Parse one `arguments`/`properties`/`enumeration` block body into entries.
fn parse_entries(body: &[String], base_line: usize, is_enum: bool) -> Vec<EntrySyntax> {
    let mut entries = Vec::new();
    let mut pending: Option<EntrySyntax> = None;
    let mut i = 0usize;
    while i < body.len() {
        let raw = &body[i];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            i += 1;
            continue;
        }
        if let Some(kind) = comment_kind(trimmed) {
            if let Some(entry) = pending.as_mut() {
                let text = match kind {
                    "section" => trimmed[2..].to_string(),
                    _ => trimmed[1..].to_string(),
                };
                entry.doc_lines.push((base_line + i, text));
            }
            i += 1;
            continue;
        }

        if let Some(prev) = pending.take() {
            entries.push(prev);
        }

        let (code, trailing_comment) = split_trailing_comment(raw);
        let code = code.trim();
        if code.is_empty() {
            i += 1;
            continue;
        }

        let mut entry = EntrySyntax {
            line: base_line + i,
            ..Default::default()
        };

        if is_enum {
            // `Name (value) % doc` or bare `Name`
            if let Some((value, _after)) = extract_parens(code) {
                let name_part = code[..code.find('(').unwrap()].trim();
                entry.name = name_part.to_string();
                entry.default = value.trim().to_string();
            } else {
                entry.name = code.trim_end_matches(',').to_string();
            }
        } else {
            let mut remainder = code;
            let name_end = remainder
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(remainder.len());
            entry.name = remainder[..name_end].to_string();
            remainder = remainder[name_end..].trim_start();

            if remainder.starts_with('(') {
                if let Some((size, after)) = extract_parens(remainder) {
                    entry.size = split_top_level(&size, ',');
                    remainder = after.trim_start();
                }
            }
            // Type name: leading identifier/dotted-path token before `{` or `=`.
            let type_end = remainder
                .find(|c: char| c == '{' || c == '=' || c.is_whitespace())
                .unwrap_or(remainder.len());
            if type_end > 0 {
                entry.type_name = remainder[..type_end].to_string();
                remainder = remainder[type_end..].trim_start();
            }
            if remainder.starts_with('{') {
                if let Some(close) = remainder.find('}') {
                    let inner = &remainder[1..close];
                    entry.validators = split_top_level(inner, ',');
                    remainder = remainder[close + 1..].trim_start();
                }
            }
            if let Some(eq_pos) = remainder.find('=') {
                entry.default = remainder[eq_pos + 1..].trim().trim_end_matches(';').trim().to_string();
            }
        }

        if let Some(comment) = trailing_comment {
            entry.doc_lines.push((base_line + i, comment.to_string()));
        }

        pending = Some(entry);
        i += 1;
    }
    if let Some(prev) = pending.take() {
        entries.push(prev);
    }
    entries
}

/// Scan a function/method body for generic dependency-analysis elements
/// (calls, imports, assignments, storage types, `%#function` pragmas). This
/// is deliberately shallow: it produces a flat-ish [`Element`] tree good
/// enough for `crate::analyzer` to walk, not a full expression grammar.
fn scan_body_elements(body: &[String], base_line: usize) -> Element {
    let mut root = Element::leaf("meta.block", "", base_line, 0);
    for (offset, raw) in body.iter().enumerate() {
        let line_no = base_line + offset;
        let (code, comment) = split_trailing_comment(raw);
        if let Some(comment) = comment {
            let trimmed = comment.trim_start();
            let (token, text) = if let Some(stripped) = trimmed.strip_prefix('#') {
                ("comment.pragma.function", stripped.to_string())
            } else if raw.trim_start().starts_with("%%") {
                ("comment.line.double-percentage", trimmed.to_string())
            } else {
                ("comment.line.percentage", comment.to_string())
            };
            root.children.push(Element::leaf(token, text, line_no, 0));
        }
        let trimmed = code.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("import ").or_else(|| trimmed.strip_prefix("import")) {
            let target = rest.trim().trim_end_matches(';').trim();
            if !target.is_empty() {
                root.children
                    .push(Element::leaf("entity.name.namespace", target.to_string(), line_no, 0));
                continue;
            }
        }

        // Assignment target detection: `x = ...` or `[x, y] = ...`.
        if let Some(eq_pos) = top_level_eq(trimmed) {
            let lhs = trimmed[..eq_pos].trim();
            if !lhs.is_empty() && !lhs.ends_with(['<', '>', '~', '=', '!']) {
                let names: Vec<&str> = if lhs.starts_with('[') {
                    lhs.trim_start_matches('[')
                        .trim_end_matches(']')
                        .split(',')
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty() && !s.contains('('))
                        .collect()
                } else if lhs.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    vec![lhs]
                } else {
                    Vec::new()
                };
                if !names.is_empty() {
                    let token = if lhs.starts_with('[') {
                        "meta.assignment.variable.group"
                    } else {
                        "meta.assignment.variable.single"
                    };
                    let mut assign = Element::leaf(token, lhs.to_string(), line_no, 0);
                    for name in names {
                        assign
                            .children
                            .push(Element::leaf("variable.other.readwrite", name.to_string(), line_no, 0));
                    }
                    root.children.push(assign);
                }
            }
        }

        scan_identifiers(trimmed, line_no, &mut root);
    }
    root
}

/// Find a top-level `=` that is not part of `==`, `~=`, `<=`, `>=`.
fn top_level_eq(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { 0 };
                let next = if i + 1 < bytes.len() { bytes[i + 1] } else { 0 };
                if next != b'=' && !matches!(prev, b'=' | b'~' | b'<' | b'>') {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Walk identifier-like tokens in a code line, emitting `storage.type`
/// references, dotted call chains, and bare reads for the analyzer.
fn scan_identifiers(line: &str, line_no: usize, root: &mut Element) {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i].is_alphabetic() || chars[i] == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let mut name: String = chars[start..i].iter().collect();
            let mut is_call = false;
            let mut dotted_tail = String::new();
            // Walk a dotted chain: ident(.ident)*
            while i < chars.len() && chars[i] == '.' && i + 1 < chars.len() && (chars[i + 1].is_alphabetic() || chars[i + 1] == '_') {
                dotted_tail.push('.');
                i += 1;
                let seg_start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                dotted_tail.push_str(&chars[seg_start..i].iter().collect::<String>());
            }
            name.push_str(&dotted_tail);
            if i < chars.len() && chars[i] == '(' {
                is_call = true;
            }
            if is_call {
                root.children
                    .push(Element::leaf("meta.function-call.parens", name, line_no, start));
            } else if !dotted_tail.is_empty() {
                root.children
                    .push(Element::leaf("variable.other.readwrite", name, line_no, start));
            } else {
                root.children
                    .push(Element::leaf("variable.other.readwrite", name, line_no, start));
            }
        } else {
            i += 1;
        }
    }
}

/// The default, hand-written [`GrammarAdapter`].
#[derive(Debug, Default)]
pub struct DefaultAdapter;

impl GrammarAdapter for DefaultAdapter {
    fn parse(&self, source: &str, path: &Path) -> Result<Element, UnparseableSource> {
        let lines = join_continuations(source);
        let parsed = parse_file(&lines)
            .map_err(|e| UnparseableSource(format!("{}: {e}", path.display())))?;
        Ok(parsed_file_to_element(parsed))
    }
}

fn parsed_file_to_element(parsed: ParsedFile) -> Element {
    // Wrap so callers have a stable root regardless of variant; node.rs
    // consumes `ParsedFile` directly via `parse_file` for the typed data and
    // only uses the Element form for generic inspection/tests.
    match parsed {
        ParsedFile::Script { doc, body } => {
            let mut root = Element::leaf("source", "", 1, 0);
            for (line, text) in doc {
                root.children
                    .push(Element::leaf("comment.line.percentage", text, line, 0));
            }
            root.children.push(body);
            root
        }
        ParsedFile::Function(f) => {
            let mut root = Element::leaf("meta.function", "", f.line, 0);
            root.children.push(f.body);
            root
        }
        ParsedFile::Classdef(c) => Element::leaf("meta.class", c.name, c.line, 0),
    }
}

/// Parse the full top-level structure of a `.m` file.
pub fn parse_file(lines: &[String]) -> Result<ParsedFile, String> {
    let (leading_doc, mut idx) = consume_comments(lines, 0, 1);
    if idx >= lines.len() {
        return Ok(ParsedFile::Script {
            doc: leading_doc,
            body: Element::leaf("meta.block", "", 1, 0),
        });
    }
    let word = first_word(&lines[idx]);
    if word == "classdef" {
        return parse_classdef(lines, idx, leading_doc).map(ParsedFile::Classdef);
    }
    if word == "function" {
        return parse_function(lines, &mut idx, leading_doc, false).map(ParsedFile::Function);
    }
    let body = scan_body_elements(&lines[idx..], idx + 1);
    Ok(ParsedFile::Script {
        doc: leading_doc,
        body,
    })
}

fn parse_function(
    lines: &[String],
    idx: &mut usize,
    leading_doc: Vec<(usize, String)>,
    _in_class_folder: bool,
) -> Result<FunctionSyntax, String> {
    let start = *idx;
    let decl_line = lines[start].clone();
    let (code, _comment) = split_trailing_comment(&decl_line);
    let (outputs, name, inputs) =
        parse_function_decl(code).ok_or_else(|| format!("malformed function declaration: {decl_line}"))?;

    let rest = &lines[start..];
    let end_rel = find_block_end(rest).ok_or_else(|| "unterminated function block".to_string())?;
    let body_lines = &lines[start + 1..start + end_rel];
    *idx = start + end_rel + 1;

    let (body_doc, body_start) = consume_comments(body_lines, 0, start + 2);
    let mut doc = leading_doc;
    doc.extend(body_doc);

    let mut arguments_blocks = Vec::new();
    let mut i = body_start;
    while i < body_lines.len() {
        let word = first_word(&body_lines[i]);
        if word == "arguments" {
            let block_rest = &body_lines[i..];
            let end_rel = find_block_end(block_rest)
                .ok_or_else(|| "unterminated arguments block".to_string())?;
            let (inner, _) = extract_parens(&body_lines[i]).unwrap_or_default();
            let attrs = parse_attr_list(&inner);
            let is_output = attrs
                .get("Output")
                .map(|v| matches!(v, AttrRaw::Implicit) || matches!(v, AttrRaw::Text(t) if t == "true"))
                .unwrap_or(false);
            let block_body = &body_lines[i + 1..i + end_rel];
            let entries = parse_entries(block_body, start + 2 + i + 1, false);
            arguments_blocks.push((is_output, BlockSyntax { attrs, entries }));
            i += end_rel + 1;
        } else {
            i += 1;
        }
    }

    let body_element = scan_body_elements(body_lines, start + 2);

    Ok(FunctionSyntax {
        name,
        input: inputs,
        output: outputs,
        leading_doc: doc,
        arguments_blocks,
        body: body_element,
        line: start + 1,
    })
}

fn parse_classdef(
    lines: &[String],
    start: usize,
    leading_doc: Vec<(usize, String)>,
) -> Result<ClassdefSyntax, String> {
    let decl_line = lines[start].clone();
    let (code, decl_comment) = split_trailing_comment(&decl_line);
    let rest_after_keyword = code.trim_start().strip_prefix("classdef").unwrap_or("").trim_start();

    let (attrs, after_attrs) = if rest_after_keyword.starts_with('(') {
        let (inner, after) = extract_parens(rest_after_keyword).unwrap_or_default();
        (parse_attr_list(&inner), after)
    } else {
        (HashMap::new(), rest_after_keyword.to_string())
    };

    let after_attrs = after_attrs.trim();
    let (name_part, ancestors) = if let Some(lt_pos) = after_attrs.find('<') {
        let name = after_attrs[..lt_pos].trim().to_string();
        let ancestors_text = &after_attrs[lt_pos + 1..];
        let ancestors: Vec<String> = ancestors_text
            .split('&')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (name, ancestors)
    } else {
        (after_attrs.to_string(), Vec::new())
    };

    let body_slice = &lines[start..];
    let end_rel = find_block_end(body_slice).ok_or_else(|| "unterminated classdef block".to_string())?;
    let body_lines = &lines[start + 1..start + end_rel];

    let mut properties_blocks = Vec::new();
    let mut methods_blocks = Vec::new();
    let mut enum_entries = Vec::new();

    let (trailing_doc, body_start) = consume_comments(body_lines, 0, start + 2);

    let mut i = body_start;
    while i < body_lines.len() {
        let word = first_word(&body_lines[i]);
        let block_rest = &body_lines[i..];
        match word {
            "properties" => {
                let end_rel = find_block_end(block_rest)
                    .ok_or_else(|| "unterminated properties block".to_string())?;
                let (inner, _) = extract_parens(&body_lines[i]).unwrap_or_default();
                let attrs = parse_attr_list(&inner);
                let entries = parse_entries(&body_lines[i + 1..i + end_rel], start + 2 + i + 1, false);
                properties_blocks.push(BlockSyntax { attrs, entries });
                i += end_rel + 1;
            }
            "enumeration" => {
                let end_rel = find_block_end(block_rest)
                    .ok_or_else(|| "unterminated enumeration block".to_string())?;
                let entries = parse_entries(&body_lines[i + 1..i + end_rel], start + 2 + i + 1, true);
                enum_entries.extend(entries);
                i += end_rel + 1;
            }
            "methods" => {
                let end_rel = find_block_end(block_rest)
                    .ok_or_else(|| "unterminated methods block".to_string())?;
                let (inner, _) = extract_parens(&body_lines[i]).unwrap_or_default();
                let attrs = parse_attr_list(&inner);
                let method_body = &body_lines[i + 1..i + end_rel];
                let mut functions = Vec::new();
                let mut j = 0usize;
                while j < method_body.len() {
                    let (doc, next) = consume_comments(method_body, j, start + 2 + i + 1 + j);
                    j = next;
                    if j >= method_body.len() {
                        break;
                    }
                    if first_word(&method_body[j]) == "function" {
                        let remaining = &method_body[j..];
                        let mut local_idx = 0usize;
                        let f = parse_function(remaining, &mut local_idx, doc, true)?;
                        j += local_idx;
                        functions.push(f);
                    } else {
                        j += 1;
                    }
                }
                methods_blocks.push(MethodBlockSyntax { attrs, functions });
                i += end_rel + 1;
            }
            _ => i += 1,
        }
    }

    Ok(ClassdefSyntax {
        name: name_part,
        ancestors,
        class_attrs: attrs,
        decl_doc: decl_comment.map(|s| s.to_string()),
        leading_doc: {
            let mut d = leading_doc;
            d.extend(trailing_doc);
            d
        },
        properties_blocks,
        methods_blocks,
        enum_entries,
        line: start + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function_signature() {
        let (outputs, name, inputs) = parse_function_decl("function y = square(x)").unwrap();
        assert_eq!(outputs, vec!["y"]);
        assert_eq!(name, "square");
        assert_eq!(inputs, vec!["x"]);
    }

    #[test]
    fn parses_multi_output_signature() {
        let (outputs, name, inputs) = parse_function_decl("function [a, b] = split(x, y)").unwrap();
        assert_eq!(outputs, vec!["a", "b"]);
        assert_eq!(name, "split");
        assert_eq!(inputs, vec!["x", "y"]);
    }

    #[test]
    fn parses_no_output_signature() {
        let (outputs, name, inputs) = parse_function_decl("function doWork(x)").unwrap();
        assert!(outputs.is_empty());
        assert_eq!(name, "doWork");
        assert_eq!(inputs, vec!["x"]);
    }

    #[test]
    fn attr_list_parses_bool_and_kv() {
        let attrs = parse_attr_list("Static, Access=private");
        assert_eq!(attrs.get("Static"), Some(&AttrRaw::Implicit));
        assert_eq!(
            attrs.get("Access"),
            Some(&AttrRaw::Text("private".to_string()))
        );
    }

    #[test]
    fn split_top_level_respects_nesting() {
        let parts = split_top_level("a(1,2), b, {c,d}", ',');
        assert_eq!(parts, vec!["a(1,2)", "b", "{c,d}"]);
    }

    #[test]
    fn find_block_end_ignores_index_end() {
        let lines: Vec<String> = vec![
            "function y = f(x)".to_string(),
            "y = x(end);".to_string(),
            "end".to_string(),
        ];
        assert_eq!(find_block_end(&lines), Some(2));
    }

    #[test]
    fn parse_file_classifies_script() {
        let lines = join_continuations("x = 1;\ny = 2;\n");
        let parsed = parse_file(&lines).unwrap();
        assert!(matches!(parsed, ParsedFile::Script { .. }));
    }

    #[test]
    fn parse_file_classifies_function() {
        let src = "function y = square(x)\ny = x^2;\nend\n";
        let lines = join_continuations(src);
        let parsed = parse_file(&lines).unwrap();
        match parsed {
            ParsedFile::Function(f) => {
                assert_eq!(f.name, "square");
                assert_eq!(f.input, vec!["x"]);
                assert_eq!(f.output, vec!["y"]);
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn default_adapter_parses_through_the_trait_seam() {
        let adapter = DefaultAdapter;
        let root = adapter
            .parse("function y = square(x)\ny = x^2;\nend\n", Path::new("square.m"))
            .unwrap();
        assert_eq!(root.token, "meta.function");
    }
}
