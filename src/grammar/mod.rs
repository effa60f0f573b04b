//! Grammar adapter seam.
//!
//! The indexer treats the tokenizer as an external collaborator: something
//! that turns a `.m`-like source file into a tree of typed elements, each
//! carrying a grammar-scope label (`meta.class`, `entity.name.function`,
//! `comment.line.percentage`, ...) and the absolute source position of its
//! first character. [`GrammarAdapter`] is the trait that seam is built on;
//! [`lexer::DefaultAdapter`] is the concrete implementation this crate
//! ships, since no published crate tokenizes this grammar.

pub mod lexer;

/// One node in a parsed source file's element tree.
///
/// `token` is the grammar-scope label (e.g. `"meta.function.declaration"`).
/// `content` is the concatenated source text the element spans. `line`/
/// `column` locate the element's first character (1-indexed line, 0-indexed
/// column), from which the position of any interior line can be derived by
/// counting newlines in `content`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub token: String,
    pub content: String,
    pub line: usize,
    pub column: usize,
    pub children: Vec<Element>,
}

impl Element {
    /// Create a leaf element (no children).
    pub fn leaf(token: impl Into<String>, content: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            token: token.into(),
            content: content.into(),
            line,
            column,
            children: Vec::new(),
        }
    }

    /// The 1-indexed source line of the element's first character.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The source line of the character at `byte_offset` within `content`.
    pub fn line_at_offset(&self, byte_offset: usize) -> usize {
        let slice = &self.content[..byte_offset.min(self.content.len())];
        self.line + slice.matches('\n').count()
    }

    /// Direct children whose token matches one of `tokens`.
    pub fn children_matching(&self, tokens: &[&str]) -> impl Iterator<Item = &Element> {
        self.children
            .iter()
            .filter(move |c| tokens.contains(&c.token.as_str()))
    }

    /// Descendants at an exact depth below this element (depth 1 = direct
    /// children, depth 2 = grandchildren, ...).
    pub fn at_depth(&self, depth: usize) -> Vec<&Element> {
        if depth == 0 {
            return vec![self];
        }
        let mut out = Vec::new();
        for child in &self.children {
            out.extend(child.at_depth(depth - 1));
        }
        out
    }

    /// Depth-bounded, token-filtered traversal: collects descendants up to
    /// `max_depth` whose token is in `tokens`, but never recurses past a
    /// descendant whose token is in `stop_tokens` (that descendant's own
    /// subtree is skipped, though the descendant itself is still tested
    /// against `tokens`).
    pub fn find_bounded<'a>(
        &'a self,
        tokens: &[&str],
        stop_tokens: &[&str],
        max_depth: usize,
    ) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.find_bounded_inner(tokens, stop_tokens, max_depth, &mut out);
        out
    }

    fn find_bounded_inner<'a>(
        &'a self,
        tokens: &[&str],
        stop_tokens: &[&str],
        remaining_depth: usize,
        out: &mut Vec<&'a Element>,
    ) {
        for child in &self.children {
            if tokens.contains(&"*") || tokens.contains(&child.token.as_str()) {
                out.push(child);
            }
            if stop_tokens.contains(&"*") || stop_tokens.contains(&child.token.as_str()) {
                continue;
            }
            if remaining_depth > 1 {
                child.find_bounded_inner(tokens, stop_tokens, remaining_depth - 1, out);
            }
        }
    }

    /// Full pre-order flattening of this element's subtree (self excluded),
    /// used by the dependency analyzer to scan for call-site tail patterns
    /// irrespective of nesting depth.
    pub fn flatten(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.flatten_inner(&mut out);
        out
    }

    fn flatten_inner<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            out.push(child);
            child.flatten_inner(out);
        }
    }
}

/// Error returned when a source file cannot be parsed at all.
///
/// Never fatal to a directory scan: the caller skips the member and logs a
/// warning.
#[derive(Debug, thiserror::Error)]
#[error("unparseable source: {0}")]
pub struct UnparseableSource(pub String);

/// Capability interface for turning a source file into an [`Element`] tree.
///
/// Any implementation that yields the grammar scopes this crate's node
/// builder expects is acceptable; the rest of the crate treats unrecognized
/// scopes as ignorable rather than erroring.
pub trait GrammarAdapter {
    /// Parse `source` (the contents of a file at `path`, used only for
    /// diagnostics) into a root [`Element`] whose children are the typed
    /// top-level content elements.
    fn parse(&self, source: &str, path: &std::path::Path) -> Result<Element, UnparseableSource>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut root = Element::leaf("root", "", 1, 0);
        let mut a = Element::leaf("a", "", 1, 0);
        a.children.push(Element::leaf("b", "x", 2, 0));
        root.children.push(a);
        root.children.push(Element::leaf("c", "y", 3, 0));
        root
    }

    #[test]
    fn at_depth_collects_grandchildren() {
        let root = sample();
        assert_eq!(root.at_depth(1).len(), 2);
        assert_eq!(root.at_depth(2).len(), 1);
        assert_eq!(root.at_depth(2)[0].token, "b");
    }

    #[test]
    fn find_bounded_respects_stop_tokens() {
        let root = sample();
        let found = root.find_bounded(&["b"], &["a"], 5);
        assert!(found.is_empty(), "should not recurse past stop token a");
    }

    #[test]
    fn flatten_visits_every_descendant() {
        let root = sample();
        let flat = root.flatten();
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn line_at_offset_counts_newlines() {
        let el = Element::leaf("x", "one\ntwo\nthree", 10, 0);
        assert_eq!(el.line_at_offset(0), 10);
        assert_eq!(el.line_at_offset(4), 11);
        assert_eq!(el.line_at_offset(9), 12);
    }
}
