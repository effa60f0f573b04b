//! Cross-file dependency analysis.
//!
//! Every node with a body (scripts, functions, methods) gets its `calls`,
//! `imports`, `builtin_dependencies`, `dependencies`, `dependants`, and
//! `unresolved_dependencies` header fields filled in by walking the generic
//! [`Element`](crate::grammar::Element) tree the grammar adapter produced
//! for that body. Resolution of a referenced name to a database member is
//! the caller's job: [`crate::path::PathEngine::resolve_dependencies`]
//! builds, per body, the local-namespace stack that name resolution needs
//! (the file's own directory plus the directories its imports resolved to)
//! and passes in the already-resolved `name -> path` map this module
//! consults. That keeps shadowing precedence and private-folder scoping
//! exactly as `PathEngine::resolve` enforces them everywhere else, instead
//! of this module re-deriving them against a flattened snapshot.
//!
//! One deliberate deviation from what the original source's comments claim
//! about import precedence is recorded in DESIGN.md: imports here resolve
//! in declaration order, first import wins, not reversed.

use crate::builtins::BuiltinReference;
use crate::grammar::Element;
use crate::node::{Node, NodeHeader};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Names assigned to anywhere in a body, used to tell a same-named
/// `foo(...)` apart as indexing (`foo` is a variable) rather than a call.
pub(crate) fn collect_locals(body: &Element) -> HashSet<String> {
    let mut locals = HashSet::new();
    for el in body.flatten() {
        if el.token == "meta.assignment.variable.single" || el.token == "meta.assignment.variable.group" {
            for child in &el.children {
                if child.token == "variable.other.readwrite" {
                    locals.insert(child.content.clone());
                }
            }
        }
    }
    locals
}

/// Extracted, ordered, deduplicated references out of a body: calls in
/// first-occurrence order and imports in declaration order.
pub(crate) struct ExtractedRefs {
    pub(crate) calls: Vec<String>,
    pub(crate) imports: Vec<String>,
}

pub(crate) fn extract_refs(body: &Element, locals: &HashSet<String>) -> ExtractedRefs {
    let mut calls = Vec::new();
    let mut seen_calls = HashSet::new();
    let mut imports = Vec::new();
    let mut seen_imports = HashSet::new();

    for el in body.flatten() {
        match el.token.as_str() {
            "meta.function-call.parens" => {
                if locals.contains(&el.content) {
                    continue;
                }
                if seen_calls.insert(el.content.clone()) {
                    calls.push(el.content.clone());
                }
            }
            "entity.name.namespace" => {
                if seen_imports.insert(el.content.clone()) {
                    imports.push(el.content.clone());
                }
            }
            _ => {}
        }
    }

    ExtractedRefs { calls, imports }
}

/// Populate a node's dependency-analysis header fields from its parsed
/// body. `resolved` maps every name this body references (call or import,
/// bare or dotted) to the path [`crate::path::PathEngine::resolve`] found
/// for it using that body's own local-namespace stack; a name absent from
/// the map simply didn't resolve. `builtins` is the loaded built-in
/// reference set.
pub fn analyze(node: &mut Node, body: &Element, resolved: &HashMap<String, PathBuf>, builtins: &BuiltinReference) {
    analyze_header(node.header_mut(), body, resolved, builtins)
}

/// Same as [`analyze`] but works directly on a header, for sub-entities
/// (class methods) that aren't independently addressable database members
/// and so are never wrapped in a [`Node`] of their own.
pub fn analyze_header(header: &mut NodeHeader, body: &Element, resolved: &HashMap<String, PathBuf>, builtins: &BuiltinReference) {
    let locals = collect_locals(body);
    let refs = extract_refs(body, &locals);

    let mut dependencies = Vec::new();
    let mut builtin_dependencies = Vec::new();
    let mut unresolved = Vec::new();
    let mut seen_builtins = HashSet::new();

    for call in &refs.calls {
        if let Some(path) = resolved.get(call) {
            if !dependencies.contains(path) {
                dependencies.push(path.clone());
            }
        } else if builtins.contains(call) {
            if seen_builtins.insert(call.clone()) {
                builtin_dependencies.push(call.clone());
            }
        } else {
            unresolved.push(call.clone());
        }
    }

    for import in &refs.imports {
        if let Some(path) = resolved.get(import) {
            if !dependencies.contains(path) {
                dependencies.push(path.clone());
            }
        }
    }

    header.calls = refs.calls;
    header.imports = refs.imports;
    header.builtin_dependencies = builtin_dependencies;
    header.dependencies = dependencies;
    header.unresolved_dependencies = unresolved;
}

/// Second pass: once every node in a group has had `analyze` run, populate
/// each node's `dependants` by inverting the `dependencies` edges.
pub fn link_dependants(nodes: &mut HashMap<PathBuf, Node>) {
    let edges: Vec<(PathBuf, PathBuf)> = nodes
        .iter()
        .flat_map(|(path, node)| {
            node.header()
                .dependencies
                .iter()
                .map(move |dep| (dep.clone(), path.clone()))
        })
        .collect();

    for (dependency_path, dependant_path) in edges {
        if let Some(dependency_node) = nodes.get_mut(&dependency_path) {
            let dependants = &mut dependency_node.header_mut().dependants;
            if !dependants.contains(&dependant_path) {
                dependants.push(dependant_path);
            }
        }
    }
}
