//! Node construction, grounded on the original `matlab.parser`
//! module's `get_node` dispatch.
//!
//! `build_node` is the single entry point the path engine calls for every
//! file or directory it discovers while walking a search-path root. It
//! decides what kind of [`Node`] (if any) a filesystem entry produces,
//! parses file contents through [`crate::grammar::lexer`], and applies the
//! attribute/docstring decoders. A build failure (bad syntax, I/O error) is
//! never propagated as a [`crate::error::IndexError`]: it is logged and the
//! entry is skipped, matching `addpath`'s original behavior of silently
//! dropping members whose node it could not build.

use crate::attributes::{ArgumentAttributes, ClassdefAttributes, MethodAttributes, PropertyAttributes};
use crate::config::IndexerConfig;
use crate::docstring;
use crate::grammar::lexer::{self, BlockSyntax, EntrySyntax, FunctionSyntax};
use crate::grammar::Element;
use crate::node::{Argument, Classdef, EnumMember, Function, Method, Node, NodeHeader, Package, Property};
use std::path::{Path, PathBuf};

/// One body pending dependency analysis: the owning top-level node's path,
/// which slot it belongs to (the node itself, or the Nth method of a
/// classdef), and the scanned element tree.
#[derive(Debug, Clone)]
pub enum BodySlot {
    Own,
    Method(usize),
}

pub type PendingBody = (BodySlot, Element);

/// Join a namespace prefix and a short name into a fully qualified domain
/// name, matching `_fully_qualified_domain_name` in the original parser.
fn join_fqdm(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Build whatever [`Node`] the filesystem entry at `path` represents, or
/// `None` if it isn't a node-producing entry at all (a plain directory, a
/// `private` folder, an unrecognized extension). Discards any bodies that
/// would otherwise feed dependency analysis; callers that need those (the
/// path engine) should use [`build_node_with_bodies`] instead.
pub fn build_node(path: &Path, fqdm_prefix: &str, parent: Option<PathBuf>, config: &IndexerConfig) -> Option<Node> {
    let mut bodies = Vec::new();
    build_node_with_bodies(path, fqdm_prefix, parent, config, &mut bodies)
}

/// Same as [`build_node`], but also appends every analyzable body (script
/// content, function bodies, method bodies) found while building this node
/// to `bodies`, tagged with the [`BodySlot`] it belongs to.
pub fn build_node_with_bodies(
    path: &Path,
    fqdm_prefix: &str,
    parent: Option<PathBuf>,
    config: &IndexerConfig,
    bodies: &mut Vec<PendingBody>,
) -> Option<Node> {
    if path.is_dir() {
        return build_dir_node(path, fqdm_prefix, parent, config, bodies);
    }
    build_file_node(path, fqdm_prefix, parent, config, bodies)
}

fn build_dir_node(
    path: &Path,
    fqdm_prefix: &str,
    parent: Option<PathBuf>,
    config: &IndexerConfig,
    bodies: &mut Vec<PendingBody>,
) -> Option<Node> {
    let stem = path.file_stem()?.to_string_lossy().to_string();

    if let Some(short) = stem.strip_prefix('+') {
        let fqdm = join_fqdm(fqdm_prefix, short);
        let header = NodeHeader {
            parent,
            ..NodeHeader::new(short, path.to_path_buf(), fqdm)
        };
        return Some(Node::Package(Package {
            header,
            members: Vec::new(),
        }));
    }

    if let Some(short) = stem.strip_prefix('@') {
        return build_class_folder(path, short, fqdm_prefix, parent, config, bodies);
    }

    // `private` folders and ordinary subdirectories are not node-producing;
    // the path engine decides how to recurse into them.
    None
}

/// Build a class-folder classdef: parse `Name.m` if present, otherwise
/// synthesize an empty classdef whose methods come entirely from sibling
/// `.m` files in the folder. The original parser inverted this existence
/// check (`if not class_definition.exists(): parse(...)`, a bug); this
/// builder implements the corrected behavior.
fn build_class_folder(
    path: &Path,
    short: &str,
    fqdm_prefix: &str,
    parent: Option<PathBuf>,
    config: &IndexerConfig,
    bodies: &mut Vec<PendingBody>,
) -> Option<Node> {
    let fqdm = join_fqdm(fqdm_prefix, short);
    let class_file = path.join(format!("{short}.m"));

    let mut classdef = if class_file.exists() {
        match build_file_node(&class_file, fqdm_prefix, Some(path.to_path_buf()), config, bodies) {
            Some(Node::Classdef(c)) => c,
            _ => {
                log::warn!("class folder {}: {} did not parse as a classdef", path.display(), class_file.display());
                empty_classdef(short, path, fqdm.clone(), parent.clone())
            }
        }
    } else {
        empty_classdef(short, path, fqdm.clone(), parent.clone())
    };

    // Class-folder methods: any other top-level .m file is an additional
    // public method, unless it lives under a `private` subfolder (handled
    // by the path engine's local namespace registration instead).
    let Ok(entries) = walkdir::WalkDir::new(path).min_depth(1).max_depth(1).into_iter().collect::<std::result::Result<Vec<_>, _>>() else {
        return Some(Node::Classdef(classdef));
    };
    for entry in entries {
        let entry_path = entry.into_path();
        if entry_path == class_file || !entry_path.is_file() {
            continue;
        }
        if entry_path.extension().and_then(|e| e.to_str()) != Some("m") {
            continue;
        }
        let mut method_bodies = Vec::new();
        if let Some(Node::Function(f)) = build_file_node(&entry_path, &fqdm, Some(path.to_path_buf()), config, &mut method_bodies) {
            let method_index = classdef.methods.len();
            let mut input = f.input;
            if f.header.name != short && !input.is_empty() {
                input.remove(0);
            }
            classdef.methods.push(Method {
                header: f.header,
                input,
                output: f.output,
                options: f.options,
                access: "public".to_string(),
                abstract_: false,
                static_: false,
                sealed: false,
                hidden: false,
                is_test: false,
            });
            for (_, body) in method_bodies {
                bodies.push((BodySlot::Method(method_index), body));
            }
        }
    }

    Some(Node::Classdef(classdef))
}

fn empty_classdef(short: &str, path: &Path, fqdm: String, parent: Option<PathBuf>) -> Classdef {
    Classdef {
        header: NodeHeader {
            parent,
            ..NodeHeader::new(short, path.to_path_buf(), fqdm)
        },
        ..Default::default()
    }
}

fn build_file_node(
    path: &Path,
    fqdm_prefix: &str,
    parent: Option<PathBuf>,
    config: &IndexerConfig,
    bodies: &mut Vec<PendingBody>,
) -> Option<Node> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    let stem = path.file_stem()?.to_string_lossy().to_string();
    let fqdm = join_fqdm(fqdm_prefix, &stem);

    if extension == "m" {
        return build_m_file(path, &stem, fqdm, parent, bodies);
    }

    if !config.opaque_extension(&extension) {
        return None;
    }

    match extension.as_str() {
        "mlx" => Some(Node::LiveScript(NodeHeader {
            parent,
            ..NodeHeader::new(stem, path.to_path_buf(), fqdm)
        })),
        "mlapp" => Some(Node::App(NodeHeader {
            parent,
            ..NodeHeader::new(stem, path.to_path_buf(), fqdm)
        })),
        ext if ext.starts_with("mex") || ext == "p" => Some(Node::Mex(NodeHeader {
            parent,
            ..NodeHeader::new(stem, path.to_path_buf(), fqdm)
        })),
        _ => None,
    }
}

/// Read and docstring-extract a package folder's `Contents.m`, if present.
/// Returns `None` on any read/parse failure or if the file carries no
/// recognizable leading comment block; the caller logs nothing special for
/// this since a package without a `Contents.m` header is routine, not an
/// error.
pub fn package_docstring(contents_path: &Path) -> Option<String> {
    let source = std::fs::read_to_string(contents_path).ok()?;
    let lines = lexer::join_continuations(&source);
    match lexer::parse_file(&lines) {
        Ok(lexer::ParsedFile::Script { doc, .. }) => docstring::extract(&doc),
        Ok(_) => None,
        Err(e) => {
            log::warn!("unparseable package header {}: {e}", contents_path.display());
            None
        }
    }
}

fn build_m_file(
    path: &Path,
    stem: &str,
    fqdm: String,
    parent: Option<PathBuf>,
    bodies: &mut Vec<PendingBody>,
) -> Option<Node> {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("skipping {}: {e}", path.display());
            return None;
        }
    };
    let lines = lexer::join_continuations(&source);
    let parsed = match lexer::parse_file(&lines) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("unparseable source {}: {e}", path.display());
            return None;
        }
    };

    match parsed {
        lexer::ParsedFile::Script { doc, body } => {
            let header = NodeHeader {
                docstring: docstring::extract(&doc),
                parent,
                ..NodeHeader::new(stem, path.to_path_buf(), fqdm)
            };
            bodies.push((BodySlot::Own, body));
            Some(Node::Script(header))
        }
        lexer::ParsedFile::Function(f) => {
            let body = f.body.clone();
            let function = function_from_syntax(f, path, fqdm, parent, stem);
            bodies.push((BodySlot::Own, body));
            Some(Node::Function(function))
        }
        lexer::ParsedFile::Classdef(c) => {
            let classdef = classdef_from_syntax(c, path, fqdm, parent, bodies);
            Some(Node::Classdef(classdef))
        }
    }
}

fn function_from_syntax(
    f: FunctionSyntax,
    path: &Path,
    fqdm: String,
    parent: Option<PathBuf>,
    fallback_name: &str,
) -> Function {
    let name = if f.name.is_empty() { fallback_name.to_string() } else { f.name.clone() };
    let header = NodeHeader {
        docstring: docstring::extract(&f.leading_doc),
        parent,
        ..NodeHeader::new(name, path.to_path_buf(), fqdm)
    };
    let (input, output, options) = arguments_from_blocks(&f.arguments_blocks, &f.input, &f.output);
    Function { header, input, output, options }
}

/// Split an `arguments` block's entries into input/output parameters and
/// name-value options. An entry named `pack.name` (a dotted form) puts
/// `name` into `options` instead of `input`, and the bare `pack` sentinel
/// (if the block also declared it as a standalone entry) is dropped from
/// `input` rather than kept as a parameter in its own right.
fn arguments_from_blocks(
    blocks: &[(bool, BlockSyntax)],
    declared_input: &[String],
    declared_output: &[String],
) -> (Vec<Argument>, Vec<Argument>, Vec<Argument>) {
    let mut input = Vec::new();
    let mut output = Vec::new();
    let mut options = Vec::new();
    let mut option_sentinels = std::collections::HashSet::new();

    for (is_output_block, block) in blocks {
        let repeating = matches!(
            ArgumentAttributes::decode(&block.attrs),
            Ok(a) if a.repeating
        );
        for entry in &block.entries {
            if let Some((sentinel, name)) = entry.name.split_once('.') {
                option_sentinels.insert(sentinel.to_string());
                options.push(argument_from_entry(entry, true, repeating, Some(name)));
                continue;
            }
            let argument = argument_from_entry(entry, !*is_output_block, repeating, None);
            if *is_output_block {
                output.push(argument);
            } else {
                input.push(argument);
            }
        }
    }

    input.retain(|a| !option_sentinels.contains(&a.header.name));

    // Parameters declared in the signature but never given an `arguments`
    // block entry still produce a bare Argument node with no validation.
    for name in declared_input {
        if option_sentinels.contains(name) {
            continue;
        }
        if !input.iter().any(|a| a.header.name == *name) {
            input.push(Argument {
                header: NodeHeader::new(name.clone(), PathBuf::new(), name.clone()),
                is_input: true,
                ..Default::default()
            });
        }
    }
    for name in declared_output {
        if !output.iter().any(|a| a.header.name == *name) {
            output.push(Argument {
                header: NodeHeader::new(name.clone(), PathBuf::new(), name.clone()),
                ..Default::default()
            });
        }
    }

    (input, output, options)
}

/// Build an `Argument` from a scanned entry. `rename` overrides the name
/// stored on the header (used for a dotted `pack.name` option entry, whose
/// stored name is the bare `name`, not the full dotted form).
fn argument_from_entry(entry: &EntrySyntax, is_input: bool, repeating: bool, rename: Option<&str>) -> Argument {
    let name = rename.unwrap_or(&entry.name);
    Argument {
        header: NodeHeader {
            docstring: docstring::extract(&entry.doc_lines),
            ..NodeHeader::new(name, PathBuf::new(), name)
        },
        type_name: if entry.type_name.is_empty() { None } else { Some(entry.type_name.clone()) },
        size: entry.size.clone(),
        validators: entry.validators.clone(),
        default: if entry.default.is_empty() { None } else { Some(entry.default.clone()) },
        is_input,
        repeating,
    }
}

fn classdef_from_syntax(
    c: lexer::ClassdefSyntax,
    path: &Path,
    fqdm: String,
    parent: Option<PathBuf>,
    bodies: &mut Vec<PendingBody>,
) -> Classdef {
    let class_attrs = ClassdefAttributes::decode(&c.class_attrs).unwrap_or_default();

    let mut doc_lines = c.leading_doc.clone();
    if let Some(inline) = &c.decl_doc {
        doc_lines.insert(0, (c.line, inline.clone()));
    }

    let header = NodeHeader {
        docstring: docstring::extract(&doc_lines),
        parent: parent.clone(),
        ..NodeHeader::new(c.name.clone(), path.to_path_buf(), fqdm.clone())
    };

    let mut properties = Vec::new();
    for block in &c.properties_blocks {
        let prop_attrs = PropertyAttributes::decode(&block.attrs).unwrap_or_default();
        for entry in &block.entries {
            properties.push(property_from_entry(entry, &prop_attrs));
        }
    }

    let mut methods = Vec::new();
    for block in &c.methods_blocks {
        let method_attrs = MethodAttributes::decode(&block.attrs).unwrap_or_default();
        for f in &block.functions {
            let method_index = methods.len();
            bodies.push((BodySlot::Method(method_index), f.body.clone()));
            methods.push(method_from_syntax(f, &method_attrs, &c.name));
        }
    }

    let mut enum_members = Vec::new();
    for entry in &c.enum_entries {
        enum_members.push(EnumMember {
            header: NodeHeader {
                docstring: docstring::extract(&entry.doc_lines),
                ..NodeHeader::new(entry.name.clone(), PathBuf::new(), entry.name.clone())
            },
            value: if entry.default.is_empty() { None } else { Some(entry.default.clone()) },
        });
    }

    Classdef {
        header,
        ancestors: c.ancestors,
        properties,
        methods,
        enum_members,
        abstract_: class_attrs.abstract_,
        sealed: class_attrs.sealed,
        handle_compatible: class_attrs.handle_compatible,
    }
}

fn property_from_entry(entry: &EntrySyntax, attrs: &PropertyAttributes) -> Property {
    Property {
        header: NodeHeader {
            docstring: docstring::extract(&entry.doc_lines),
            ..NodeHeader::new(entry.name.clone(), PathBuf::new(), entry.name.clone())
        },
        type_name: if entry.type_name.is_empty() { None } else { Some(entry.type_name.clone()) },
        size: entry.size.clone(),
        validators: entry.validators.clone(),
        default: if entry.default.is_empty() { None } else { Some(entry.default.clone()) },
        access: attrs.access.clone(),
        get_access: attrs.get_access.clone(),
        set_access: attrs.set_access.clone(),
        abstract_: attrs.abstract_,
        constant: attrs.constant,
        dependent: attrs.dependent,
        hidden: attrs.hidden,
        transient: attrs.transient,
    }
}

/// Build a `Method` from its parsed declaration, dropping the leading
/// object-receiver parameter for any non-static method that isn't the
/// class's constructor (its short name matches `class_short_name`).
fn method_from_syntax(f: &FunctionSyntax, attrs: &MethodAttributes, class_short_name: &str) -> Method {
    let header = NodeHeader {
        docstring: docstring::extract(&f.leading_doc),
        ..NodeHeader::new(f.name.clone(), PathBuf::new(), f.name.clone())
    };
    let (mut input, output, options) = arguments_from_blocks(&f.arguments_blocks, &f.input, &f.output);
    if !attrs.static_ && f.name != class_short_name && !input.is_empty() {
        input.remove(0);
    }
    Method {
        header,
        input,
        output,
        options,
        access: attrs.access.clone(),
        abstract_: attrs.abstract_,
        static_: attrs.static_,
        sealed: attrs.sealed,
        hidden: attrs.hidden,
        is_test: attrs.test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cfg() -> IndexerConfig {
        IndexerConfig::default()
    }

    #[test]
    fn builds_script_node_with_docstring() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "demo.m", "% A demo script.\nx = 1;\n");
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Script(header) => {
                assert_eq!(header.name, "demo");
                assert_eq!(header.docstring.as_deref(), Some("A demo script."));
            }
            other => panic!("expected script, got {other:?}"),
        }
    }

    #[test]
    fn builds_function_node_with_signature() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "square.m", "function y = square(x)\ny = x^2;\nend\n");
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Function(f) => {
                assert_eq!(f.header.name, "square");
                assert_eq!(f.input.len(), 1);
                assert_eq!(f.output.len(), 1);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn builds_classdef_with_properties_and_methods() {
        let dir = tempdir().unwrap();
        let content = "classdef Widget\n  properties (Access=private)\n    Count (1,1) double = 0\n  end\n  methods\n    function obj = Widget(n)\n      obj.Count = n;\n    end\n  end\nend\n";
        let path = write(dir.path(), "Widget.m", content);
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Classdef(c) => {
                assert_eq!(c.header.name, "Widget");
                assert_eq!(c.properties.len(), 1);
                assert_eq!(c.properties[0].access, "private");
                assert_eq!(c.methods.len(), 1);
            }
            other => panic!("expected classdef, got {other:?}"),
        }
    }

    #[test]
    fn class_folder_synthesizes_empty_classdef_when_main_file_absent() {
        let dir = tempdir().unwrap();
        let class_dir = dir.path().join("@Widget");
        std::fs::create_dir(&class_dir).unwrap();
        write(&class_dir, "helper.m", "function y = helper(x)\ny = x;\nend\n");
        let node = build_node(&class_dir, "", None, &cfg()).unwrap();
        match node {
            Node::Classdef(c) => {
                assert_eq!(c.header.name, "Widget");
                assert_eq!(c.methods.len(), 1);
                assert_eq!(c.methods[0].header.name, "helper");
            }
            other => panic!("expected classdef, got {other:?}"),
        }
    }

    #[test]
    fn class_folder_parses_main_file_when_present() {
        let dir = tempdir().unwrap();
        let class_dir = dir.path().join("@Widget");
        std::fs::create_dir(&class_dir).unwrap();
        write(&class_dir, "Widget.m", "classdef Widget\nend\n");
        let node = build_node(&class_dir, "", None, &cfg()).unwrap();
        assert!(matches!(node, Node::Classdef(_)));
    }

    #[test]
    fn package_folder_produces_package_node() {
        let dir = tempdir().unwrap();
        let pkg_dir = dir.path().join("+mypkg");
        std::fs::create_dir(&pkg_dir).unwrap();
        let node = build_node(&pkg_dir, "", None, &cfg()).unwrap();
        match node {
            Node::Package(p) => assert_eq!(p.header.fqdm, "mypkg"),
            other => panic!("expected package, got {other:?}"),
        }
    }

    #[test]
    fn plain_subdirectory_is_not_a_node() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("helpers");
        std::fs::create_dir(&sub).unwrap();
        assert!(build_node(&sub, "", None, &cfg()).is_none());
    }

    #[test]
    fn dotted_argument_entries_become_options_not_inputs() {
        let dir = tempdir().unwrap();
        let content = "function y = scale(x, opts)\narguments\n  x (1,1) double\n  opts.Factor (1,1) double = 1\n  opts.Verbose (1,1) logical = false\nend\ny = x * opts.Factor;\nend\n";
        let path = write(dir.path(), "scale.m", content);
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Function(f) => {
                assert!(f.input.iter().all(|a| a.header.name != "opts"));
                assert_eq!(f.input.iter().map(|a| a.header.name.as_str()).collect::<Vec<_>>(), vec!["x"]);
                let option_names: Vec<&str> = f.options.iter().map(|a| a.header.name.as_str()).collect();
                assert_eq!(option_names, vec!["Factor", "Verbose"]);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn non_static_non_constructor_method_drops_receiver_argument() {
        let dir = tempdir().unwrap();
        let content = "classdef Account\n  methods\n    function obj = Account(n)\n      obj.Balance = n;\n    end\n    function obj = deposit(obj, amount)\n      obj.Balance = obj.Balance + amount;\n    end\n  end\nend\n";
        let path = write(dir.path(), "Account.m", content);
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Classdef(c) => {
                let ctor = c.methods.iter().find(|m| m.header.name == "Account").unwrap();
                assert_eq!(ctor.input.len(), 1);
                let deposit = c.methods.iter().find(|m| m.header.name == "deposit").unwrap();
                assert_eq!(deposit.input.iter().map(|a| a.header.name.as_str()).collect::<Vec<_>>(), vec!["amount"]);
            }
            other => panic!("expected classdef, got {other:?}"),
        }
    }

    #[test]
    fn static_method_keeps_every_declared_input() {
        let dir = tempdir().unwrap();
        let content = "classdef Util\n  methods (Static)\n    function y = square(x)\n      y = x^2;\n    end\n  end\nend\n";
        let path = write(dir.path(), "Util.m", content);
        let node = build_node(&path, "", None, &cfg()).unwrap();
        match node {
            Node::Classdef(c) => {
                let square = &c.methods[0];
                assert_eq!(square.input.iter().map(|a| a.header.name.as_str()).collect::<Vec<_>>(), vec!["x"]);
            }
            other => panic!("expected classdef, got {other:?}"),
        }
    }

    #[test]
    fn package_docstring_reads_contents_m_leading_comment() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Contents.m", "% MYPKG Summary line.\n%   Longer description.\n");
        let doc = package_docstring(&dir.path().join("Contents.m")).unwrap();
        assert_eq!(doc, "MYPKG Summary line.\n  Longer description.");
    }

    #[test]
    fn package_docstring_is_none_when_file_missing() {
        let dir = tempdir().unwrap();
        assert!(package_docstring(&dir.path().join("Contents.m")).is_none());
    }

    #[test]
    fn opaque_extensions_produce_header_only_nodes() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "App1.mlapp", "");
        match build_node(&path, "", None, &cfg()).unwrap() {
            Node::App(h) => assert_eq!(h.name, "App1"),
            other => panic!("expected app, got {other:?}"),
        }
    }
}
