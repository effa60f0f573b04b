//! The data model: a closed set of node kinds sharing a common header,
//! linked by path rather than by reference.
//!
//! Every node that can appear in the search-path database is represented by
//! [`Node`], a tagged union over the eleven kinds the grammar can produce.
//! Parent/dependency/dependant edges are stored as [`PathBuf`] keys into
//! [`crate::path::PathEngine`]'s database rather than as `Rc<RefCell<_>>`
//! pointers: the graph is built incrementally by repeated `addpath` calls,
//! and a node's dependants are only known once every other member has been
//! indexed, so an owning pointer would have to be filled in after
//! construction anyway. Keying by path sidesteps reference cycles entirely
//! and keeps nodes independently constructible and comparable.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

/// Fields every node kind carries, regardless of what it represents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeHeader {
    /// Short name (no namespace prefix), derived from the file or folder
    /// name unless overridden by the grammar (e.g. a classdef's declared
    /// name takes precedence over its file stem).
    pub name: String,

    /// Absolute path to the file or folder this node was built from.
    pub path: PathBuf,

    /// Fully qualified domain name: dotted package path plus `name`, or
    /// just `name` at the root namespace.
    pub fqdm: String,

    /// Path of the logical parent (containing package/class), if any.
    pub parent: Option<PathBuf>,

    /// Docstring extracted from the leading comment run, already
    /// indentation-normalized.
    pub docstring: Option<String>,

    /// Names called from this node's body, in first-occurrence order.
    /// Populated only when dependency analysis is enabled.
    pub calls: Vec<String>,

    /// Fully qualified names brought into scope via `import`, in
    /// declaration order (NOT reversed; see DESIGN.md).
    pub imports: Vec<String>,

    /// Names recognized as references to the built-in reference set,
    /// deduplicated, in first-occurrence order.
    pub builtin_dependencies: Vec<String>,

    /// Paths of other database members this node calls into or imports.
    pub dependencies: Vec<PathBuf>,

    /// Paths of other database members that depend on this node. Filled in
    /// as a second pass once the whole tree this node belongs to has been
    /// indexed.
    pub dependants: Vec<PathBuf>,

    /// Call/import targets that could not be resolved to any database
    /// member or built-in. Non-fatal.
    pub unresolved_dependencies: Vec<String>,
}

impl NodeHeader {
    pub fn new(name: impl Into<String>, path: PathBuf, fqdm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path,
            fqdm: fqdm.into(),
            ..Default::default()
        }
    }
}

/// A function input parameter, decoded against the `arguments` schema
/// (`ArgumentAttributes`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Argument {
    pub header: NodeHeader,
    pub type_name: Option<String>,
    pub size: Vec<String>,
    pub validators: Vec<String>,
    pub default: Option<String>,
    pub is_input: bool,
    pub repeating: bool,
}

/// A class property, decoded against `PropertyAttributes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Property {
    pub header: NodeHeader,
    pub type_name: Option<String>,
    pub size: Vec<String>,
    pub validators: Vec<String>,
    pub default: Option<String>,
    pub access: String,
    pub get_access: String,
    pub set_access: String,
    pub abstract_: bool,
    pub constant: bool,
    pub dependent: bool,
    pub hidden: bool,
    pub transient: bool,
}

/// A function or class method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Function {
    pub header: NodeHeader,
    pub input: Vec<Argument>,
    pub output: Vec<Argument>,
    /// Name-value options, derived from dotted `pack.name` entries in an
    /// `arguments` block (the bare `pack` identifier is a sentinel, not an
    /// input parameter).
    pub options: Vec<Argument>,
}

/// A class method, decoded against `MethodAttributes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Method {
    pub header: NodeHeader,
    pub input: Vec<Argument>,
    pub output: Vec<Argument>,
    /// Name-value options, derived the same way as [`Function::options`].
    pub options: Vec<Argument>,
    pub access: String,
    pub abstract_: bool,
    pub static_: bool,
    pub sealed: bool,
    pub hidden: bool,
    pub is_test: bool,
}

/// A single `enumeration` member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumMember {
    pub header: NodeHeader,
    pub value: Option<String>,
}

/// A plain script file: top-level code with no `function`/`classdef`
/// declaration. Only its docstring and dependency-analysis fields are
/// populated.
pub type Script = NodeHeader;

/// A class, decoded against `ClassdefAttributes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classdef {
    pub header: NodeHeader,
    pub ancestors: Vec<String>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
    pub enum_members: Vec<EnumMember>,
    pub abstract_: bool,
    pub sealed: bool,
    pub handle_compatible: bool,
}

/// A `+package` folder: an ordered namespace of members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    pub header: NodeHeader,
    /// Paths of direct members, in discovery order.
    pub members: Vec<PathBuf>,
}

/// A live script (`.mlx`): opaque, only header fields are populated.
pub type LiveScript = NodeHeader;

/// An app file (`.mlapp`): opaque.
pub type App = NodeHeader;

/// A compiled binary (`.mex*`): opaque.
pub type Mex = NodeHeader;

/// The closed set of node kinds the grammar can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Script(Script),
    Function(Function),
    Classdef(Classdef),
    Package(Package),
    Method(Method),
    Property(Property),
    Argument(Argument),
    Enum(EnumMember),
    LiveScript(LiveScript),
    App(App),
    Mex(Mex),
}

impl Node {
    /// Borrow the common header fields regardless of variant.
    pub fn header(&self) -> &NodeHeader {
        match self {
            Node::Script(h) | Node::LiveScript(h) | Node::App(h) | Node::Mex(h) => h,
            Node::Function(f) => &f.header,
            Node::Classdef(c) => &c.header,
            Node::Package(p) => &p.header,
            Node::Method(m) => &m.header,
            Node::Property(p) => &p.header,
            Node::Argument(a) => &a.header,
            Node::Enum(e) => &e.header,
        }
    }

    /// Mutably borrow the common header fields regardless of variant.
    pub fn header_mut(&mut self) -> &mut NodeHeader {
        match self {
            Node::Script(h) | Node::LiveScript(h) | Node::App(h) | Node::Mex(h) => h,
            Node::Function(f) => &mut f.header,
            Node::Classdef(c) => &mut c.header,
            Node::Package(p) => &mut p.header,
            Node::Method(m) => &mut m.header,
            Node::Property(p) => &mut p.header,
            Node::Argument(a) => &mut a.header,
            Node::Enum(e) => &mut e.header,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.header().path
    }

    pub fn fqdm(&self) -> &str {
        &self.header().fqdm
    }
}

/// The ordered shadowing queue for one fully-qualified name: every database
/// member that currently claims this name, front-to-back in search-path
/// precedence order. `resolve` only ever looks at the front; `rm_path`
/// pops whichever entry belongs to the path being removed, which may not
/// be the front, exposing whatever was shadowed underneath it.
pub type NamespaceQueue = VecDeque<PathBuf>;

/// The global namespace: fqdm -> ordered queue of claimants.
pub type Namespace = HashMap<String, NamespaceQueue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_accessor_covers_every_variant() {
        let h = NodeHeader::new("foo", PathBuf::from("/x/foo.m"), "foo");
        let nodes = vec![
            Node::Script(h.clone()),
            Node::LiveScript(h.clone()),
            Node::App(h.clone()),
            Node::Mex(h.clone()),
            Node::Function(Function {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Classdef(Classdef {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Package(Package {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Method(Method {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Property(Property {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Argument(Argument {
                header: h.clone(),
                ..Default::default()
            }),
            Node::Enum(EnumMember {
                header: h.clone(),
                value: None,
            }),
        ];
        for node in nodes {
            assert_eq!(node.header().name, "foo");
        }
    }

    #[test]
    fn namespace_queue_preserves_shadow_order() {
        let mut ns: Namespace = HashMap::new();
        let queue = ns.entry("pkg.foo".to_string()).or_default();
        queue.push_back(PathBuf::from("/a/foo.m"));
        queue.push_front(PathBuf::from("/b/foo.m"));
        assert_eq!(queue.front(), Some(&PathBuf::from("/b/foo.m")));
        assert_eq!(queue.back(), Some(&PathBuf::from("/a/foo.m")));
    }
}
