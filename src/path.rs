//! The search-path namespace engine, grounded on the original
//! `matlab.SearchPath` class.
//!
//! [`PathEngine`] owns the whole indexed state: the ordered list of search
//! roots, the database of every member built from them, the global
//! namespace (fqdm -> shadowing queue of claimant paths), and the private
//! local namespaces keyed by the folder a `private/` directory serves.
//! `addpath`/`rm_path` mutate that state; `resolve`/`resolve_dependencies`
//! read it. The engine is not thread-safe: callers wanting concurrent
//! indexing must own that synchronization themselves.
//!
//! `resolve_dependencies` is also where every body's calls and imports get
//! turned into dependency edges. It builds, per body, the same
//! `local_namespaces` stack [`PathEngine::resolve`] uses everywhere else
//! (the file's own directory, then the directories its own imports resolve
//! to) and resolves each referenced name against it, so a name that only a
//! `private/` folder member would satisfy, or that two shadowing members
//! both claim, resolves exactly the way a direct call to `resolve` would.

use crate::analyzer;
use crate::builder::{self, BodySlot, PendingBody};
use crate::builtins::BuiltinReference;
use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::node::{Namespace, Node};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate children of `dir`, in the order the filesystem yields them.
/// One level only; recursion is handled explicitly by the caller so that
/// `+`/`@`/`private` folders are never walked past without being routed
/// through their dedicated registration path.
fn direct_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            let message = e.to_string();
            let io_err = e.into_io_error().unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message));
            IndexError::io(dir, io_err)
        })?;
    Ok(entries.into_iter().map(|e| e.into_path()).collect())
}

/// The full indexed state of a set of search-path roots.
pub struct PathEngine {
    config: IndexerConfig,
    builtins: BuiltinReference,
    /// Search roots, in the order they take effect (front = highest
    /// shadowing precedence within `to_end = false` additions).
    search_path: Vec<PathBuf>,
    /// Direct members each search root contributed, for `rm_path` cleanup.
    path_members: HashMap<PathBuf, Vec<PathBuf>>,
    /// Every constructed node, keyed by its own path.
    database: HashMap<PathBuf, Node>,
    /// fqdm -> ordered queue of claimant paths.
    namespace: Namespace,
    /// Folder path -> local namespace populated by that folder's `private/`
    /// subdirectory.
    local_namespaces: HashMap<PathBuf, Namespace>,
    /// Bodies awaiting dependency analysis, owner path -> pending bodies.
    pending_bodies: HashMap<PathBuf, Vec<PendingBody>>,
}

impl PathEngine {
    /// Construct an engine from `config`, loading the built-in reference
    /// file it names, if any. A missing/corrupt reference file is
    /// tolerated: the engine logs a warning and proceeds with an empty
    /// built-in set rather than failing construction.
    pub fn new(config: IndexerConfig) -> Result<Self> {
        config.validate().map_err(IndexError::invalid_argument)?;
        let builtins = match &config.builtins_path {
            Some(path) => BuiltinReference::load(path).unwrap_or_else(|e| {
                log::warn!("falling back to an empty built-in set: {e}");
                BuiltinReference::empty()
            }),
            None => BuiltinReference::empty(),
        };
        Ok(Self {
            config,
            builtins,
            search_path: Vec::new(),
            path_members: HashMap::new(),
            database: HashMap::new(),
            namespace: HashMap::new(),
            local_namespaces: HashMap::new(),
            pending_bodies: HashMap::new(),
        })
    }

    /// The number of indexed database members.
    pub fn len(&self) -> usize {
        self.database.len()
    }

    pub fn is_empty(&self) -> bool {
        self.database.is_empty()
    }

    /// The current search path, in precedence order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Look up a database member by its own path.
    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.database.get(path)
    }

    /// Add `path` to the search path, indexing every member under it.
    ///
    /// If `path` is already on the search path it is removed and
    /// reinserted (its members are rebuilt from scratch), matching the
    /// original's behavior of treating a repeat `addpath` as a refresh. If
    /// `recursive`, plain (non `+`/`@`) subdirectories are themselves added
    /// as search roots rather than ignored. `to_end` controls whether this
    /// root's members shadow or are shadowed by members already claiming
    /// the same name.
    pub fn addpath(&mut self, path: impl AsRef<Path>, to_end: bool, recursive: bool) -> Result<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(IndexError::invalid_argument(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        let path = path.to_path_buf();

        if self.search_path.contains(&path) {
            self.rm_path(&path, false)?;
        }

        self.register_root(&path, to_end, recursive)?;

        if to_end {
            self.search_path.push(path);
        } else {
            self.search_path.insert(0, path);
        }

        if self.config.dependency_analysis {
            self.resolve_dependencies();
        }

        Ok(())
    }

    fn register_root(&mut self, root: &Path, to_end: bool, recursive: bool) -> Result<()> {
        let mut members = Vec::new();
        for entry_path in direct_children(root)? {
            let file_name = entry_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

            // A Contents.m outside a package/class folder documents nothing
            // registerable: it's skipped entirely rather than parsed, unlike
            // the one inside register_package_contents below.
            if entry_path.is_file() && file_name == "Contents.m" {
                continue;
            }

            if entry_path.is_dir() {
                let stem = entry_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
                if !(stem.starts_with('+') || stem.starts_with('@') || stem == "private") {
                    if recursive {
                        self.register_root(&entry_path, to_end, recursive)?;
                    }
                    continue;
                }
            }

            self.register_member(&entry_path, "", None, to_end);
            members.push(entry_path);
        }
        self.path_members.entry(root.to_path_buf()).or_default().extend(members);
        Ok(())
    }

    fn register_member(&mut self, entry_path: &Path, fqdm_prefix: &str, parent: Option<PathBuf>, to_end: bool) {
        let stem = entry_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        if stem == "private" && entry_path.is_dir() {
            self.register_private_folder(entry_path, fqdm_prefix, to_end);
            return;
        }

        let mut bodies = Vec::new();
        let Some(node) = builder::build_node_with_bodies(entry_path, fqdm_prefix, parent.clone(), &self.config, &mut bodies) else {
            return;
        };
        let fqdm = node.fqdm().to_string();
        let is_package = matches!(node, Node::Package(_));
        let owner_path = entry_path.to_path_buf();

        self.database.insert(owner_path.clone(), node);
        if !bodies.is_empty() {
            self.pending_bodies.insert(owner_path.clone(), bodies);
        }

        let queue = self.namespace.entry(fqdm).or_default();
        if to_end {
            queue.push_back(owner_path.clone());
        } else {
            queue.push_front(owner_path.clone());
        }

        if is_package {
            self.register_package_contents(&owner_path, to_end);
        }
    }

    fn register_private_folder(&mut self, private_dir: &Path, fqdm_prefix: &str, to_end: bool) {
        let Some(parent_dir) = private_dir.parent().map(Path::to_path_buf) else {
            return;
        };
        let Ok(entries) = direct_children(private_dir) else {
            return;
        };
        for member_path in entries {
            let mut bodies = Vec::new();
            let Some(node) =
                builder::build_node_with_bodies(&member_path, fqdm_prefix, Some(private_dir.to_path_buf()), &self.config, &mut bodies)
            else {
                continue;
            };
            let fqdm = node.fqdm().to_string();
            self.database.insert(member_path.clone(), node);
            if !bodies.is_empty() {
                self.pending_bodies.insert(member_path.clone(), bodies);
            }
            let local_ns = self.local_namespaces.entry(parent_dir.clone()).or_default();
            let queue = local_ns.entry(fqdm).or_default();
            if to_end {
                queue.push_back(member_path);
            } else {
                queue.push_front(member_path);
            }
        }
    }

    fn register_package_contents(&mut self, package_path: &Path, to_end: bool) {
        let fqdm = match self.database.get(package_path) {
            Some(node) => node.fqdm().to_string(),
            None => return,
        };
        let Ok(entries) = direct_children(package_path) else {
            return;
        };
        let mut members = Vec::new();
        let mut contents_doc = None;
        for entry_path in entries {
            let file_name = entry_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            if entry_path.is_file() && file_name == "Contents.m" {
                contents_doc = builder::package_docstring(&entry_path);
                continue;
            }
            self.register_member(&entry_path, &fqdm, Some(package_path.to_path_buf()), to_end);
            members.push(entry_path);
        }
        if let Some(Node::Package(p)) = self.database.get_mut(package_path) {
            p.members = members;
            if contents_doc.is_some() {
                p.header.docstring = contents_doc;
            }
        }
    }

    /// Remove `path` from the search path and every database member it
    /// contributed. If `recursive`, search-path entries nested under
    /// `path` are removed first.
    pub fn rm_path(&mut self, path: &Path, recursive: bool) -> Result<()> {
        if recursive {
            let descendants: Vec<PathBuf> = self
                .search_path
                .iter()
                .filter(|p| p.as_path() != path && p.starts_with(path))
                .cloned()
                .collect();
            for descendant in descendants {
                self.rm_path(&descendant, recursive)?;
            }
        }

        self.search_path.retain(|p| p != path);
        if let Some(members) = self.path_members.remove(path) {
            for member in members {
                self.remove_member(&member);
            }
        }
        self.local_namespaces.remove(path);
        Ok(())
    }

    fn remove_member(&mut self, member_path: &Path) {
        self.pending_bodies.remove(member_path);
        let Some(node) = self.database.remove(member_path) else {
            return;
        };
        let fqdm = node.fqdm().to_string();
        if let Some(queue) = self.namespace.get_mut(&fqdm) {
            queue.retain(|p| p != member_path);
            if queue.is_empty() {
                self.namespace.remove(&fqdm);
            }
        }
        for local in self.local_namespaces.values_mut() {
            for queue in local.values_mut() {
                queue.retain(|p| p != member_path);
            }
        }
        if let Node::Package(package) = &node {
            for child in package.members.clone() {
                self.remove_member(&child);
            }
        }
    }

    /// Resolve a fully qualified name, checking the local namespaces of
    /// `local_scopes` in order before falling back to the global namespace.
    /// Returns the member currently winning the shadowing queue for that
    /// name (the front of its queue), or `None` if nothing claims it.
    pub fn resolve(&self, name: &str, local_scopes: &[PathBuf]) -> Option<&Node> {
        for scope in local_scopes {
            if let Some(local) = self.local_namespaces.get(scope) {
                if let Some(queue) = local.get(name) {
                    if let Some(path) = queue.front() {
                        return self.database.get(path);
                    }
                }
            }
        }
        let queue = self.namespace.get(name)?;
        let path = queue.front()?;
        self.database.get(path)
    }

    /// Run (or re-run) dependency analysis over every body awaiting it,
    /// then link `dependants` edges. Safe to call repeatedly: a body is
    /// consumed from the pending queue the first time it's analyzed, so
    /// later calls only process members added since.
    pub fn resolve_dependencies(&mut self) {
        let pending = std::mem::take(&mut self.pending_bodies);

        for (owner_path, bodies) in pending {
            let local_dir = owner_path.parent().map(Path::to_path_buf);
            let local_scope: Vec<PathBuf> = local_dir.iter().cloned().collect();

            let resolved_per_body: Vec<HashMap<String, PathBuf>> = bodies
                .iter()
                .map(|(_, body)| self.resolve_body_refs(body, &local_scope))
                .collect();

            let Some(node) = self.database.get_mut(&owner_path) else {
                continue;
            };
            for ((slot, body), resolved) in bodies.iter().zip(resolved_per_body.iter()) {
                match (slot, &mut *node) {
                    (BodySlot::Own, n) => analyzer::analyze(n, body, resolved, &self.builtins),
                    (BodySlot::Method(index), Node::Classdef(c)) => {
                        if let Some(method) = c.methods.get_mut(*index) {
                            analyzer::analyze_header(&mut method.header, body, resolved, &self.builtins);
                        }
                    }
                    _ => {}
                }
            }
        }

        analyzer::link_dependants(&mut self.database);
    }

    /// Resolve every call and import a body references against this
    /// engine's real namespace (shadowing- and privacy-aware), building the
    /// `name -> path` map [`analyzer::analyze`] consults.
    ///
    /// Imports resolve first, against `local_scope` alone, and contribute
    /// the directories they land in to the stack later calls resolve
    /// against — so an unqualified call picks up exactly the packages and
    /// classes this body actually imported, in declaration order, with the
    /// body's own directory still taking precedence. A call left
    /// unresolved by that stack gets one more try against each import: a
    /// wildcard import (`import pkg.*`) turns `helper` into `pkg.helper`;
    /// a non-wildcard import whose last segment is this call's dotted head
    /// (`import mypkg.Account` against a call to `Account.deposit`)
    /// resolves the whole call to that imported member itself.
    fn resolve_body_refs(&self, body: &crate::grammar::Element, local_scope: &[PathBuf]) -> HashMap<String, PathBuf> {
        let locals = analyzer::collect_locals(body);
        let refs = analyzer::extract_refs(body, &locals);

        let mut resolved = HashMap::new();
        let mut import_dirs = Vec::new();

        for import in &refs.imports {
            let bare = import.trim_end_matches(".*");
            if let Some(node) = self.resolve(bare, local_scope) {
                resolved.insert(import.clone(), node.path().to_path_buf());
                if let Some(dir) = node.path().parent() {
                    import_dirs.push(dir.to_path_buf());
                }
            }
        }

        let mut stack = local_scope.to_vec();
        stack.extend(import_dirs.iter().cloned());

        for name in &refs.calls {
            if resolved.contains_key(name) {
                continue;
            }
            if let Some(node) = self.resolve(name, &stack) {
                resolved.insert(name.clone(), node.path().to_path_buf());
                continue;
            }

            let mut found = None;
            for import in &refs.imports {
                let bare_import = import.trim_end_matches(".*");
                if import.ends_with(".*") {
                    let candidate = format!("{bare_import}.{name}");
                    if let Some(node) = self.resolve(&candidate, &stack) {
                        found = Some(node.path().to_path_buf());
                        break;
                    }
                    continue;
                }
                // A bare `Account` or a qualified `Account.deposit` through
                // `import mypkg.Account` both name the imported class/package
                // itself, so the whole import is the dependency.
                let tail = bare_import.rsplit('.').next().unwrap_or(bare_import);
                let matches_import = name == tail || name.strip_prefix(tail).is_some_and(|rest| rest.starts_with('.'));
                if matches_import {
                    if let Some(node) = self.resolve(bare_import, &stack) {
                        found = Some(node.path().to_path_buf());
                        break;
                    }
                }
            }
            if let Some(path) = found {
                resolved.insert(name.clone(), path);
            }
        }

        resolved
    }
}
