//! Built-in reference loading.
//!
//! The dependency analyzer needs to tell "this call resolves to a database
//! member" apart from "this call resolves to a built-in function the
//! language ships" apart from "this call resolves to nothing we know
//! about". The built-in set is an external, versioned artifact (a JSON map
//! of name to documentation URL) rather than something this crate derives
//! itself, so it can be regenerated against a different language release
//! without a code change. Only the keys are consulted; the URLs are carried
//! through for callers that want to surface them but are otherwise inert.

use crate::error::{IndexError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// The set of recognized built-in names, loaded once per [`crate::PathEngine`]
/// and treated as immutable thereafter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuiltinReference(HashMap<String, String>);

impl BuiltinReference {
    /// An empty reference set: every call is treated as unresolved rather
    /// than built-in. Used when no reference file is configured.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Build a reference set directly from an in-memory map, bypassing the
    /// JSON file. Used by tests and by callers that already have the data.
    pub fn load_from_map(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    /// Load a built-in reference map from a JSON file of `name -> doc URL`.
    ///
    /// A missing or corrupt file is tolerated: this returns an error so the
    /// caller can decide how to log it, but callers in this crate fall back
    /// to [`BuiltinReference::empty`] rather than aborting indexing.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
        let map: HashMap<String, String> = serde_json::from_str(&text)
            .map_err(|e| IndexError::builtin_reference(path, e.to_string()))?;
        Ok(Self(map))
    }

    /// Whether `name` is a recognized built-in.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The documentation URL for `name`, if known.
    pub fn doc_url(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
