//! # mscript-index
//!
//! Offline static indexer and symbol resolver for MATLAB-like source trees.
//!
//! [`PathEngine`] walks a set of search-path roots the way the language's
//! own path resolution does: packages (`+name`), class folders (`@Name`),
//! and `private/` subfolders are recognized structurally, every `.m` file
//! is parsed into a typed [`Node`] (script, function, classdef, ...), and
//! cross-file `calls`/`imports` are resolved into a dependency graph keyed
//! by filesystem path rather than by owning reference.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mscript_index::{IndexerConfig, PathEngine};
//!
//! # fn main() -> mscript_index::error::Result<()> {
//! let mut engine = PathEngine::new(IndexerConfig::default())?;
//! engine.addpath("src", false, true)?;
//! if let Some(node) = engine.resolve("mypkg.helper", &[]) {
//!     println!("resolved {} -> {}", node.fqdm(), node.path().display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod attributes;
pub mod builder;
pub mod builtins;
pub mod config;
pub mod docstring;
pub mod error;
pub mod grammar;
pub mod node;
pub mod path;

pub use config::IndexerConfig;
pub use error::{IndexError, Result};
pub use node::Node;
pub use path::PathEngine;
