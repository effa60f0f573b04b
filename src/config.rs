use std::path::PathBuf;

/// Configuration for [`crate::PathEngine`] behavior.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Run dependency analysis as part of `addpath` (fills `calls`,
    /// `imports`, `builtin_dependencies` on each node as it is built).
    pub dependency_analysis: bool,

    /// Emit progress while walking large search-path roots.
    pub show_progress: bool,

    /// Source extensions recognized by the node builder, keyed to the
    /// variant each produces (`.m` is handled structurally, not listed
    /// here, since it dispatches to Script/Function/Classdef).
    pub opaque_extensions: Vec<String>,

    /// Path to the external built-in reference JSON file, if any. Absence
    /// or corruption is tolerated: the engine falls back to an empty
    /// built-in set.
    pub builtins_path: Option<PathBuf>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            dependency_analysis: true,
            show_progress: false,
            opaque_extensions: vec![
                ".p".to_string(),
                ".mlx".to_string(),
                ".mlapp".to_string(),
                ".mex".to_string(),
                ".mexa64".to_string(),
                ".mexmaci64".to_string(),
                ".mexw32".to_string(),
                ".mexw64".to_string(),
            ],
            builtins_path: None,
        }
    }
}

impl IndexerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.opaque_extensions.is_empty() {
            return Err("opaque_extensions cannot be empty".to_string());
        }
        Ok(())
    }

    /// Classify an extension (without leading dot) as one of the opaque,
    /// unparsed artifact kinds, rather than parsed structurally (`.m`) or
    /// ignored entirely.
    pub fn opaque_extension(&self, extension: &str) -> bool {
        self.opaque_extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.') == extension.trim_start_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_dependency_analysis() {
        let config = IndexerConfig::default();
        assert!(config.dependency_analysis);
        assert!(!config.show_progress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn opaque_extension_recognizes_mex_variants() {
        let config = IndexerConfig::default();
        assert!(config.opaque_extension("mlx"));
        assert!(config.opaque_extension(".mexw64"));
        assert!(!config.opaque_extension("m"));
    }

    #[test]
    fn empty_opaque_extensions_fails_validation() {
        let mut config = IndexerConfig::default();
        config.opaque_extensions.clear();
        assert!(config.validate().is_err());
    }
}
