use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// npm package that publishes the index of known `@types` packages
pub const TYPES_REGISTRY_PACKAGE: &str = "types-registry";

/// File whose presence marks a directory as a project root
pub const PROJECT_MANIFEST: &str = "package.json";

/// Metadata for one typed package, keyed by dist tag (e.g. `latest`, `ts4.9`)
pub type RegistryEntry = BTreeMap<String, String>;

/// Package name to metadata, loaded once at startup
pub type TypesRegistry = HashMap<String, RegistryEntry>;

/// On-disk shape of `types-registry/index.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesRegistryFile {
    pub entries: HashMap<String, RegistryEntry>,
}

/// Worker configuration, built from the command line the parent passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Shared cache directory that holds installed typings and the registry package
    pub global_cache_location: PathBuf,
    /// Optional diagnostic log file; logging is disabled without one
    pub log_file: Option<PathBuf>,
    /// Explicit package manager executable
    pub npm_location: Option<String>,
    /// Search `PATH` for npm instead of trusting a bare `npm`
    pub validate_default_npm_location: bool,
    pub typing_safe_list_location: Option<PathBuf>,
    pub types_map_location: Option<PathBuf>,
}

impl WorkerConfig {
    /// Create a configuration with the given cache directory and defaults elsewhere
    pub fn with_cache(global_cache_location: impl Into<PathBuf>) -> Self {
        Self {
            global_cache_location: global_cache_location.into(),
            ..Self::default()
        }
    }

    /// Location of the registry index inside the cache
    pub fn types_registry_path(&self) -> PathBuf {
        self.global_cache_location
            .join("node_modules")
            .join(TYPES_REGISTRY_PACKAGE)
            .join("index.json")
    }

    /// Location of the cache directory's own package manifest
    pub fn cache_manifest_path(&self) -> PathBuf {
        self.global_cache_location.join(PROJECT_MANIFEST)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            global_cache_location: base.join("typescript"),
            log_file: None,
            npm_location: None,
            validate_default_npm_location: false,
            typing_safe_list_location: None,
            types_map_location: None,
        }
    }
}
