// typings-worker/src/registry.rs
// Loader for the cached types-registry index
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use typings_common::{TypesRegistry, TypesRegistryFile};

use crate::log::FileLog;

/// Load the registry index at `path`.
///
/// A missing or unreadable index yields an empty registry; the worker keeps
/// running without one.
pub fn load_types_registry(path: &Path, log: &mut FileLog) -> TypesRegistry {
    if !path.exists() {
        if log.is_enabled() {
            log.write_line(&format!(
                "Types registry file '{}' does not exist",
                path.display()
            ));
        }
        return TypesRegistry::new();
    }

    match read_registry_file(path) {
        Ok(registry) => registry,
        Err(e) => {
            if log.is_enabled() {
                log.write_line(&format!(
                    "Error when loading types registry file '{}': {}, {:?}",
                    path.display(),
                    e,
                    e
                ));
            }
            tracing::warn!("Ignoring types registry {}: {:#}", path.display(), e);
            TypesRegistry::new()
        }
    }
}

fn read_registry_file(path: &Path) -> Result<TypesRegistry> {
    let content = fs::read_to_string(path).context("Failed to read types registry")?;
    let file: TypesRegistryFile =
        serde_json::from_str(&content).context("Failed to parse types registry")?;
    Ok(file.entries)
}
