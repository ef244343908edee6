// typings-worker/src/setup.rs
// One-time worker setup: typings cache, registry refresh, registry load
use std::fs;
use std::path::Path;
use typings_common::{Response, SetupError, PROJECT_MANIFEST, TYPES_REGISTRY_PACKAGE};

use crate::exec::CommandLine;
use crate::install::Installer;
use crate::log::FileLog;

const LATEST_DIST_TAG: &str = "latest";

/// Prepare the cache and load the registry.
///
/// A failure is not returned as an error. It comes back as the
/// `initializationFailed` response to send once the channel is live.
pub fn initialize(installer: &mut Installer) -> Option<Response> {
    let pending = match prepare_cache(installer) {
        Ok(()) => None,
        Err(e) => {
            let log = installer.log();
            if log.is_enabled() {
                log.write_line(&format!("Error updating {} package: {}", TYPES_REGISTRY_PACKAGE, e));
            }
            tracing::error!("Setup failed: {}", e);
            Some(Response::initialization_failed(e.to_string(), Some(format!("{:?}", e))))
        }
    };

    installer.load_registry();
    pending
}

fn prepare_cache(installer: &mut Installer) -> Result<(), SetupError> {
    let cache = installer.config().global_cache_location.clone();
    ensure_package_directory(&cache, installer.log())?;
    refresh_types_registry(installer, &cache)
}

/// Create `directory` with a private `package.json` so npm installs land in it
pub fn ensure_package_directory(directory: &Path, log: &mut FileLog) -> Result<(), SetupError> {
    let to_error = |source| SetupError::CacheDirectory {
        path: directory.display().to_string(),
        source,
    };

    fs::create_dir_all(directory).map_err(to_error)?;

    let manifest = directory.join(PROJECT_MANIFEST);
    if !manifest.exists() {
        if log.is_enabled() {
            log.write_line(&format!("Package.json doesn't exist in '{}'", manifest.display()));
        }
        fs::write(&manifest, "{ \"private\": true }").map_err(to_error)?;
    }

    Ok(())
}

fn refresh_types_registry(installer: &mut Installer, cache: &Path) -> Result<(), SetupError> {
    let log = installer.log();
    if log.is_enabled() {
        log.write_line(&format!("Updating {} npm package...", TYPES_REGISTRY_PACKAGE));
    }

    let command = CommandLine::new(installer.npm_path().to_string())
        .args(["install", "--ignore-scripts"])
        .arg(format!("{}@{}", TYPES_REGISTRY_PACKAGE, LATEST_DIST_TAG));

    if installer.run(&command, cache) {
        return Err(SetupError::RegistryRefresh {
            cwd: cache.display().to_string(),
        });
    }

    let log = installer.log();
    if log.is_enabled() {
        log.write_line(&format!("Updated {} npm package", TYPES_REGISTRY_PACKAGE));
    }
    Ok(())
}
