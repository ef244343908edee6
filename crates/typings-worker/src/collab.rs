// typings-worker/src/collab.rs
// Seams for the policies that live outside the worker core
use std::path::Path;
use typings_common::{
    CloseProjectResponse, DiscoverRequest, DiscoverResponse, Response,
};

use crate::install::Installer;

/// Decides which typings a project needs and installs them through the
/// installer it is handed.
pub trait TypingsResolver {
    fn discover(&mut self, request: DiscoverRequest, installer: &mut Installer) -> Response;

    fn close_project(&mut self, project_name: &str, installer: &mut Installer) -> Response;
}

/// Describes the values a module exports
pub trait ModuleInspector {
    fn inspect(&self, module: &Path) -> serde_json::Value;
}

/// Resolver that never requests typings. Every discovery is answered with an
/// empty set and the project's unresolved imports passed back unchanged.
#[derive(Debug, Default)]
pub struct PassiveResolver;

impl TypingsResolver for PassiveResolver {
    fn discover(&mut self, request: DiscoverRequest, installer: &mut Installer) -> Response {
        let log = installer.log();
        if log.is_enabled() {
            log.write_line(&format!(
                "Got install request for project {} with {} file(s), no typings resolved",
                request.project_name,
                request.file_names.len()
            ));
        }

        Response::Discover(DiscoverResponse {
            project_name: request.project_name,
            typings: Vec::new(),
            unresolved_imports: request.unresolved_imports,
        })
    }

    fn close_project(&mut self, project_name: &str, installer: &mut Installer) -> Response {
        let log = installer.log();
        if log.is_enabled() {
            log.write_line(&format!("Closing file watchers for project '{}'", project_name));
        }

        Response::CloseProject(CloseProjectResponse {
            project_name: project_name.to_string(),
        })
    }
}

/// Inspector for hosts that cannot load modules; every result is `null`
#[derive(Debug, Default)]
pub struct NullInspector;

impl ModuleInspector for NullInspector {
    fn inspect(&self, module: &Path) -> serde_json::Value {
        tracing::debug!("Module inspection unavailable for {}", module.display());
        serde_json::Value::Null
    }
}
