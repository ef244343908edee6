// typings-worker/src/handler.rs
// Request dispatcher: one request in, one response out
use std::collections::BTreeMap;
use typings_common::{
    InspectValueRequest, InspectValueResponse, InstallPackageRequest, Request, Response,
    TypesRegistryResponse,
};

use crate::collab::{ModuleInspector, TypingsResolver};
use crate::install::Installer;
use crate::log::indent;
use crate::project::find_project_root;

const NO_PROJECT_ROOT: &str = "Could not determine a project root path.";

/// Dispatcher owns the installer and the collaborators and answers requests
/// strictly one at a time.
pub struct Dispatcher {
    installer: Installer,
    /// Setup failure not yet delivered; cleared on the first dispatch
    pending_failure: Option<Response>,
    resolver: Box<dyn TypingsResolver>,
    inspector: Box<dyn ModuleInspector>,
}

impl Dispatcher {
    pub fn new(
        installer: Installer,
        pending_failure: Option<Response>,
        resolver: Box<dyn TypingsResolver>,
        inspector: Box<dyn ModuleInspector>,
    ) -> Self {
        Self {
            installer,
            pending_failure,
            resolver,
            inspector,
        }
    }

    pub fn installer(&mut self) -> &mut Installer {
        &mut self.installer
    }

    /// Whether a setup failure is still waiting to be delivered
    pub fn has_pending_failure(&self) -> bool {
        self.pending_failure.is_some()
    }

    /// Hand out the stashed setup failure, at most once
    pub fn take_pending_failure(&mut self) -> Option<Response> {
        self.pending_failure.take()
    }

    /// Everything to send for `request`, in order: the pending setup failure
    /// if there is one, then the request's own response.
    pub fn dispatch(&mut self, request: Request) -> Vec<Response> {
        let mut responses = Vec::with_capacity(2);
        if let Some(failure) = self.take_pending_failure() {
            responses.push(failure);
        }
        responses.push(self.handle(request));

        for response in &responses {
            self.log_response(response);
        }
        responses
    }

    /// Process a single request and return its response
    pub fn handle(&mut self, request: Request) -> Response {
        tracing::info!("{} request", request.kind());
        match request {
            Request::Discover(req) => self.resolver.discover(req, &mut self.installer),
            Request::CloseProject(req) => {
                self.resolver.close_project(&req.project_name, &mut self.installer)
            }
            Request::TypesRegistry => self.handle_types_registry(),
            Request::InstallPackage(req) => self.handle_install_package(req),
            Request::InspectValue(req) => self.handle_inspect_value(req),
        }
    }

    fn handle_types_registry(&self) -> Response {
        let types_registry: BTreeMap<_, _> = self
            .installer
            .registry()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();

        Response::TypesRegistry(TypesRegistryResponse { types_registry })
    }

    fn handle_install_package(&mut self, req: InstallPackageRequest) -> Response {
        let InstallPackageRequest {
            file_name,
            package_name,
            project_name,
            project_root_path,
            id,
        } = req;

        let Some(cwd) = find_project_root(&file_name).or(project_root_path) else {
            tracing::warn!("No project root for {}", file_name.display());
            return Response::package_installed(project_name, id, false, NO_PROJECT_ROOT);
        };

        let mut success = false;
        self.installer
            .install_worker(id, std::slice::from_ref(&package_name), &cwd, |ok| success = ok);

        let message = if success {
            format!("Package {} installed.", package_name)
        } else {
            format!("There was an error installing {}.", package_name)
        };
        Response::package_installed(project_name, id, success, message)
    }

    fn handle_inspect_value(&self, req: InspectValueRequest) -> Response {
        let result = self.inspector.inspect(&req.options.file_name_to_require);
        Response::InspectValue(InspectValueResponse { result })
    }

    fn log_response(&mut self, response: &Response) {
        let log = self.installer.log();
        if log.is_enabled() {
            let json = serde_json::to_string_pretty(response)
                .unwrap_or_else(|e| format!("<unserializable {}: {}>", response.kind(), e));
            log.write_line(&format!("Sending response:{}", indent(&json)));
        }
    }
}
