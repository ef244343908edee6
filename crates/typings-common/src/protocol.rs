use crate::error::ProtocolError;
use crate::types::RegistryEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Requests sent from the language server to the worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Request {
    /// Resolve and install typings for a project
    Discover(DiscoverRequest),
    /// Forget everything known about a project
    CloseProject(CloseProjectRequest),
    /// Fetch the cached types registry
    TypesRegistry,
    /// Install a single package next to a source file
    InstallPackage(InstallPackageRequest),
    /// Describe the exports of a module
    InspectValue(InspectValueRequest),
}

impl Request {
    /// Every `kind` tag this worker understands
    pub const KINDS: [&'static str; 5] = [
        "discover",
        "closeProject",
        "typesRegistry",
        "installPackage",
        "inspectValue",
    ];

    /// The wire tag of this request
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Discover(_) => "discover",
            Request::CloseProject(_) => "closeProject",
            Request::TypesRegistry => "typesRegistry",
            Request::InstallPackage(_) => "installPackage",
            Request::InspectValue(_) => "inspectValue",
        }
    }

    /// Decode a request payload.
    ///
    /// The `kind` tag is checked before the body so that a request from a
    /// newer parent is reported as an unknown kind rather than as bad JSON.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ProtocolError::Malformed {
                kind: "<unparsed>".to_string(),
                message: e.to_string(),
            })?;

        let kind = value
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtocolError::MissingKind)?
            .to_string();

        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownKind(kind));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
            kind,
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    pub project_name: String,
    pub project_root_path: PathBuf,
    #[serde(default)]
    pub file_names: Vec<PathBuf>,
    #[serde(default)]
    pub compiler_options: serde_json::Value,
    #[serde(default)]
    pub type_acquisition: serde_json::Value,
    #[serde(default)]
    pub unresolved_imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloseProjectRequest {
    pub project_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstallPackageRequest {
    /// Source file the package is needed for; its project root is the install target
    pub file_name: PathBuf,
    pub package_name: String,
    pub project_name: String,
    /// Used as the install directory when no manifest is found above `file_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root_path: Option<PathBuf>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InspectValueRequest {
    pub options: InspectValueOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InspectValueOptions {
    pub file_name_to_require: PathBuf,
}

/// Responses sent from the worker back to the language server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Response {
    Discover(DiscoverResponse),
    CloseProject(CloseProjectResponse),
    TypesRegistry(TypesRegistryResponse),
    InstallPackage(PackageInstalledResponse),
    InspectValue(InspectValueResponse),
    /// Setup failed before the channel was live; sent at most once, first
    InitializationFailed(InitializationFailedResponse),
}

impl Response {
    /// The wire tag of this response
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Discover(_) => "discover",
            Response::CloseProject(_) => "closeProject",
            Response::TypesRegistry(_) => "typesRegistry",
            Response::InstallPackage(_) => "installPackage",
            Response::InspectValue(_) => "inspectValue",
            Response::InitializationFailed(_) => "initializationFailed",
        }
    }

    pub fn initialization_failed(message: impl Into<String>, stack: Option<String>) -> Self {
        Self::InitializationFailed(InitializationFailedResponse {
            message: message.into(),
            stack,
        })
    }

    pub fn package_installed(
        project_name: impl Into<String>,
        id: u64,
        success: bool,
        message: impl Into<String>,
    ) -> Self {
        Self::InstallPackage(PackageInstalledResponse {
            project_name: project_name.into(),
            id,
            success,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub project_name: String,
    /// Typings files the project should reference
    pub typings: Vec<PathBuf>,
    pub unresolved_imports: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloseProjectResponse {
    pub project_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypesRegistryResponse {
    pub types_registry: BTreeMap<String, RegistryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageInstalledResponse {
    pub project_name: String,
    pub id: u64,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectValueResponse {
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitializationFailedResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}
