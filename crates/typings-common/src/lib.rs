// Error types
pub mod error;
pub use error::{ProtocolError, SetupError};

// Configuration and registry types
pub mod types;
pub use types::{
    RegistryEntry, TypesRegistry, TypesRegistryFile, WorkerConfig, PROJECT_MANIFEST,
    TYPES_REGISTRY_PACKAGE,
};

// IPC protocol
pub mod protocol;
pub use protocol::{
    CloseProjectRequest, CloseProjectResponse, DiscoverRequest, DiscoverResponse,
    InitializationFailedResponse, InspectValueOptions, InspectValueRequest,
    InspectValueResponse, InstallPackageRequest, PackageInstalledResponse, Request, Response,
    TypesRegistryResponse,
};
