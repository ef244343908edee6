use thiserror::Error;

/// Violations of the parent/worker channel contract. All of these are fatal:
/// the worker stops instead of guessing at what the peer meant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unrecognized request kind '{0}', parent and worker protocol versions differ")]
    UnknownKind(String),
    #[error("Request has no 'kind' tag")]
    MissingKind,
    #[error("Malformed '{kind}' request: {message}")]
    Malformed { kind: String, message: String },
    #[error("Frame size {size} exceeds maximum allowed size of {max}")]
    FrameTooLarge { size: usize, max: usize },
    #[error("Received empty frame")]
    EmptyFrame,
}

/// Failures during one-time worker setup. These never stop the worker; they
/// are held back and reported once the channel is live.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to prepare typings cache directory '{path}': {source}")]
    CacheDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to update types-registry package in '{cwd}'")]
    RegistryRefresh { cwd: String },
}
