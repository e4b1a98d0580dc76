use thiserror::Error;

/// Errors reported by the metadata and placement services
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// Path or block does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller may not access the path
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Service unreachable or returned a malformed response
    #[error("transport error: {0}")]
    Transport(String),

    /// User supplied a path that cannot be looked up
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Cluster snapshot could not be read or parsed
    #[error("cannot load cluster snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },
}

impl ClusterError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClusterError::Transport(_))
    }
}

pub type Result<T, E = ClusterError> = std::result::Result<T, E>;
