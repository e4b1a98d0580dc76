use tracing::debug;

use crate::cluster::{ClusterClient, FileStatus};
use crate::error::{ClusterError, Result};

/// Resolves a path into its file identity and ordered block ids
pub struct PathResolver {
    client: ClusterClient,
}

impl PathResolver {
    pub fn new(client: ClusterClient) -> Self {
        PathResolver { client }
    }

    /// Look up a path with a single metadata query.
    ///
    /// The block list is a snapshot taken at call time. Failures are returned
    /// as-is without retrying.
    pub async fn resolve(&self, path: &str) -> Result<FileStatus> {
        if path.trim().is_empty() {
            return Err(ClusterError::InvalidPath(path.to_string()));
        }

        let status = self.client.get_status(path).await?;
        debug!(
            path,
            file_id = %status.file_id,
            blocks = status.block_ids.len(),
            "resolved path"
        );
        Ok(status)
    }
}
