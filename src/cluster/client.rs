use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use super::metrics::{QueryKind, QueryMetrics};
use super::types::{BlockId, BlockInfo, FileStatus};
use crate::error::Result;

/// Metadata service: maps paths to file identities and block sequences
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Look up the status of a single path
    async fn get_status(&self, path: &str) -> Result<FileStatus>;

    /// List the direct children of a directory
    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>>;
}

/// Placement service: maps block ids to the workers currently serving them
#[async_trait]
pub trait PlacementService: Send + Sync {
    /// Look up the current replica locations of a block
    async fn get_block_info(&self, block_id: BlockId) -> Result<BlockInfo>;
}

/// Handle to both cluster services, passed explicitly to whoever needs them
#[derive(Clone)]
pub struct ClusterClient {
    metadata: Arc<dyn MetadataService>,
    placement: Arc<dyn PlacementService>,
    metrics: Arc<QueryMetrics>,
}

impl ClusterClient {
    pub fn new(metadata: Arc<dyn MetadataService>, placement: Arc<dyn PlacementService>) -> Self {
        ClusterClient {
            metadata,
            placement,
            metrics: QueryMetrics::new(),
        }
    }

    /// Build a client from one backend serving both interfaces
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: MetadataService + PlacementService + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    /// Get the status of a path
    pub async fn get_status(&self, path: &str) -> Result<FileStatus> {
        let started = Instant::now();
        let result = self.metadata.get_status(path).await;
        self.metrics
            .record_query(QueryKind::Status, started.elapsed(), result.is_ok());
        result
    }

    /// List the children of a directory
    pub async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
        let started = Instant::now();
        let result = self.metadata.list_status(path).await;
        self.metrics
            .record_query(QueryKind::List, started.elapsed(), result.is_ok());
        result
    }

    /// Get the placement of one block
    pub async fn get_block_info(&self, block_id: BlockId) -> Result<BlockInfo> {
        let started = Instant::now();
        let result = self.placement.get_block_info(block_id).await;
        self.metrics
            .record_query(QueryKind::BlockInfo, started.elapsed(), result.is_ok());
        result
    }
}
