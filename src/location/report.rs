use std::iter;

use thiserror::Error;

use crate::cluster::{BlockId, FileId, FileStatus, ReplicaLocation};
use crate::error::ClusterError;

/// Why a block contributed no hosts to a report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockIssue {
    /// The placement query itself failed
    #[error("{0}")]
    Lookup(#[from] ClusterError),

    /// The block exists but no worker holds it
    #[error("no registered replicas")]
    NoReplicas,
}

/// Resolved replicas for one block of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocations {
    pub block_id: BlockId,
    /// Replicas in the order the placement service returned them
    pub locations: Vec<ReplicaLocation>,
    pub issue: Option<BlockIssue>,
}

impl BlockLocations {
    /// Slot for a block whose query has not completed yet
    pub(crate) fn pending(block_id: BlockId) -> Self {
        BlockLocations {
            block_id,
            locations: Vec::new(),
            issue: None,
        }
    }

    pub fn located(block_id: BlockId, locations: Vec<ReplicaLocation>) -> Self {
        let issue = locations.is_empty().then_some(BlockIssue::NoReplicas);
        BlockLocations {
            block_id,
            locations,
            issue,
        }
    }

    pub fn failed(block_id: BlockId, error: ClusterError) -> Self {
        BlockLocations {
            block_id,
            locations: Vec::new(),
            issue: Some(BlockIssue::Lookup(error)),
        }
    }

    /// Host labels of every replica of this block
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(ReplicaLocation::host)
    }

    pub fn is_resolved(&self) -> bool {
        self.issue.is_none()
    }
}

/// Hosts holding each block of a file, one entry per block in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub file: FileStatus,
    pub blocks: Vec<BlockLocations>,
}

impl LocationReport {
    pub fn path(&self) -> &str {
        &self.file.path
    }

    pub fn file_id(&self) -> FileId {
        self.file.file_id
    }

    /// Every replica host across all blocks, in block order
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().flat_map(|b| b.hosts())
    }

    /// Blocks that could not be located
    pub fn unresolved(&self) -> impl Iterator<Item = &BlockLocations> {
        self.blocks.iter().filter(|b| !b.is_resolved())
    }

    pub fn header(&self) -> String {
        format!("{} with file id {} is on nodes:", self.path(), self.file_id())
    }

    /// Rendered output: the header, then one host per line
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        iter::once(self.header()).chain(self.hosts().map(str::to_string))
    }

    /// Per-block breakdown, one line per block
    pub fn block_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.blocks.iter().map(|block| match &block.issue {
            Some(issue) => format!("block {}: {}", block.block_id, issue),
            None => {
                let hosts: Vec<&str> = block.hosts().collect();
                format!("block {}: {}", block.block_id, hosts.join(","))
            }
        })
    }
}
