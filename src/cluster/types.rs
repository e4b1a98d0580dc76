use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a file in the metadata namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one block of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a path as reported by the metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub file_id: FileId,
    /// Path as it was looked up
    pub path: String,
    /// Block ids in file offset order
    pub block_ids: Vec<BlockId>,
    pub folder: bool,
    pub length: u64,
}

impl FileStatus {
    /// Last path segment, or "/" for the root
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("/")
    }
}

/// Network address of a worker node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerAddress {
    pub host: String,
    #[serde(default)]
    pub rpc_port: u16,
    #[serde(default)]
    pub data_port: u16,
}

impl fmt::Display for WorkerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.rpc_port)
    }
}

/// One worker holding a replica of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaLocation {
    #[serde(flatten)]
    pub worker_address: WorkerAddress,
    /// Storage tier the replica lives in (MEM, SSD, HDD...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

impl ReplicaLocation {
    pub fn new(host: impl Into<String>) -> Self {
        ReplicaLocation {
            worker_address: WorkerAddress {
                host: host.into(),
                rpc_port: 0,
                data_port: 0,
            },
            tier: None,
        }
    }

    /// Host label of the worker
    pub fn host(&self) -> &str {
        &self.worker_address.host
    }
}

/// Placement of a block as reported by the placement service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub block_id: BlockId,
    #[serde(default)]
    pub locations: Vec<ReplicaLocation>,
}
