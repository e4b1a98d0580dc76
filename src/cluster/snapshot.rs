//! Cluster backend that serves a JSON snapshot of the namespace and block placement.
//!
//! ```json
//! {
//!   "files": [
//!     { "path": "/data/f", "file_id": 42, "block_ids": [1, 2], "length": 1024 }
//!   ],
//!   "blocks": [
//!     { "block_id": 1, "locations": [{ "host": "worker-a", "rpc_port": 29999, "tier": "MEM" }] }
//!   ]
//! }
//! ```
//!
//! Parent directories of listed entries exist implicitly and get fresh file ids.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::client::{MetadataService, PlacementService};
use super::types::{BlockId, BlockInfo, FileId, FileStatus};
use crate::error::{ClusterError, Result};
use crate::namespace::ClusterPath;

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    files: Vec<FileEntry>,
    #[serde(default)]
    blocks: Vec<BlockInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileEntry {
    path: String,
    file_id: FileId,
    #[serde(default)]
    block_ids: Vec<BlockId>,
    #[serde(default)]
    folder: bool,
    #[serde(default)]
    length: u64,
    #[serde(default = "default_readable")]
    readable: bool,
}

fn default_readable() -> bool {
    true
}

impl FileEntry {
    fn directory(path: String, file_id: FileId) -> Self {
        FileEntry {
            path,
            file_id,
            block_ids: Vec::new(),
            folder: true,
            length: 0,
            readable: true,
        }
    }

    fn to_status(&self) -> FileStatus {
        FileStatus {
            file_id: self.file_id,
            path: self.path.clone(),
            block_ids: self.block_ids.clone(),
            folder: self.folder,
            length: self.length,
        }
    }
}

/// In-memory cluster loaded from a snapshot document
#[derive(Debug)]
pub struct SnapshotCluster {
    /// Entries keyed by normalised absolute path
    entries: BTreeMap<String, FileEntry>,
    blocks: HashMap<BlockId, BlockInfo>,
}

impl SnapshotCluster {
    /// Load a snapshot from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClusterError::Snapshot {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        Self::from_json(&text).map_err(|e| match e {
            ClusterError::Snapshot { reason, .. } => ClusterError::Snapshot {
                path: display,
                reason,
            },
            other => other,
        })
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        let document: SnapshotDocument =
            serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: SnapshotDocument) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for mut entry in document.files {
            if !entry.path.starts_with('/') {
                return Err(invalid(format!("path {:?} is not absolute", entry.path)));
            }
            let normalised = ClusterPath::parse(&entry.path).to_string();
            entry.path = normalised.clone();
            if entries.insert(normalised.clone(), entry).is_some() {
                return Err(invalid(format!("path {normalised} listed twice")));
            }
        }

        // Materialise implicit parent directories, the root included
        let mut next_id = entries
            .values()
            .map(|e| e.file_id.0)
            .max()
            .map_or(0, |max| max + 1);
        let mut missing: Vec<String> = Vec::new();
        for path in entries.keys() {
            let mut parent = ClusterPath::parse(path).parent();
            while let Some(dir) = parent {
                let key = dir.to_string();
                if !entries.contains_key(&key) && !missing.contains(&key) {
                    missing.push(key);
                }
                parent = dir.parent();
            }
        }
        if !entries.contains_key("/") && !missing.iter().any(|p| p == "/") {
            missing.push("/".to_string());
        }
        missing.sort();
        for path in missing {
            entries.insert(path.clone(), FileEntry::directory(path, FileId(next_id)));
            next_id += 1;
        }

        let blocks = document
            .blocks
            .into_iter()
            .map(|info| (info.block_id, info))
            .collect();

        Ok(SnapshotCluster { entries, blocks })
    }

    fn lookup(&self, path: &str) -> Result<&FileEntry> {
        if path.is_empty() {
            return Err(ClusterError::InvalidPath(path.to_string()));
        }
        let key = ClusterPath::parse(path).to_string();
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| ClusterError::NotFound(key.clone()))?;
        if !entry.readable {
            return Err(ClusterError::PermissionDenied(key));
        }
        Ok(entry)
    }
}

fn invalid(reason: String) -> ClusterError {
    ClusterError::Snapshot {
        path: "<inline>".to_string(),
        reason,
    }
}

#[async_trait]
impl MetadataService for SnapshotCluster {
    async fn get_status(&self, path: &str) -> Result<FileStatus> {
        self.lookup(path).map(FileEntry::to_status)
    }

    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
        let entry = self.lookup(path)?;
        if !entry.folder {
            return Ok(vec![entry.to_status()]);
        }

        let dir = ClusterPath::parse(&entry.path);
        Ok(self
            .entries
            .values()
            .filter(|e| ClusterPath::parse(&e.path).parent().as_ref() == Some(&dir))
            .map(FileEntry::to_status)
            .collect())
    }
}

#[async_trait]
impl PlacementService for SnapshotCluster {
    async fn get_block_info(&self, block_id: BlockId) -> Result<BlockInfo> {
        self.blocks
            .get(&block_id)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(format!("block {block_id}")))
    }
}
