use futures::stream::{self, StreamExt};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

use super::report::{BlockIssue, BlockLocations, LocationReport};
use crate::cluster::{ClusterClient, FileStatus};
use crate::error::{ClusterError, Result};

/// Default bound on concurrent placement queries
pub const DEFAULT_PARALLELISM: usize = 16;

/// Queries the placement of every block of a file and collects the results
pub struct LocationAggregator {
    client: ClusterClient,
    parallelism: NonZeroUsize,
}

impl LocationAggregator {
    pub fn new(client: ClusterClient, parallelism: NonZeroUsize) -> Self {
        LocationAggregator {
            client,
            parallelism,
        }
    }

    /// Locate every block of `file`.
    ///
    /// One placement query is issued per block, at most `parallelism` at a
    /// time. A block whose query fails keeps its slot with an empty host list
    /// and a note. Only when every query fails with a transport error is the
    /// whole call failed, with a single `Transport` error.
    pub async fn aggregate(&self, file: FileStatus) -> Result<LocationReport> {
        let mut slots: Vec<BlockLocations> = file
            .block_ids
            .iter()
            .copied()
            .map(BlockLocations::pending)
            .collect();

        let client = &self.client;
        let mut lookups = stream::iter(file.block_ids.iter().copied().enumerate())
            .map(|(index, block_id)| async move {
                (index, block_id, client.get_block_info(block_id).await)
            })
            .buffer_unordered(self.parallelism.get());

        // Completion order is arbitrary; each result goes back to its own slot
        while let Some((index, block_id, result)) = lookups.next().await {
            slots[index] = match result {
                Ok(info) => {
                    debug!(
                        block_id = %block_id,
                        replicas = info.locations.len(),
                        "located block"
                    );
                    if info.locations.is_empty() {
                        warn!(path = %file.path, block_id = %block_id, "block has no registered replicas");
                    }
                    BlockLocations::located(block_id, info.locations)
                }
                Err(e) => {
                    warn!(path = %file.path, block_id = %block_id, error = %e, "failed to locate block");
                    BlockLocations::failed(block_id, e)
                }
            };
        }
        drop(lookups);

        if let Some(error) = systemic_failure(&slots) {
            return Err(error);
        }

        Ok(LocationReport {
            file,
            blocks: slots,
        })
    }
}

/// A single transport error standing for the whole call when every block
/// lookup failed at the transport level
fn systemic_failure(blocks: &[BlockLocations]) -> Option<ClusterError> {
    let mut first = None;
    for block in blocks {
        match &block.issue {
            Some(BlockIssue::Lookup(e)) if e.is_transport() => {
                first.get_or_insert(e);
            }
            _ => return None,
        }
    }

    first.map(|e| {
        let detail = match e {
            ClusterError::Transport(msg) => msg.as_str(),
            _ => "",
        };
        ClusterError::Transport(format!(
            "placement service unreachable ({} blocks failed): {}",
            blocks.len(),
            detail
        ))
    })
}
