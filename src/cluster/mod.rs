pub mod client;
pub mod metrics;
pub mod snapshot;
pub mod types;

pub use client::{ClusterClient, MetadataService, PlacementService};
pub use metrics::QueryMetrics;
pub use snapshot::SnapshotCluster;
pub use types::{BlockId, BlockInfo, FileId, FileStatus, ReplicaLocation, WorkerAddress};
