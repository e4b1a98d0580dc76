//! Resolution and aggregation against in-memory service doubles.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use blocksh::ClusterError;
use blocksh::cluster::{
    BlockId, BlockInfo, ClusterClient, FileId, FileStatus, MetadataService, PlacementService,
    ReplicaLocation,
};
use blocksh::cluster::metrics::QueryKind;
use blocksh::location::{BlockIssue, LocationAggregator, PathResolver};

/// What the placement double answers for a block
#[derive(Clone)]
enum Placement {
    Hosts(Vec<&'static str>),
    Fail(ClusterError),
    Hang,
}

/// Metadata and placement double with per-block behaviour
#[derive(Default)]
struct FakeCluster {
    files: HashMap<String, Result<FileStatus, ClusterError>>,
    blocks: HashMap<BlockId, Placement>,
    /// Per-block artificial latency
    delays: HashMap<BlockId, Duration>,
    placement_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCluster {
    fn with_file(mut self, path: &str, id: u64, blocks: &[u64]) -> Self {
        self.files.insert(
            path.to_string(),
            Ok(FileStatus {
                file_id: FileId(id),
                path: path.to_string(),
                block_ids: blocks.iter().copied().map(BlockId).collect(),
                folder: false,
                length: 0,
            }),
        );
        self
    }

    fn with_path_error(mut self, path: &str, error: ClusterError) -> Self {
        self.files.insert(path.to_string(), Err(error));
        self
    }

    fn with_block(mut self, block: u64, placement: Placement) -> Self {
        self.blocks.insert(BlockId(block), placement);
        self
    }

    fn with_delay(mut self, block: u64, delay: Duration) -> Self {
        self.delays.insert(BlockId(block), delay);
        self
    }
}

#[async_trait]
impl MetadataService for FakeCluster {
    async fn get_status(&self, path: &str) -> Result<FileStatus, ClusterError> {
        self.files
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ClusterError::NotFound(path.to_string())))
    }

    async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>, ClusterError> {
        Err(ClusterError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl PlacementService for FakeCluster {
    async fn get_block_info(&self, block_id: BlockId) -> Result<BlockInfo, ClusterError> {
        self.placement_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&block_id) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.blocks.get(&block_id) {
            Some(Placement::Hosts(hosts)) => Ok(BlockInfo {
                block_id,
                locations: hosts.iter().map(|h| ReplicaLocation::new(*h)).collect(),
            }),
            Some(Placement::Fail(e)) => Err(e.clone()),
            Some(Placement::Hang) => std::future::pending().await,
            None => Err(ClusterError::NotFound(format!("block {block_id}"))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn parallelism(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn setup(fake: FakeCluster, width: usize) -> (Arc<FakeCluster>, PathResolver, LocationAggregator) {
    let fake = Arc::new(fake);
    let client = ClusterClient::from_backend(Arc::clone(&fake));
    let resolver = PathResolver::new(client.clone());
    let aggregator = LocationAggregator::new(client, parallelism(width));
    (fake, resolver, aggregator)
}

fn transport() -> ClusterError {
    ClusterError::Transport("connection refused".to_string())
}

#[tokio::test]
async fn test_two_block_example() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2])
        .with_block(1, Placement::Hosts(vec!["hostA", "hostB"]))
        .with_block(2, Placement::Hosts(vec!["hostB"]));
    let (_, resolver, aggregator) = setup(fake, 4);

    let status = resolver.resolve("/data/f").await.unwrap();
    assert_eq!(status.file_id, FileId(42));

    let report = aggregator.aggregate(status).await.unwrap();
    assert_eq!(report.path(), "/data/f");
    assert_eq!(report.file_id(), FileId(42));

    let per_block: Vec<Vec<&str>> = report.blocks.iter().map(|b| b.hosts().collect()).collect();
    assert_eq!(per_block, vec![vec!["hostA", "hostB"], vec!["hostB"]]);

    let lines: Vec<String> = report.lines().collect();
    assert_eq!(
        lines,
        vec!["/data/f with file id 42 is on nodes:", "hostA", "hostB", "hostB"]
    );
}

#[tokio::test]
async fn test_slots_keep_block_order_under_out_of_order_completion() {
    let block_ids: Vec<u64> = (1..=20).collect();
    let mut fake = FakeCluster::default().with_file("/data/big", 7, &block_ids);
    for id in &block_ids {
        // Later blocks finish first
        let host: &'static str = Box::leak(format!("host-{id}").into_boxed_str());
        fake = fake
            .with_block(*id, Placement::Hosts(vec![host]))
            .with_delay(*id, Duration::from_millis(2 * (21 - id)));
    }
    let (fake, resolver, aggregator) = setup(fake, 4);

    let status = resolver.resolve("/data/big").await.unwrap();
    let report = aggregator.aggregate(status).await.unwrap();

    assert_eq!(report.blocks.len(), 20);
    for (block, id) in report.blocks.iter().zip(&block_ids) {
        assert_eq!(block.block_id, BlockId(*id));
        assert_eq!(block.hosts().collect::<Vec<_>>(), vec![format!("host-{id}")]);
    }
    assert!(fake.max_in_flight.load(Ordering::SeqCst) <= 4);
    assert_eq!(fake.placement_calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_missing_path_never_queries_placement() {
    let fake = FakeCluster::default().with_file("/data/f", 42, &[1]);
    let (fake, resolver, _) = setup(fake, 4);

    let err = resolver.resolve("/data/missing").await.unwrap_err();
    assert!(matches!(err, ClusterError::NotFound(_)));
    assert_eq!(fake.placement_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_path_errors_surface_verbatim() {
    let fake = FakeCluster::default()
        .with_path_error("/secret", ClusterError::PermissionDenied("/secret".into()))
        .with_path_error("/flaky", transport());
    let (_, resolver, _) = setup(fake, 4);

    assert_eq!(
        resolver.resolve("/secret").await.unwrap_err(),
        ClusterError::PermissionDenied("/secret".into())
    );
    assert_eq!(resolver.resolve("/flaky").await.unwrap_err(), transport());
    assert!(matches!(
        resolver.resolve("  ").await,
        Err(ClusterError::InvalidPath(_))
    ));
}

#[tokio::test]
async fn test_missing_block_keeps_its_slot() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2, 3])
        .with_block(1, Placement::Hosts(vec!["hostA"]))
        .with_block(3, Placement::Hosts(vec!["hostC", "hostA"]));
    let (_, resolver, aggregator) = setup(fake, 2);

    let report = aggregator
        .aggregate(resolver.resolve("/data/f").await.unwrap())
        .await
        .unwrap();

    assert_eq!(report.blocks.len(), 3);
    assert_eq!(report.blocks[0].hosts().collect::<Vec<_>>(), vec!["hostA"]);
    assert!(report.blocks[1].locations.is_empty());
    assert!(matches!(
        report.blocks[1].issue,
        Some(BlockIssue::Lookup(ClusterError::NotFound(_)))
    ));
    // Replica order is whatever the placement service returned
    assert_eq!(
        report.blocks[2].hosts().collect::<Vec<_>>(),
        vec!["hostC", "hostA"]
    );
    assert_eq!(report.hosts().count(), 3);
}

#[tokio::test]
async fn test_zero_replicas_is_recorded() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 1, &[1, 2])
        .with_block(1, Placement::Hosts(vec![]))
        .with_block(2, Placement::Hosts(vec!["hostB"]));
    let (_, resolver, aggregator) = setup(fake, 2);

    let report = aggregator
        .aggregate(resolver.resolve("/data/f").await.unwrap())
        .await
        .unwrap();

    assert_eq!(report.blocks[0].issue, Some(BlockIssue::NoReplicas));
    assert!(report.blocks[1].is_resolved());
}

#[tokio::test]
async fn test_all_transport_failures_become_one_error() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2, 3])
        .with_block(1, Placement::Fail(transport()))
        .with_block(2, Placement::Fail(transport()))
        .with_block(3, Placement::Fail(transport()));
    let (_, resolver, aggregator) = setup(fake, 8);

    let err = aggregator
        .aggregate(resolver.resolve("/data/f").await.unwrap())
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_partial_transport_failure_still_reports() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2])
        .with_block(1, Placement::Fail(transport()))
        .with_block(2, Placement::Hosts(vec!["hostB"]));
    let (_, resolver, aggregator) = setup(fake, 8);

    let report = aggregator
        .aggregate(resolver.resolve("/data/f").await.unwrap())
        .await
        .unwrap();
    assert_eq!(report.unresolved().count(), 1);
    assert_eq!(report.hosts().collect::<Vec<_>>(), vec!["hostB"]);
}

#[tokio::test]
async fn test_empty_file_yields_empty_report() {
    let fake = FakeCluster::default().with_file("/data/empty", 5, &[]);
    let (fake, resolver, aggregator) = setup(fake, 4);

    let report = aggregator
        .aggregate(resolver.resolve("/data/empty").await.unwrap())
        .await
        .unwrap();
    assert!(report.blocks.is_empty());
    assert_eq!(report.lines().count(), 1);
    assert_eq!(fake.placement_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_aggregate_is_repeatable() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2])
        .with_block(1, Placement::Hosts(vec!["hostA", "hostB"]))
        .with_block(2, Placement::Hosts(vec!["hostB"]))
        .with_delay(1, Duration::from_millis(5));
    let (fake, resolver, aggregator) = setup(fake, 2);

    let status = resolver.resolve("/data/f").await.unwrap();
    let first = aggregator.aggregate(status.clone()).await.unwrap();
    let second = aggregator.aggregate(status).await.unwrap();

    let host_sets = |report: &blocksh::location::LocationReport| -> Vec<HashSet<String>> {
        report
            .blocks
            .iter()
            .map(|b| b.hosts().map(String::from).collect())
            .collect()
    };
    assert_eq!(host_sets(&first), host_sets(&second));
    // Each call issues fresh queries
    assert_eq!(fake.placement_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_abandoned_aggregate_does_not_block() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2])
        .with_block(1, Placement::Hosts(vec!["hostA"]))
        .with_block(2, Placement::Hang);
    let (_, resolver, aggregator) = setup(fake, 2);

    let status = resolver.resolve("/data/f").await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(50), aggregator.aggregate(status)).await;
    assert!(outcome.is_err());
}

#[tokio::test]
async fn test_client_records_query_metrics() {
    let fake = FakeCluster::default()
        .with_file("/data/f", 42, &[1, 2])
        .with_block(1, Placement::Hosts(vec!["hostA"]));
    let fake = Arc::new(fake);
    let client = ClusterClient::from_backend(fake);
    let resolver = PathResolver::new(client.clone());
    let aggregator = LocationAggregator::new(client.clone(), parallelism(1));

    aggregator
        .aggregate(resolver.resolve("/data/f").await.unwrap())
        .await
        .unwrap();

    let metrics = client.metrics();
    assert_eq!(metrics.count_of(QueryKind::Status), 1);
    assert_eq!(metrics.count_of(QueryKind::BlockInfo), 2);
    assert_eq!(metrics.failure_count(), 1);
}
