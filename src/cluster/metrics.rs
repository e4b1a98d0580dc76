//! Metrics collection for cluster service queries.
//!
//! Tracks how many metadata and placement queries were issued, how many
//! failed, and how long they took. Safe to share between concurrent queries.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Most recent query records kept for inspection
pub const RECENT_QUERY_LIMIT: usize = 256;

/// Which service a query went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Status,
    List,
    BlockInfo,
}

impl QueryKind {
    fn index(self) -> usize {
        match self {
            QueryKind::Status => 0,
            QueryKind::List => 1,
            QueryKind::BlockInfo => 2,
        }
    }
}

/// Record of a single query
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub kind: QueryKind,
    pub duration: Duration,
    pub succeeded: bool,
}

/// Collector for cluster query metrics.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    query_count: AtomicUsize,
    failure_count: AtomicUsize,
    /// Query counts indexed by `QueryKind::index`
    kind_counts: [AtomicUsize; 3],
    /// Total time spent in queries (nanoseconds)
    total_query_time_ns: AtomicU64,
    /// Ring of the latest `RECENT_QUERY_LIMIT` queries
    queries: RwLock<VecDeque<QueryRecord>>,
    operation_start: RwLock<Option<Instant>>,
}

impl QueryMetrics {
    /// Create a new metrics collector wrapped in Arc for sharing
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start timing an operation
    pub fn start_operation(&self) {
        let mut start = self
            .operation_start
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *start = Some(Instant::now());
    }

    /// Record a completed query
    pub fn record_query(&self, kind: QueryKind, duration: Duration, succeeded: bool) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.kind_counts[kind.index()].fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_query_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        let mut queries = self.queries.write().unwrap_or_else(|e| e.into_inner());
        if queries.len() == RECENT_QUERY_LIMIT {
            queries.pop_front();
        }
        queries.push_back(QueryRecord {
            kind,
            duration,
            succeeded,
        });
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Number of recorded queries of one kind
    pub fn count_of(&self, kind: QueryKind) -> usize {
        self.kind_counts[kind.index()].load(Ordering::Relaxed)
    }

    pub fn total_query_time(&self) -> Duration {
        Duration::from_nanos(self.total_query_time_ns.load(Ordering::Relaxed))
    }

    /// Elapsed time since operation start
    pub fn operation_elapsed(&self) -> Option<Duration> {
        self.operation_start
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .map(|s| s.elapsed())
    }

    /// The most recent queries, oldest first
    pub fn queries(&self) -> Vec<QueryRecord> {
        self.queries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.query_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        for count in &self.kind_counts {
            count.store(0, Ordering::Relaxed);
        }
        self.total_query_time_ns.store(0, Ordering::Relaxed);
        self.queries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        *self
            .operation_start
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl fmt::Display for QueryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queries ({} failed), {:.1?} in queries",
            self.query_count(),
            self.failure_count(),
            self.total_query_time()
        )?;
        if let Some(elapsed) = self.operation_elapsed() {
            write!(f, ", {elapsed:.1?} wall")?;
        }
        Ok(())
    }
}
