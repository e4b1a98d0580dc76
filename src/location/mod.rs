//! Block location resolution: path -> file identity -> hosts per block.

pub mod aggregator;
pub mod report;
pub mod resolver;

pub use aggregator::{DEFAULT_PARALLELISM, LocationAggregator};
pub use report::{BlockIssue, BlockLocations, LocationReport};
pub use resolver::PathResolver;
