pub mod cluster;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod namespace;
pub mod shell;

pub use error::ClusterError;
