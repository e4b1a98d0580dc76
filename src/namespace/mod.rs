pub mod glob;
pub mod path;

pub use path::ClusterPath;
