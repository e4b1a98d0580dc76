use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::location::DEFAULT_PARALLELISM;

/// Command-line options
#[derive(Debug, Parser)]
#[command(name = "blocksh", version, about = "Inspect block placement in a distributed file store")]
pub struct Cli {
    /// Cluster snapshot to query (JSON)
    #[arg(long, env = "BLOCKSH_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Maximum number of concurrent block placement queries
    #[arg(long, env = "BLOCKSH_PARALLELISM", default_value_t = ShellConfig::default().parallelism)]
    pub parallelism: NonZeroUsize,

    /// Run a single command line and exit
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Settings for the shell session
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            parallelism: self.parallelism,
        }
    }

    /// Snapshot path, falling back to ~/.blocksh/cluster.json
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot.clone().or_else(|| {
            dirs::home_dir().map(|mut p| {
                p.push(".blocksh");
                p.push("cluster.json");
                p
            })
        })
    }
}

/// Settings that shape how shell commands query the cluster
#[derive(Debug, Clone, Copy)]
pub struct ShellConfig {
    /// Bound on concurrent placement queries per file
    pub parallelism: NonZeroUsize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            parallelism: NonZeroUsize::new(DEFAULT_PARALLELISM).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
