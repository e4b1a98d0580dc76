use std::fmt;

/// A normalised path in the cluster namespace, always rooted at `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterPath {
    /// Path segments (e.g., ["data", "logs", "part-0"])
    segments: Vec<String>,
}

impl ClusterPath {
    /// The namespace root
    pub fn root() -> Self {
        ClusterPath {
            segments: Vec::new(),
        }
    }

    /// Parse a path string, dropping empty and "." segments and folding "..".
    ///
    /// A path without a leading `/` is taken relative to the root; use
    /// [`ClusterPath::resolve`] to interpret it against a working directory.
    pub fn parse(path: &str) -> Self {
        Self::root().join(path)
    }

    /// Get the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this path is the root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the parent path
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent_segments = self.segments.clone();
            parent_segments.pop();
            Some(ClusterPath {
                segments: parent_segments,
            })
        }
    }

    /// Join this path with another; ".." never climbs above the root
    pub fn join(&self, other: &str) -> Self {
        let mut new_segments = self.segments.clone();

        for segment in other.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            } else if segment == ".." {
                new_segments.pop();
            } else {
                new_segments.push(segment.to_string());
            }
        }

        ClusterPath {
            segments: new_segments,
        }
    }

    /// Resolve user input against a working directory
    pub fn resolve(cwd: &ClusterPath, input: &str) -> Self {
        if input.starts_with('/') {
            ClusterPath::parse(input)
        } else {
            cwd.join(input)
        }
    }
}

impl fmt::Display for ClusterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.segments.join("/"))
        }
    }
}
