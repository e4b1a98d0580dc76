//! Wildcard expansion of cluster paths.
//!
//! A segment containing `*` or `?` is matched against the children of the
//! directories reached so far. Literal segments are appended without a lookup.

use super::ClusterPath;
use crate::cluster::ClusterClient;
use crate::error::{ClusterError, Result};

/// Check whether a path string contains wildcard characters
pub fn has_wildcard(path: &str) -> bool {
    path.contains('*') || path.contains('?')
}

/// Match a name against a simple wildcard pattern (* and ?)
///
/// Backtracks only to the most recent `*`, so matching stays linear in
/// practice however many stars the pattern holds.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name: Vec<char> = name.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut n, mut p) = (0, 0);
    // Pattern index after the last star, and the name index it was tried at
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                p += 1;
                star = Some((p, n));
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((after_star, tried)) => {
                    p = after_star;
                    n = tried + 1;
                    star = Some((after_star, tried + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Expand a user path into every existing path it names.
///
/// Paths without wildcards come back as-is (resolved against `cwd`) without
/// touching the cluster; whether they exist is left to the caller's lookup.
pub async fn expand(
    client: &ClusterClient,
    cwd: &ClusterPath,
    input: &str,
) -> Result<Vec<ClusterPath>> {
    let target = ClusterPath::resolve(cwd, input);
    if !has_wildcard(input) {
        return Ok(vec![target]);
    }

    let segments = target.segments();
    let mut candidates = vec![ClusterPath::root()];

    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();

        if !has_wildcard(segment) {
            candidates = candidates.iter().map(|c| c.join(segment)).collect();
            continue;
        }

        let mut next = Vec::new();
        for dir in &candidates {
            let children = match client.list_status(&dir.to_string()).await {
                Ok(children) => children,
                // Literal segments before a wildcard may name nothing
                Err(ClusterError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            for child in children {
                // Listing a file yields the file itself, which is no child
                if ClusterPath::parse(&child.path).parent().as_ref() != Some(dir) {
                    continue;
                }
                if !matches_pattern(child.name(), segment) {
                    continue;
                }
                if !last && !child.folder {
                    continue;
                }
                next.push(dir.join(child.name()));
            }
        }
        candidates = next;
    }

    if candidates.is_empty() {
        return Err(ClusterError::NotFound(target.to_string()));
    }

    candidates.sort_by_key(|p| p.to_string());
    candidates.dedup();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("part-0001", "part-*"));
        assert!(matches_pattern("part-0001", "*"));
        assert!(matches_pattern("part-0001", "part-000?"));
        assert!(matches_pattern("a.log", "*.log"));
        assert!(matches_pattern("log", "*log"));
        assert!(!matches_pattern("a.txt", "*.log"));
        assert!(!matches_pattern("part-01", "part-?"));
        assert!(matches_pattern("", "*"));
        assert!(!matches_pattern("", "?"));
        assert!(matches_pattern("abcabd", "a*b?"));
        assert!(matches_pattern("x.tar.gz", "*.*.gz"));
        assert!(!matches_pattern("x.tar", "*.*.gz"));
        assert!(matches_pattern("abc", "**a**c*"));
    }

    #[test]
    fn test_matches_pattern_many_stars() {
        let name = "a".repeat(200);
        let pattern = format!("{}b", "*a".repeat(30));
        assert!(!matches_pattern(&name, &pattern));
        assert!(matches_pattern(&name, &"*a".repeat(30)));
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("/data/*"));
        assert!(has_wildcard("f?"));
        assert!(!has_wildcard("/data/f"));
    }
}
