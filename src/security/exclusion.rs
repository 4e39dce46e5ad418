//! System paths that bypass admission control.
//!
//! A path is excluded when it equals an entry or sits below it
//! (`entry + "/"`). Matching is case-sensitive and runs on the normalized
//! path (trailing slash removed, root kept as `/`).

/// Paths never counted against any identity.
pub const EXCLUDED_PATHS: &[&str] = &["/", "/health", "/api-docs"];

/// Static allow-list filter in front of the admission controller.
#[derive(Debug, Clone)]
pub struct PathExclusionFilter {
    excluded: Vec<String>,
}

impl Default for PathExclusionFilter {
    fn default() -> Self {
        Self::new(EXCLUDED_PATHS.iter().copied())
    }
}

impl PathExclusionFilter {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: paths
                .into_iter()
                .map(|p| normalize_path(p.as_ref()).to_string())
                .collect(),
        }
    }

    /// Returns true if the path skips rate limiting.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.excluded.iter().any(|entry| {
            path == entry.as_str()
                || path
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// Strip trailing slashes; an empty result becomes `/`.
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_nested() {
        let filter = PathExclusionFilter::default();
        assert!(filter.is_excluded("/"));
        assert!(filter.is_excluded("/health"));
        assert!(filter.is_excluded("/health/"));
        assert!(filter.is_excluded("/health/ready"));
        assert!(filter.is_excluded("/api-docs/openapi.json"));
    }

    #[test]
    fn test_prefix_is_not_enough() {
        let filter = PathExclusionFilter::default();
        assert!(!filter.is_excluded("/healthcheck"));
        assert!(!filter.is_excluded("/api-docsx"));
        assert!(!filter.is_excluded("/api/v1/workouts"));
        assert!(!filter.is_excluded("/Health"));
    }

    #[test]
    fn test_root_does_not_match_everything() {
        let filter = PathExclusionFilter::new(["/"]);
        assert!(filter.is_excluded("/"));
        assert!(filter.is_excluded(""));
        assert!(!filter.is_excluded("/api"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_path("/a/b/"), "/a/b");
        assert_eq!(normalize_path("///"), "/");
        assert_eq!(normalize_path(""), "/");
    }
}
