//! Container name filtering

use regex::Regex;
use tracing::error;

/// Decides which containers take part in routing.
///
/// A pattern that fails to compile is reported once, when the filter is
/// built, and the filter then rejects every name.
#[derive(Clone, Debug)]
pub struct NameFilter {
    pattern: String,
    regex: Option<Regex>,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Self {
        match Self::compile(pattern) {
            Ok(filter) => filter,
            Err(e) => {
                error!(pattern = %pattern, error = %e, "No container will match");
                Self {
                    pattern: pattern.to_string(),
                    regex: None,
                }
            }
        }
    }

    fn compile(pattern: &str) -> crate::Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex: Some(regex),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern compiled
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Unanchored search of `name` against the pattern
    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all() {
        let filter = NameFilter::new(".*");
        assert!(filter.matches("web1"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_unanchored_search() {
        let filter = NameFilter::new("web");
        assert!(filter.matches("my-web-1"));
        assert!(!filter.matches("db1"));
    }

    #[test]
    fn test_anchored_pattern() {
        let filter = NameFilter::new("^app-[0-9]+$");
        assert!(filter.matches("app-12"));
        assert!(!filter.matches("app-x"));
        assert!(!filter.matches("my-app-12"));
    }

    #[test]
    fn test_malformed_pattern_fails_closed() {
        let filter = NameFilter::new("web[");
        assert!(!filter.is_valid());
        assert!(!filter.matches("web1"));
        assert!(!filter.matches(""));
        assert_eq!(filter.pattern(), "web[");
    }

    #[test]
    fn test_compile_error_is_a_filter_error() {
        let err = NameFilter::compile("(").unwrap_err();
        assert_eq!(err.kind(), "filter");
        assert!(err.to_string().starts_with("Invalid name pattern"));
        assert!(NameFilter::compile("ok").is_ok());
    }
}
