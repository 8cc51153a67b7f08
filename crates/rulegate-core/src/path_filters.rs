//! Include/exclude glob filters deciding which files a rule sees.

use std::path::Path;
use thiserror::Error;

/// A compiled glob pattern for file path matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    compiled: glob::Pattern,
}

impl GlobPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or has invalid glob syntax.
    pub fn new(pattern: &str) -> Result<Self, PathFilterError> {
        if pattern.is_empty() {
            return Err(PathFilterError::Empty);
        }
        let compiled = glob::Pattern::new(pattern).map_err(|e| PathFilterError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
        })
    }

    /// Tests whether a file path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self.compiled.matches(&path_str) {
            return true;
        }
        // `dir/**` also matches everything below `dir` when the path is
        // relative and the glob crate disagrees on the boundary.
        if let Some(prefix) = self.raw.strip_suffix("/**") {
            let normalized = prefix.trim_end_matches('/');
            if path_str.starts_with(normalized)
                && path_str
                    .as_bytes()
                    .get(normalized.len())
                    .is_some_and(|&b| b == b'/')
            {
                return true;
            }
        }
        false
    }

    /// Returns the pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Include and exclude patterns for one rule.
///
/// A path is ignored when it matches any exclude, or when includes are
/// present and it matches none of them. With no patterns nothing is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilters {
    includes: Vec<GlobPattern>,
    excludes: Vec<GlobPattern>,
}

impl PathFilters {
    /// Compiles include and exclude patterns. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error for the first pattern that does not compile.
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self, PathFilterError> {
        Ok(Self {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
        })
    }

    /// Returns true if there are no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Returns true if `path` must be skipped.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.excludes.iter().any(|pattern| pattern.matches(path)) {
            return true;
        }
        !self.includes.is_empty() && !self.includes.iter().any(|pattern| pattern.matches(path))
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<GlobPattern>, PathFilterError> {
    patterns
        .iter()
        .map(|pattern| pattern.as_ref().trim())
        .filter(|pattern| !pattern.is_empty())
        .map(GlobPattern::new)
        .collect()
}

/// Errors building path filters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathFilterError {
    /// Glob pattern is empty.
    #[error("glob pattern must not be empty")]
    Empty,

    /// Glob pattern has invalid syntax.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    Invalid {
        /// The invalid pattern.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },
}
