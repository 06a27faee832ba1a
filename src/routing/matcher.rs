//! Route pattern matching.
//!
//! # Responsibilities
//! - Compile a route's pattern source once at registration
//! - Match a request path against it, anchored at the start of the path
//! - Return positional captures as owned strings
//!
//! # Design Decisions
//! - Patterns are regular expressions (`^/api/topics/(\d+)/?$`)
//! - A match must begin at offset 0 even when the source omits `^`
//! - Captures are never decoded; `"42"` stays a string
//! - A capture group that does not take part in the match yields `""`

use std::fmt;

use regex::Regex;

use crate::routing::RouteError;

/// A route pattern compiled to a regular expression.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile a pattern source.
    pub fn new(source: impl Into<String>) -> Result<Self, RouteError> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| RouteError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    /// The pattern text as registered.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of capture groups, excluding the implicit whole-match group.
    pub fn capture_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Try to match `path`, returning the captures in declaration order.
    pub fn try_match(&self, path: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(path)?;
        // Leftmost-first search: if any match starts at 0, this one does.
        if captures.get(0)?.start() != 0 {
            return None;
        }

        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.source).finish()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CompiledPattern {}
