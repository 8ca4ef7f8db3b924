//! Route patterns - decide whether a block applies to a request path
//!
//! Patterns follow the host router's conventions:
//! - `*` alone matches every path
//! - `*` inside a pattern matches any run of characters, `/` included
//! - `:name` matches exactly one non-empty path segment
//! - `:name?` makes that segment, and the `/` before it, optional
//! - any other `?` is rejected, since request paths never contain one
//! - everything else is literal
//!
//! Matching is case-insensitive. A trailing slash on the request path is
//! tolerated and the query string and fragment are ignored.

use regex::{Regex, RegexBuilder};

use crate::error::{BlockError, Result};

/// The pattern every block gets when it doesn't name one
pub const MATCH_ALL: &str = "*";

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    /// `None` for the match-all pattern
    regex: Option<Regex>,
}

impl RoutePattern {
    /// Compile a pattern
    ///
    /// Fails on empty patterns, patterns that are neither absolute nor
    /// wildcard-led, `:` parameters without a name, and `?` anywhere other
    /// than right after a parameter name.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| BlockError::InvalidRoutePattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern == MATCH_ALL {
            return Ok(Self::any());
        }
        if !pattern.starts_with('/') && !pattern.starts_with('*') {
            return Err(invalid("pattern must start with '/' or '*'"));
        }

        let body = if pattern.len() > 1 {
            pattern.strip_suffix('/').unwrap_or(pattern)
        } else {
            pattern
        };

        let mut source = String::from("^");
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => source.push_str(".*"),
                ':' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("parameter ':' has no name"));
                    }
                    if chars.peek() == Some(&'?') {
                        chars.next();
                        if source.ends_with('/') {
                            source.pop();
                            source.push_str("(?:/[^/]+)?");
                        } else {
                            source.push_str("(?:[^/]+)?");
                        }
                    } else {
                        source.push_str("[^/]+");
                    }
                }
                '?' => return Err(invalid("'?' is only allowed after a parameter name")),
                '/' if body == "/" => {}
                other => {
                    let mut buf = [0u8; 4];
                    source.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
        }
        source.push_str("/?$");

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex: Some(regex),
        })
    }

    /// Pattern that matches every path
    pub fn any() -> Self {
        Self {
            source: MATCH_ALL.to_string(),
            regex: None,
        }
    }

    /// The pattern as written at registration
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this pattern matches every path
    pub fn is_match_all(&self) -> bool {
        self.regex.is_none()
    }

    /// Check a request path (query string and fragment are ignored)
    pub fn matches(&self, path: &str) -> bool {
        let Some(regex) = &self.regex else {
            return true;
        };
        let path = strip_query(path);
        let path = if path.is_empty() { "/" } else { path };
        regex.is_match(path)
    }
}

/// Path portion of a URL, without `?query` or `#fragment`
pub fn strip_query(url: &str) -> &str {
    let end = url.find(&['?', '#'][..]).unwrap_or(url.len());
    &url[..end]
}
