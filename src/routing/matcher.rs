//! Route template parsing and matching.
//!
//! # Responsibilities
//! - Parse `/books/:title` style templates into fixed and capture segments
//! - Match a request path segment by segment, extracting captures
//!
//! # Design Decisions
//! - Templates and paths are split on `/` without dropping empty segments, so
//!   `/a` and `/a/` have different segment counts
//! - Segment counts must be equal; there is no prefix or wildcard matching
//! - A capture never matches an empty segment
//! - Captured values are percent-decoded; a value that does not decode to
//!   UTF-8 makes the whole match fail
//! - Duplicate capture names are allowed; the later segment wins

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::error::ConfigError;

/// Extracted capture values, keyed by name.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Fixed(String),
    Capture(String),
}

/// A parsed path template.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse a template. Fails if it does not start with `/` or has a capture
    /// without a name.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if template.contains(['?', '#']) {
            return Err(invalid("must not contain a query or fragment"));
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();
        for part in template.split('/') {
            match part.strip_prefix(':') {
                Some("") => return Err(invalid("capture segment needs a name")),
                Some(name) => {
                    if seen.contains(&name) {
                        tracing::debug!(
                            template = %template,
                            name = %name,
                            "duplicate capture name, later segment wins"
                        );
                    }
                    seen.push(name);
                    segments.push(Segment::Capture(name.to_string()));
                }
                None => segments.push(Segment::Fixed(part.to_string())),
            }
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Names of the capture segments, in template order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Fixed(_) => None,
        })
    }

    /// Match `path`, returning the captures on success.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        if path.split('/').count() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, actual) in self.segments.iter().zip(path.split('/')) {
            match segment {
                Segment::Fixed(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if actual.is_empty() {
                        return None;
                    }
                    let value = percent_decode_str(actual).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }
        Some(params)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_capture_extraction() {
        let template = RouteTemplate::parse("/products/:id").unwrap();

        assert_eq!(template.match_path("/products/42"), Some(params(&[("id", "42")])));
        assert_eq!(template.match_path("/products"), None);
        assert_eq!(template.match_path("/products/42/extra"), None);
        assert_eq!(template.match_path("/product/42"), None);
    }

    #[test]
    fn test_fixed_template() {
        let template = RouteTemplate::parse("/ping").unwrap();
        assert_eq!(template.match_path("/ping"), Some(Params::new()));
        assert_eq!(template.match_path("/ping/"), None);
        assert_eq!(template.match_path("/Ping"), None);

        let root = RouteTemplate::parse("/").unwrap();
        assert!(root.matches("/"));
        assert!(!root.matches("/x"));
    }

    #[test]
    fn test_capture_rejects_empty_segment() {
        let template = RouteTemplate::parse("/books/:title").unwrap();
        assert_eq!(template.match_path("/books/"), None);
    }

    #[test]
    fn test_values_are_unescaped() {
        let template = RouteTemplate::parse("/books/:title").unwrap();
        assert_eq!(
            template.match_path("/books/the%20hobbit"),
            Some(params(&[("title", "the hobbit")]))
        );
        assert_eq!(
            template.match_path("/books/caf%C3%A9"),
            Some(params(&[("title", "café")]))
        );
        assert_eq!(template.match_path("/books/%FF"), None);
    }

    #[test]
    fn test_multiple_and_duplicate_captures() {
        let template = RouteTemplate::parse("/users/:user/posts/:post").unwrap();
        assert_eq!(
            template.match_path("/users/ada/posts/7"),
            Some(params(&[("user", "ada"), ("post", "7")]))
        );
        assert_eq!(template.capture_names().collect::<Vec<_>>(), vec!["user", "post"]);

        let duplicate = RouteTemplate::parse("/:id/:id").unwrap();
        assert_eq!(duplicate.match_path("/first/second"), Some(params(&[("id", "second")])));
    }

    #[test]
    fn test_invalid_templates() {
        for bad in ["products/:id", "", "/products/:", "/a?b=1"] {
            assert!(
                matches!(RouteTemplate::parse(bad), Err(ConfigError::InvalidTemplate { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
