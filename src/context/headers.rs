//! Ordered header multi-map.
//!
//! # Design Decisions
//! - Backed by a `Vec` so iteration follows insertion order exactly
//! - Names are `HeaderName`, which normalizes case on construction, so
//!   lookups are case-insensitive for free
//! - `append` keeps duplicates; only `insert` replaces

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

/// Header collection keyed case-insensitively, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Replace every value for `name` with `value`.
    ///
    /// The new value takes the position of the first existing one, or goes
    /// to the end if the name was absent.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(n, _)| {
                    let keep = index <= first || *n != name;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Remove every value for `name`, returning how many were dropped.
    pub fn remove(&mut self, name: impl AsHeaderName) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !name.matches(n));
        before - self.entries.len()
    }

    /// First value for `name`.
    pub fn get(&self, name: impl AsHeaderName) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(n, _)| name.matches(n))
            .map(|(_, v)| v)
    }

    /// First value for `name` as a string, if it is visible ASCII.
    pub fn get_str(&self, name: impl AsHeaderName) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: impl AsHeaderName + 'a) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| name.matches(n))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: impl AsHeaderName) -> bool {
        self.entries.iter().any(|(n, _)| name.matches(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into an `http::HeaderMap`, appending so duplicates survive.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            map.append(name.clone(), value.clone());
        }
        map
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        Self {
            entries: map.iter().map(|(n, v)| (n.clone(), v.clone())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (HeaderName, HeaderValue)>,
        fn(&'a (HeaderName, HeaderValue)) -> (&'a HeaderName, &'a HeaderValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(|(n, v)| (n, v))
    }
}

/// Anything that can name a header: a `HeaderName` or a plain `&str`.
pub trait AsHeaderName {
    fn matches(&self, name: &HeaderName) -> bool;
}

impl AsHeaderName for HeaderName {
    fn matches(&self, name: &HeaderName) -> bool {
        self == name
    }
}

impl AsHeaderName for &HeaderName {
    fn matches(&self, name: &HeaderName) -> bool {
        *self == name
    }
}

impl AsHeaderName for &str {
    fn matches(&self, name: &HeaderName) -> bool {
        name.as_str().eq_ignore_ascii_case(self)
    }
}
