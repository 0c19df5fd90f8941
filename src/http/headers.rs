//! HTTP header map with case-insensitive name lookup.
//!
//! Header fields are order-preserving and case-insensitive per RFC 9110 §5.
//! Receipt order matters here: the request journal prints headers in the
//! order the client sent them.

use std::fmt;

/// A case-insensitive, multi-value HTTP header map.
///
/// Preserves insertion order and allows repeated names, matching the
/// semantics of HTTP/1.1 header fields (RFC 9110 §5.3).
///
/// # Examples
///
/// ```
/// use reqtap::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("X-Trace", "first");
/// headers.insert("X-Trace", "second");
///
/// let all: Vec<_> = headers.get_all("x-trace").collect();
/// assert_eq!(all, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Repeated names are preserved as separate entries.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value for the given name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given name (case-insensitive).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in receipt order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns each unique header name in first-seen order.
    ///
    /// Used to render one journal line per header name with all of that
    /// name's values collected behind it.
    pub fn unique_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().enumerate().filter_map(|(i, (k, _))| {
            let seen_before = self.entries[..i]
                .iter()
                .any(|(prev, _)| prev.eq_ignore_ascii_case(k));
            (!seen_before).then_some(k.as_str())
        })
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(h.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn multi_value_receipt_order() {
        let mut h = Headers::new();
        h.insert("Accept-Encoding", "gzip");
        h.insert("Accept-Encoding", "br");
        let vals: Vec<_> = h.get_all("accept-encoding").collect();
        assert_eq!(vals, vec!["gzip", "br"]);
    }

    #[test]
    fn unique_names_groups_repeats() {
        let mut h = Headers::new();
        h.insert("Host", "localhost");
        h.insert("X-Tag", "a");
        h.insert("host", "ignored-dup");
        h.insert("X-Tag", "b");
        let names: Vec<_> = h.unique_names().collect();
        assert_eq!(names, vec!["Host", "X-Tag"]);
    }

    #[test]
    fn contains() {
        let mut h = Headers::new();
        h.insert("Content-Encoding", "gzip");
        assert!(h.contains("content-encoding"));
        assert!(!h.contains("x-missing"));
    }
}
