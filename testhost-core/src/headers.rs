//! Request headers: a write phase followed by a frozen read phase.
//!
//! A test appends headers through [`HeaderCell::append`] while the cell is
//! in [`HeaderState::Building`]. The first read of the header set moves the
//! cell to [`HeaderState::Frozen`]: the accumulator is consumed into an
//! immutable [`Headers`] snapshot and every later append fails with
//! [`Error::HeadersFrozen`].
//!
//! ```rust
//! use testhost_core::headers::HeaderCell;
//!
//! let cell = HeaderCell::new();
//! cell.append("Accept", "text/html").unwrap();
//!
//! let headers = cell.freeze();
//! assert_eq!(headers.get("accept"), Some("text/html"));
//! assert!(cell.append("Accept", "application/json").is_err());
//! ```

use crate::values::StringValues;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Well-known header names used by the double.
pub mod names {
    pub const HOST: &str = "Host";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
    pub const COOKIE: &str = "Cookie";
}

/// Immutable header set.
///
/// Names are stored exactly as they were appended. Lookups ignore ASCII case,
/// and a lookup collects values from every entry whose name matches.
#[derive(Clone, PartialEq, Eq)]
pub struct Headers {
    inner: StringValues,
}

impl Headers {
    /// An empty header set.
    pub const fn empty() -> Self {
        Self {
            inner: StringValues::case_insensitive(),
        }
    }

    /// First value for `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name)
    }

    /// All values for `name`, in append order.
    #[inline]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.inner.get_all(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.inner.iter()
    }

    /// Number of distinct header names.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    // ========================================================================
    // Common Header Accessors
    // ========================================================================

    /// Get Content-Type header.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.get(names::CONTENT_TYPE)
    }

    /// Get Content-Length header as usize.
    #[inline]
    pub fn content_length(&self) -> Option<usize> {
        self.get(names::CONTENT_LENGTH)?.trim().parse().ok()
    }

    /// Get Host header.
    #[inline]
    pub fn host(&self) -> Option<&str> {
        self.get(names::HOST)
    }

    /// Whether the content type names a `multipart/*` media type.
    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.split(';').next())
            .map(|mime| {
                mime.trim()
                    .get(..10)
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
            })
            .unwrap_or(false)
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = HeaderBuilder::new();
        for (name, value) in iter {
            builder.append(name, value);
        }
        builder.build()
    }
}

/// Mutable accumulator for headers before they are frozen.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    inner: StringValues,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self {
            inner: StringValues::case_insensitive(),
        }
    }

    /// Append `value` to the list for `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.append(name, value);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consume the accumulator into an immutable header set.
    pub fn build(self) -> Headers {
        Headers { inner: self.inner }
    }
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a request's headers.
pub enum HeaderState {
    /// Headers may still be appended.
    Building(HeaderBuilder),
    /// Headers have been read; the snapshot is final.
    Frozen(Arc<Headers>),
}

/// Guards the one-way `Building -> Frozen` transition.
///
/// The transition happens under a lock so that, if the cell is shared
/// across threads, exactly one reader performs it and every append either
/// lands before the snapshot or fails.
pub struct HeaderCell {
    state: Mutex<HeaderState>,
}

impl HeaderCell {
    /// A cell in the building state with no headers.
    pub fn new() -> Self {
        Self::from_builder(HeaderBuilder::new())
    }

    /// A cell in the building state seeded with `builder`'s headers.
    pub fn from_builder(builder: HeaderBuilder) -> Self {
        Self {
            state: Mutex::new(HeaderState::Building(builder)),
        }
    }

    /// Append a header value.
    ///
    /// Fails with [`Error::HeadersFrozen`] once the header set has been read.
    pub fn append(&self, name: &str, value: &str) -> Result<()> {
        match &mut *self.state.lock() {
            HeaderState::Building(builder) => {
                builder.append(name, value);
                Ok(())
            }
            HeaderState::Frozen(_) => Err(Error::HeadersFrozen {
                name: name.to_string(),
            }),
        }
    }

    /// Read the header set, freezing it on first call.
    ///
    /// Every call after the first returns the same snapshot.
    pub fn freeze(&self) -> Arc<Headers> {
        let mut state = self.state.lock();
        let headers = match &mut *state {
            HeaderState::Frozen(headers) => return Arc::clone(headers),
            HeaderState::Building(builder) => Arc::new(std::mem::take(builder).build()),
        };

        tracing::debug!(
            names = headers.len(),
            values = headers.inner.value_count(),
            "Request headers frozen"
        );
        *state = HeaderState::Frozen(Arc::clone(&headers));
        headers
    }

    pub fn is_frozen(&self) -> bool {
        matches!(&*self.state.lock(), HeaderState::Frozen(_))
    }
}

impl Default for HeaderCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeaderCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.lock() {
            HeaderState::Building(builder) => f.debug_tuple("Building").field(builder).finish(),
            HeaderState::Frozen(headers) => f.debug_tuple("Frozen").field(headers).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_without_appends_is_empty() {
        let cell = HeaderCell::new();
        assert!(!cell.is_frozen());

        let headers = cell.freeze();
        assert!(headers.is_empty());
        assert!(cell.is_frozen());
    }

    #[test]
    fn test_values_keep_append_order() {
        let cell = HeaderCell::new();
        cell.append("X-Forwarded-For", "10.0.0.1").unwrap();
        cell.append("Accept", "text/html").unwrap();
        cell.append("X-Forwarded-For", "10.0.0.2").unwrap();
        cell.append("X-Forwarded-For", "10.0.0.3").unwrap();

        let headers = cell.freeze();
        assert_eq!(
            headers.get_all("X-Forwarded-For"),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
        assert_eq!(headers.get("X-Forwarded-For"), Some("10.0.0.1"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_append_after_freeze_fails() {
        let cell = HeaderCell::new();
        cell.append("Accept", "text/html").unwrap();
        let _ = cell.freeze();

        for (name, value) in [("Accept", "text/plain"), ("X-New", ""), ("Host", "a:1")] {
            let err = cell.append(name, value).unwrap_err();
            assert!(matches!(err, Error::HeadersFrozen { .. }));
            assert!(err.is_usage_error());
        }

        // The snapshot is untouched by failed appends
        assert_eq!(cell.freeze().get_all("Accept"), vec!["text/html"]);
    }

    #[test]
    fn test_freeze_returns_same_snapshot() {
        let cell = HeaderCell::new();
        cell.append("Accept", "*/*").unwrap();

        let first = cell.freeze();
        let second = cell.freeze();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_absent_header_is_none() {
        let headers = HeaderCell::new().freeze();
        assert_eq!(headers.get("Authorization"), None);
        assert!(headers.get_all("Authorization").is_empty());
        assert!(!headers.contains("Authorization"));
    }

    #[test]
    fn test_names_stored_as_given() {
        let mut builder = HeaderBuilder::new();
        builder.append("Host", "a.example");
        builder.append("host", "b.example");
        let headers = builder.build();

        assert_eq!(headers.names().collect::<Vec<_>>(), vec!["Host", "host"]);
        assert_eq!(headers.get_all("HOST"), vec!["a.example", "b.example"]);
    }

    #[test]
    fn test_common_accessors() {
        let headers: Headers = [
            ("Content-Type", "multipart/form-data; boundary=xyz"),
            ("Content-Length", "100"),
            ("Host", "example.com"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            headers.content_type(),
            Some("multipart/form-data; boundary=xyz")
        );
        assert_eq!(headers.content_length(), Some(100));
        assert_eq!(headers.host(), Some("example.com"));
        assert!(headers.is_multipart());
    }

    #[test]
    fn test_is_multipart_classification() {
        let form: Headers = [("content-type", "Multipart/Mixed")].into_iter().collect();
        assert!(form.is_multipart());

        let json: Headers = [("Content-Type", "application/json")].into_iter().collect();
        assert!(!json.is_multipart());

        assert!(!Headers::empty().is_multipart());
    }

    #[test]
    fn test_concurrent_appends_and_freeze() {
        let cell = Arc::new(HeaderCell::new());

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|j| cell.append("X-Seq", &format!("{}-{}", i, j)).is_ok())
                        .count()
                })
            })
            .collect();

        let snapshot = cell.freeze();
        let accepted: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();

        // Every accepted append is visible, every rejected one is not
        assert_eq!(snapshot.get_all("X-Seq").len(), accepted);
        assert!(Arc::ptr_eq(&snapshot, &cell.freeze()));
    }
}
