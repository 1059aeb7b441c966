//! Query string parsing and the per-request parameter cache.

use crate::values::StringValues;
use once_cell::sync::OnceCell;
use std::fmt;

/// Parsed query parameters: name -> values in order of appearance.
///
/// Names are matched exactly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    inner: StringValues,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name)
    }

    /// All values for `name`.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.inner.get_all(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// The raw query component of `uri`: everything after the first `?`.
pub fn query_string(uri: &str) -> &str {
    uri.split_once('?').map(|(_, query)| query).unwrap_or("")
}

/// Parse an `application/x-www-form-urlencoded` query string.
///
/// `+` decodes to a space and percent escapes are decoded (invalid UTF-8
/// is replaced). A segment without `=` yields an empty value; empty
/// segments are skipped.
pub fn parse_query_string(query: &str) -> Parameters {
    let mut inner = StringValues::new();

    for segment in query.split('&').filter(|s| !s.is_empty()) {
        let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
        inner.append(decode_component(name), decode_component(value));
    }

    Parameters { inner }
}

/// Percent-decode a form component, treating `+` as a space.
pub(crate) fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Parses a URI's query on first access and keeps the result.
///
/// Later changes to the URI do not invalidate the cache.
#[derive(Default)]
pub struct QueryCache {
    cell: OnceCell<Parameters>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for `uri`, parsing only if nothing is cached yet.
    pub fn get_or_parse(&self, uri: &str) -> &Parameters {
        self.cell.get_or_init(|| {
            let parameters = parse_query_string(query_string(uri));
            tracing::trace!(
                uri = %uri,
                parameters = parameters.len(),
                "Query parameters cached"
            );
            parameters
        })
    }

    pub fn is_populated(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("parameters", &self.cell.get())
            .finish()
    }
}
