//! Ordered name -> values storage shared by headers and query parameters.
//!
//! Entries keep the order in which their names were first seen, and values
//! keep the order in which they were appended. Storage is a `SmallVec`, the
//! same trade-off the framework makes for header maps: requests rarely carry
//! more than a handful of names, so a linear scan over inline storage beats
//! hashing.

use smallvec::SmallVec;
use std::fmt;

/// Number of names stored inline before spilling to the heap.
pub const INLINE_ENTRIES: usize = 8;

#[derive(Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    values: SmallVec<[String; 1]>,
}

/// Multimap from names to ordered value lists.
///
/// Appends always match names exactly, so `Host` and `host` become two
/// entries. Lookups match exactly or ASCII case-insensitively depending on
/// how the map was created.
#[derive(Clone, PartialEq, Eq)]
pub struct StringValues {
    case_insensitive: bool,
    entries: SmallVec<[Entry; INLINE_ENTRIES]>,
}

impl StringValues {
    /// Create an empty map with exact-match lookups.
    pub const fn new() -> Self {
        Self {
            case_insensitive: false,
            entries: SmallVec::new_const(),
        }
    }

    /// Create an empty map with case-insensitive lookups.
    pub const fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            entries: SmallVec::new_const(),
        }
    }

    /// Whether lookups ignore ASCII case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    #[inline]
    fn matches(&self, stored: &str, name: &str) -> bool {
        if self.case_insensitive {
            stored.eq_ignore_ascii_case(name)
        } else {
            stored == name
        }
    }

    /// Append a value under `name`, creating the entry if needed.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.values.push(value);
            return;
        }

        let mut values = SmallVec::new();
        values.push(value);
        self.entries.push(Entry { name, values });
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| self.matches(&e.name, name))
            .flat_map(|e| e.values.iter())
            .map(String::as_str)
            .next()
    }

    /// Every value stored under `name`, across matching entries.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| self.matches(&e.name, name))
            .flat_map(|e| e.values.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| self.matches(&e.name, name))
    }

    /// Names in first-append order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// `(name, values)` pairs in first-append order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of values across all names.
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }
}

impl Default for StringValues {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.name, &e.values)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut values = StringValues::new();
        values.append("b", "1");
        values.append("a", "2");
        values.append("b", "3");

        assert_eq!(values.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(values.get_all("b"), vec!["1", "3"]);
        assert_eq!(values.len(), 2);
        assert_eq!(values.value_count(), 3);
    }

    #[test]
    fn test_exact_lookup() {
        let mut values = StringValues::new();
        values.append("Key", "v");

        assert_eq!(values.get("Key"), Some("v"));
        assert_eq!(values.get("key"), None);
        assert!(!values.contains("KEY"));
    }

    #[test]
    fn test_case_insensitive_lookup_spans_entries() {
        let mut values = StringValues::case_insensitive();
        values.append("Accept", "text/html");
        values.append("accept", "application/json");

        // Stored as given
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("ACCEPT"), Some("text/html"));
        assert_eq!(
            values.get_all("accept"),
            vec!["text/html", "application/json"]
        );
    }

    #[test]
    fn test_absent_name() {
        let values = StringValues::new();
        assert_eq!(values.get("missing"), None);
        assert!(values.get_all("missing").is_empty());
        assert!(values.is_empty());
    }
}
