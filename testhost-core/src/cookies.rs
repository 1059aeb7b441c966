// Request cookies, read from the Cookie header

use crate::headers::{Headers, names};
use crate::query::decode_component;

/// Cookies sent with a request.
///
/// This is a thin view over the `Cookie` header values; there is no jar,
/// expiry or domain handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    cookies: Vec<(String, String)>,
}

impl RequestCookies {
    /// Parse every `Cookie` header value in `headers`.
    ///
    /// Pairs are separated by `;`. Names starting with `$` are attributes
    /// of the legacy cookie syntax and are skipped. Quoted values are
    /// unquoted and values are percent-decoded.
    pub fn from_headers(headers: &Headers) -> Self {
        let cookies = headers
            .get_all(names::COOKIE)
            .into_iter()
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| {
                let pair = pair.trim();
                if pair.is_empty() {
                    return None;
                }
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = name.trim();
                if name.starts_with('$') {
                    return None;
                }
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((name.to_string(), decode_component(value)))
            })
            .collect();

        Self { cookies }
    }

    /// Value of the first cookie called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let headers: Headers = [("Cookie", "session=abc123; theme=dark")]
            .into_iter()
            .collect();
        let cookies = RequestCookies::from_headers(&headers);

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn test_multiple_headers_and_decoding() {
        let headers: Headers = [
            ("Cookie", "name=\"John%20Doe\""),
            ("cookie", "$Version=1; lang=en; ;flag"),
        ]
        .into_iter()
        .collect();
        let cookies = RequestCookies::from_headers(&headers);

        assert_eq!(cookies.get("name"), Some("John Doe"));
        assert_eq!(cookies.get("lang"), Some("en"));
        assert_eq!(cookies.get("flag"), Some(""));
        assert_eq!(cookies.get("$Version"), None);
        assert_eq!(
            cookies.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["name", "lang", "flag"]
        );
    }

    #[test]
    fn test_no_cookie_header() {
        let cookies = RequestCookies::from_headers(&Headers::empty());
        assert!(cookies.is_empty());
    }
}
