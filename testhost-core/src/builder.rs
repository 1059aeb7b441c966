// Fluent construction of request doubles

use crate::body::{ByteStream, into_byte_stream};
use crate::config::RequestConfig;
use crate::headers::{HeaderBuilder, names};
use crate::multipart::PartData;
use crate::{Error, HttpMethod, Result, TestRequest};
use bytes::Bytes;
use futures_util::Stream;
use serde::Serialize;

/// Builder for test requests.
///
/// Headers added here are part of the request before anything can read
/// them, so a built request accepts further appends until its headers are
/// first read.
///
/// ```
/// use testhost_core::{HttpMethod, TestRequest};
///
/// let request = TestRequest::builder()
///     .method(HttpMethod::POST)
///     .uri("/users")
///     .query("page", "2")
///     .header("Host", "api.example.com")
///     .text("hello")
///     .build();
///
/// assert_eq!(request.uri(), "/users?page=2");
/// assert_eq!(request.body_text(), "hello");
/// ```
pub struct TestRequestBuilder {
    config: RequestConfig,
    headers: HeaderBuilder,
    query: Vec<(String, String)>,
    body: Bytes,
    stream: Option<ByteStream>,
    parts: Vec<PartData>,
    multipart: Option<bool>,
}

impl TestRequestBuilder {
    /// Create a new request builder
    pub fn new() -> Self {
        Self::from_config(RequestConfig::default())
    }

    /// Start from configured defaults
    pub fn from_config(config: RequestConfig) -> Self {
        Self {
            config,
            headers: HeaderBuilder::new(),
            query: Vec::new(),
            body: Bytes::new(),
            stream: None,
            parts: Vec::new(),
            multipart: None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = uri.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Add a query parameter, percent-encoded into the URI
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a text body
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Bytes::from(text.into());
        self
    }

    /// Set JSON body
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.body = serde_json::to_vec(data)
            .map_err(|e| Error::Serialization(e.to_string()))?
            .into();
        self.headers.append(names::CONTENT_TYPE, "application/json");
        Ok(self)
    }

    /// Set a URL-encoded form body
    pub fn form<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.body = serde_urlencoded::to_string(data)
            .map_err(|e| Error::Serialization(e.to_string()))?
            .into();
        self.headers
            .append(names::CONTENT_TYPE, "application/x-www-form-urlencoded");
        Ok(self)
    }

    /// Supply the body as a stream
    pub fn stream<S, B, E>(mut self, source: S) -> Self
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: Into<Bytes>,
        E: Into<Error>,
    {
        self.stream = Some(into_byte_stream(source));
        self
    }

    /// Add a multipart part. Does not change the classification.
    pub fn part(mut self, part: impl Into<PartData>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Make the body multipart with the given parts and a
    /// `multipart/form-data` content type.
    pub fn multipart(mut self, parts: impl IntoIterator<Item = PartData>) -> Self {
        self.parts.extend(parts);
        self.headers
            .append(names::CONTENT_TYPE, "multipart/form-data; boundary=testhost");
        self
    }

    /// Force the multipart classification.
    pub fn multipart_override(mut self, multipart: bool) -> Self {
        self.multipart = Some(multipart);
        self
    }

    /// Build the request
    pub fn build(mut self) -> TestRequest {
        if !self.query.is_empty() {
            self.config.uri = append_query(&self.config.uri, &self.query);
        }

        let mut request = TestRequest::from_parts(&self.config, self.headers);
        request.set_body(self.body);
        if let Some(stream) = self.stream {
            request.set_byte_stream(stream);
        }
        request.set_multipart_parts(self.parts);
        request.set_multipart(self.multipart);
        request
    }
}

impl Default for TestRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Join encoded pairs onto `uri`, ahead of any fragment.
fn append_query(uri: &str, pairs: &[(String, String)]) -> String {
    let (base, fragment) = match uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (uri, None),
    };

    let encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();

    let separator = match base.find('?') {
        None => "?",
        Some(at) if at + 1 == base.len() || base.ends_with('&') => "",
        Some(_) => "&",
    };

    let mut out = format!("{}{}{}", base, separator, encoded.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::read_to_bytes;
    use crate::multipart::{FileItem, FormItem};
    use futures_util::stream;
    use serde::Deserialize;

    #[test]
    fn test_builder_request_line() {
        let request = TestRequestBuilder::new()
            .method(HttpMethod::DELETE)
            .uri("/items/7")
            .version("HTTP/2")
            .scheme("https")
            .build();

        let local = request.local();
        assert_eq!(local.method(), HttpMethod::DELETE);
        assert_eq!(local.uri(), "/items/7");
        assert_eq!(local.version(), "HTTP/2");
        assert_eq!(local.scheme(), "https");
    }

    #[test]
    fn test_builder_headers_stay_open() {
        let request = TestRequestBuilder::new()
            .header("Accept", "text/html")
            .build();

        assert!(!request.headers_frozen());
        request.append_header("Accept", "application/json").unwrap();
        assert_eq!(
            request.headers().get_all("accept"),
            vec!["text/html", "application/json"]
        );
    }

    #[test]
    fn test_query_encoding() {
        let request = TestRequestBuilder::new()
            .uri("/search")
            .query("q", "rust lang")
            .query("tag", "a&b")
            .build();

        assert_eq!(request.uri(), "/search?q=rust%20lang&tag=a%26b");
        assert_eq!(request.query_parameters().get("q"), Some("rust lang"));
        assert_eq!(request.query_parameters().get("tag"), Some("a&b"));
    }

    #[test]
    fn test_append_query() {
        let pairs = vec![("x".to_string(), "1".to_string())];
        assert_eq!(append_query("/a", &pairs), "/a?x=1");
        assert_eq!(append_query("/a?", &pairs), "/a?x=1");
        assert_eq!(append_query("/a?y=2", &pairs), "/a?y=2&x=1");
        assert_eq!(append_query("/a?y=2#top", &pairs), "/a?y=2&x=1#top");
    }

    #[test]
    fn test_json_body() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct User {
            name: String,
        }

        let request = TestRequestBuilder::new()
            .json(&User {
                name: "Alice".to_string(),
            })
            .unwrap()
            .build();

        assert_eq!(
            request.headers().content_type(),
            Some("application/json")
        );
        let user: User = request.json().unwrap();
        assert_eq!(user.name, "Alice");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequestBuilder::new()
            .form(&[("name", "Alice"), ("city", "New York")])
            .unwrap()
            .build();

        assert_eq!(request.body_text(), "name=Alice&city=New+York");
        assert_eq!(
            request.headers().content_type(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn test_stream_body() {
        let request = TestRequestBuilder::new()
            .stream(stream::iter(vec![Ok::<_, Error>("a"), Ok("b")]))
            .build();

        assert!(request.has_body_stream());
        let body = read_to_bytes(request.receive_channel()).await.unwrap();
        assert_eq!(&body[..], b"ab");
    }

    #[tokio::test]
    async fn test_multipart_body() {
        let request = TestRequestBuilder::new()
            .method(HttpMethod::POST)
            .multipart(vec![
                FormItem::new("title", "Report").into(),
                FileItem::new("file", "r.pdf", "application/pdf", vec![1u8]).into(),
            ])
            .build();

        assert!(request.is_multipart());
        let content = request.receive_content();
        let multipart = content.multipart();
        assert_eq!(multipart.parts().unwrap().len(), 2);
        assert_eq!(
            multipart.read_part().await.unwrap().unwrap().name(),
            Some("title")
        );
    }

    #[test]
    fn test_parts_without_classification() {
        let request = TestRequestBuilder::new()
            .part(FormItem::new("a", "1"))
            .build();

        assert_eq!(request.multipart_parts().len(), 1);
        assert!(!request.is_multipart());
    }

    #[test]
    fn test_multipart_override() {
        let request = TestRequestBuilder::new()
            .part(FormItem::new("a", "1"))
            .multipart_override(true)
            .build();

        assert!(request.is_multipart());
        assert!(!request.headers_frozen());
    }
}
