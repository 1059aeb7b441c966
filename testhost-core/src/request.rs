//! The request double.
//!
//! [`TestRequest`] owns everything a simulated request carries and composes
//! the derived views over it:
//!
//! - headers, frozen on first read ([`crate::headers`])
//! - the connection point, recomputed on each access ([`crate::connection`])
//! - query parameters, parsed once ([`crate::query`])
//! - the body, as bytes, stream or multipart parts ([`crate::content`])
//!
//! ```
//! use testhost_core::{HttpMethod, TestRequest};
//!
//! let mut request = TestRequest::new();
//! request.set_method(HttpMethod::POST);
//! request.set_uri("/search?q=cats&q=dogs");
//! request.append_header("Host", "example.com:8443").unwrap();
//!
//! assert_eq!(request.query_parameters().get_all("q"), vec!["cats", "dogs"]);
//! assert_eq!(request.local().port().unwrap(), 8443);
//!
//! // Headers are frozen now
//! assert!(request.append_header("Accept", "*/*").is_err());
//! ```

use crate::body::{ByteStream, bytes_stream, empty_stream, into_byte_stream};
use crate::builder::TestRequestBuilder;
use crate::config::RequestConfig;
use crate::connection::TestConnectionPoint;
use crate::content::TestIncomingContent;
use crate::cookies::RequestCookies;
use crate::headers::{HeaderBuilder, HeaderCell, Headers};
use crate::multipart::{PartCursor, PartData};
use crate::query::{Parameters, QueryCache, query_string};
use crate::traits::{ApplicationRequest, IncomingContent, RequestConnectionPoint};
use crate::{Error, HttpMethod, Result};
use bytes::Bytes;
use futures_util::Stream;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// In-memory stand-in for an incoming HTTP request.
pub struct TestRequest {
    method: HttpMethod,
    uri: String,
    version: String,
    scheme: String,

    headers: HeaderCell,
    query: QueryCache,

    body: Bytes,
    body_stream: Mutex<Option<ByteStream>>,
    streaming: bool,

    parts: Vec<PartData>,
    part_cursor: PartCursor,
    multipart_override: Option<bool>,
}

impl TestRequest {
    /// A `GET /` request over `HTTP/1.1` with scheme `http`.
    pub fn new() -> Self {
        Self::from_config(&RequestConfig::default())
    }

    /// A request initialised from configured defaults.
    pub fn from_config(config: &RequestConfig) -> Self {
        Self::from_parts(config, HeaderBuilder::new())
    }

    pub(crate) fn from_parts(config: &RequestConfig, headers: HeaderBuilder) -> Self {
        Self {
            method: config.method,
            uri: config.uri.clone(),
            version: config.version.clone(),
            scheme: config.scheme.clone(),
            headers: HeaderCell::from_builder(headers),
            query: QueryCache::new(),
            body: Bytes::new(),
            body_stream: Mutex::new(None),
            streaming: false,
            parts: Vec::new(),
            part_cursor: PartCursor::new(),
            multipart_override: None,
        }
    }

    /// Start a fluent builder.
    pub fn builder() -> TestRequestBuilder {
        TestRequestBuilder::new()
    }

    // ========================================================================
    // Request line
    // ========================================================================

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Change the request target.
    ///
    /// Query parameters already read keep their cached value.
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = scheme.into();
    }

    // ========================================================================
    // Headers
    // ========================================================================

    /// Append a header value.
    ///
    /// Fails with [`Error::HeadersFrozen`] once anything has read the
    /// headers.
    pub fn append_header(&self, name: &str, value: &str) -> Result<()> {
        self.headers.append(name, value)
    }

    /// The header set. The first call freezes it.
    pub fn headers(&self) -> Arc<Headers> {
        self.headers.freeze()
    }

    pub fn headers_frozen(&self) -> bool {
        self.headers.is_frozen()
    }

    /// Cookies from the `Cookie` header. Freezes the headers.
    pub fn cookies(&self) -> RequestCookies {
        RequestCookies::from_headers(&self.headers())
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Local end of the simulated connection.
    pub fn local(&self) -> TestConnectionPoint<'_> {
        TestConnectionPoint::new(self)
    }

    /// Raw query component of the current URI.
    pub fn query_string(&self) -> &str {
        query_string(&self.uri)
    }

    /// Query parameters, parsed from the URI on first call and cached.
    pub fn query_parameters(&self) -> &Parameters {
        self.query.get_or_parse(&self.uri)
    }

    // ========================================================================
    // Body
    // ========================================================================

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Body bytes as text; invalid UTF-8 is replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn set_body_text(&mut self, text: impl Into<String>) {
        self.body = Bytes::from(text.into());
    }

    /// Supply the body as a stream. It takes precedence over the stored
    /// bytes for every stream read.
    pub fn set_body_stream<S, B, E>(&mut self, source: S)
    where
        S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
        B: Into<Bytes>,
        E: Into<Error>,
    {
        self.set_byte_stream(into_byte_stream(source));
    }

    pub(crate) fn set_byte_stream(&mut self, stream: ByteStream) {
        *self.body_stream.get_mut() = Some(stream);
        self.streaming = true;
    }

    /// Whether a stream source was supplied.
    pub fn has_body_stream(&self) -> bool {
        self.streaming
    }

    /// Hand out the stream source. A source that was already taken reads
    /// as an exhausted stream.
    pub(crate) fn take_body_stream(&self) -> ByteStream {
        match self.body_stream.lock().take() {
            Some(stream) => {
                tracing::trace!("Request body stream taken");
                stream
            }
            None => {
                tracing::debug!("Request body stream already consumed");
                empty_stream()
            }
        }
    }

    /// The body as a single-pass stream: the stream source if one was set,
    /// otherwise the stored bytes.
    pub fn receive_channel(&self) -> ByteStream {
        if self.streaming {
            self.take_body_stream()
        } else {
            bytes_stream(self.body.clone())
        }
    }

    /// Decode the stored body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Decode the stored body as URL-encoded form data.
    pub fn form<T: DeserializeOwned>(&self) -> Result<T> {
        serde_urlencoded::from_bytes(&self.body)
            .map_err(|e| Error::Deserialization(format!("Failed to parse form data: {}", e)))
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// The body with its headers. Freezes the headers.
    pub fn receive_content(&self) -> TestIncomingContent<'_> {
        TestIncomingContent::new(self)
    }

    /// Parts as supplied, without any classification check.
    pub fn multipart_parts(&self) -> &[PartData] {
        &self.parts
    }

    /// Replace the part list. The read cursor starts over.
    pub fn set_multipart_parts(&mut self, parts: Vec<PartData>) {
        self.parts = parts;
        self.part_cursor.reset();
    }

    pub fn push_part(&mut self, part: impl Into<PartData>) {
        self.parts.push(part.into());
    }

    /// Force the multipart classification. `None` derives it from the
    /// `Content-Type` header.
    pub fn set_multipart(&mut self, multipart: Option<bool>) {
        self.multipart_override = multipart;
    }

    /// Whether the body is read as multipart.
    ///
    /// Without an explicit classification this reads the `Content-Type`
    /// header, which freezes the headers.
    pub fn is_multipart(&self) -> bool {
        match self.multipart_override {
            Some(multipart) => multipart,
            None => self.headers().is_multipart(),
        }
    }

    pub(crate) fn next_part(&self) -> Option<PartData> {
        self.part_cursor.advance(&self.parts)
    }
}

impl Default for TestRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("scheme", &self.scheme)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("streaming", &self.streaming)
            .field("parts", &self.parts.len())
            .finish_non_exhaustive()
    }
}

impl ApplicationRequest for TestRequest {
    fn headers(&self) -> Arc<Headers> {
        TestRequest::headers(self)
    }

    fn local(&self) -> Box<dyn RequestConnectionPoint + '_> {
        Box::new(TestRequest::local(self))
    }

    fn query_parameters(&self) -> &Parameters {
        TestRequest::query_parameters(self)
    }

    fn cookies(&self) -> RequestCookies {
        TestRequest::cookies(self)
    }

    fn receive_content(&self) -> Box<dyn IncomingContent + '_> {
        Box::new(TestRequest::receive_content(self))
    }

    fn receive_channel(&self) -> ByteStream {
        TestRequest::receive_channel(self)
    }
}
