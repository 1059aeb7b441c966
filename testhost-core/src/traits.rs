// The request contract seen by application code
//
// Handlers written against these traits cannot tell a request double from a
// production request.

use crate::body::ByteStream;
use crate::cookies::RequestCookies;
use crate::headers::Headers;
use crate::multipart::PartData;
use crate::query::Parameters;
use crate::{HttpMethod, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Local end of the connection a request arrived on.
///
/// `host` and `port` read the request headers, which freezes them.
pub trait RequestConnectionPoint {
    fn scheme(&self) -> &str;

    fn version(&self) -> &str;

    fn uri(&self) -> &str;

    fn method(&self) -> HttpMethod;

    /// `Host` header up to the first `:`, or `localhost`. Freezes the headers.
    fn host(&self) -> String;

    /// Port from the `Host` header, or 80. Freezes the headers.
    fn port(&self) -> Result<u16>;

    fn remote_host(&self) -> &str;
}

/// Multipart view of a request body.
#[async_trait]
pub trait MultiPartData: Send + Sync {
    /// Every part, in order.
    fn parts(&self) -> Result<&[PartData]>;

    /// The next unread part, or `None` once all parts have been read.
    async fn read_part(&self) -> Result<Option<PartData>>;
}

/// Body of a request, as raw bytes or as multipart data.
pub trait IncomingContent: Send {
    fn headers(&self) -> &Headers;

    /// Re-readable body bytes, unless the body is a stream.
    fn bytes(&self) -> Option<&Bytes>;

    /// Single-pass body stream.
    fn into_stream(self: Box<Self>) -> ByteStream;

    fn multipart(&self) -> Box<dyn MultiPartData + '_>;
}

/// An incoming HTTP request.
pub trait ApplicationRequest: Send + Sync {
    fn headers(&self) -> Arc<Headers>;

    fn local(&self) -> Box<dyn RequestConnectionPoint + '_>;

    fn query_parameters(&self) -> &Parameters;

    fn cookies(&self) -> RequestCookies;

    fn receive_content(&self) -> Box<dyn IncomingContent + '_>;

    fn receive_channel(&self) -> ByteStream;
}
