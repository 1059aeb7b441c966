//! Content access for a request double.
//!
//! [`TestIncomingContent`] exposes the body in one of two modes. The raw
//! mode gives the stored bytes (re-readable) and a single-pass stream. The
//! multipart mode gives the pre-built parts, either all at once through
//! [`TestMultiPartData::parts`] or one at a time through
//! [`TestMultiPartData::read_part`].
//!
//! The multipart mode checks the request's classification on every call, so
//! a request that is not multipart fails every multipart read with
//! [`Error::NotMultipart`], not just the first.

use crate::body::{ByteStream, bytes_stream};
use crate::headers::Headers;
use crate::multipart::PartData;
use crate::traits::{IncomingContent, MultiPartData};
use crate::{Error, Result, TestRequest};
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::io::Cursor;
use std::sync::Arc;

/// Body of a [`TestRequest`] together with its frozen headers.
pub struct TestIncomingContent<'a> {
    request: &'a TestRequest,
    headers: Arc<Headers>,
}

impl<'a> TestIncomingContent<'a> {
    pub(crate) fn new(request: &'a TestRequest) -> Self {
        Self {
            headers: request.headers(),
            request,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Stored body bytes. `None` when the request body is a stream.
    pub fn bytes(&self) -> Option<&'a Bytes> {
        if self.request.has_body_stream() {
            None
        } else {
            Some(self.request.body_bytes())
        }
    }

    /// A fresh reader over the stored body bytes.
    pub fn reader(&self) -> Option<Cursor<Bytes>> {
        self.bytes().cloned().map(Cursor::new)
    }

    /// Single-pass stream of the body.
    ///
    /// Wraps the request's stream source when one was set; otherwise yields
    /// the stored bytes.
    pub fn into_stream(self) -> ByteStream {
        if self.request.has_body_stream() {
            self.request.take_body_stream()
        } else {
            bytes_stream(self.request.body_bytes().clone())
        }
    }

    /// Decode the stored body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.bytes().ok_or_else(streaming_body_error)?;
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Decode the stored body as URL-encoded form data.
    pub fn form<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.bytes().ok_or_else(streaming_body_error)?;
        serde_urlencoded::from_bytes(bytes)
            .map_err(|e| Error::Deserialization(format!("Failed to parse form data: {}", e)))
    }

    /// Multipart view over the request's parts.
    pub fn multipart(&self) -> TestMultiPartData<'a> {
        TestMultiPartData {
            request: self.request,
        }
    }

    /// Whether this content would be read as multipart.
    pub fn is_multipart(&self) -> bool {
        self.request.is_multipart()
    }
}

fn streaming_body_error() -> Error {
    Error::Deserialization("request body is a stream; read it with into_stream".to_string())
}

impl IncomingContent for TestIncomingContent<'_> {
    fn headers(&self) -> &Headers {
        TestIncomingContent::headers(self)
    }

    fn bytes(&self) -> Option<&Bytes> {
        TestIncomingContent::bytes(self)
    }

    fn into_stream(self: Box<Self>) -> ByteStream {
        TestIncomingContent::into_stream(*self)
    }

    fn multipart(&self) -> Box<dyn MultiPartData + '_> {
        Box::new(TestIncomingContent::multipart(self))
    }
}

/// Multipart view of a [`TestRequest`].
///
/// All views of one request share the request's read cursor.
#[derive(Debug, Clone, Copy)]
pub struct TestMultiPartData<'a> {
    request: &'a TestRequest,
}

impl<'a> TestMultiPartData<'a> {
    fn ensure_multipart(&self) -> Result<()> {
        if self.request.is_multipart() {
            Ok(())
        } else {
            Err(Error::NotMultipart)
        }
    }

    /// Every part, in order.
    pub fn parts(&self) -> Result<&'a [PartData]> {
        self.ensure_multipart()?;
        Ok(self.request.multipart_parts())
    }

    /// The next unread part, or `None` once all parts have been read.
    pub async fn read_part(&self) -> Result<Option<PartData>> {
        self.ensure_multipart()?;
        Ok(self.request.next_part())
    }
}

#[async_trait]
impl<'a> MultiPartData for TestMultiPartData<'a> {
    fn parts(&self) -> Result<&[PartData]> {
        TestMultiPartData::parts(self)
    }

    async fn read_part(&self) -> Result<Option<PartData>> {
        TestMultiPartData::read_part(self).await
    }
}
