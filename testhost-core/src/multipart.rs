//! Multipart part descriptors and the shared read cursor.
//!
//! Parts are supplied pre-built by the test; nothing here parses a
//! multipart body.

use crate::headers::{HeaderBuilder, Headers, names};
use bytes::Bytes;
use parking_lot::Mutex;

/// One section of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum PartData {
    /// A plain form field
    Form(FormItem),
    /// An uploaded file
    File(FileItem),
}

impl PartData {
    /// Field name from the part's disposition.
    pub fn name(&self) -> Option<&str> {
        match self {
            PartData::Form(item) => item.name.as_deref(),
            PartData::File(item) => item.name.as_deref(),
        }
    }

    /// The part's own headers.
    pub fn headers(&self) -> &Headers {
        match self {
            PartData::Form(item) => &item.headers,
            PartData::File(item) => &item.headers,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, PartData::File(_))
    }

    pub fn as_form(&self) -> Option<&FormItem> {
        match self {
            PartData::Form(item) => Some(item),
            PartData::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileItem> {
        match self {
            PartData::File(item) => Some(item),
            PartData::Form(_) => None,
        }
    }
}

impl From<FormItem> for PartData {
    fn from(item: FormItem) -> Self {
        PartData::Form(item)
    }
}

impl From<FileItem> for PartData {
    fn from(item: FileItem) -> Self {
        PartData::File(item)
    }
}

/// Multipart form field
#[derive(Debug, Clone, PartialEq)]
pub struct FormItem {
    /// Field name
    pub name: Option<String>,

    /// Field value
    pub value: String,

    /// Part headers
    pub headers: Headers,
}

impl FormItem {
    /// Create a form field with a matching `Content-Disposition` header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let mut headers = HeaderBuilder::new();
        headers.append(
            names::CONTENT_DISPOSITION,
            format!("form-data; name=\"{}\"", name),
        );

        Self {
            name: Some(name),
            value: value.into(),
            headers: headers.build(),
        }
    }

    /// Create a field with explicit headers.
    pub fn with_headers(name: Option<String>, value: impl Into<String>, headers: Headers) -> Self {
        Self {
            name,
            value: value.into(),
            headers,
        }
    }
}

/// Uploaded file data
#[derive(Debug, Clone, PartialEq)]
pub struct FileItem {
    /// Field name
    pub name: Option<String>,

    /// Original filename
    pub file_name: Option<String>,

    /// Content type (MIME type)
    pub content_type: String,

    /// File data
    pub data: Bytes,

    /// Part headers
    pub headers: Headers,
}

impl FileItem {
    /// Create a file part with `Content-Disposition` and `Content-Type` headers.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let name = name.into();
        let file_name = file_name.into();
        let content_type = content_type.into();

        let mut headers = HeaderBuilder::new();
        headers.append(
            names::CONTENT_DISPOSITION,
            format!("form-data; name=\"{}\"; filename=\"{}\"", name, file_name),
        );
        headers.append(names::CONTENT_TYPE, content_type.clone());

        Self {
            name: Some(name),
            file_name: Some(file_name),
            content_type,
            data: data.into(),
            headers: headers.build(),
        }
    }

    /// File size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get file extension
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()?
            .rsplit_once('.')
            .map(|(_, ext)| ext)
    }

    /// Check if file is an image
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Check if file size exceeds limit
    pub fn exceeds_size(&self, max_bytes: usize) -> bool {
        self.size() > max_bytes
    }
}

/// Position of the incremental reader in a request's part list.
///
/// The cursor only moves forward: once it passes the last part every read
/// reports exhaustion.
#[derive(Debug, Default)]
pub struct PartCursor {
    next: Mutex<usize>,
}

impl PartCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the part under the cursor and advance past it.
    pub fn advance(&self, parts: &[PartData]) -> Option<PartData> {
        let mut next = self.next.lock();
        match parts.get(*next) {
            Some(part) => {
                *next += 1;
                tracing::trace!(index = *next - 1, total = parts.len(), "Multipart part read");
                Some(part.clone())
            }
            None => {
                tracing::trace!(total = parts.len(), "Multipart parts exhausted");
                None
            }
        }
    }

    /// Number of parts handed out so far.
    pub fn position(&self) -> usize {
        *self.next.lock()
    }

    /// Start over, for when the part list itself is replaced.
    pub fn reset(&mut self) {
        *self.next.get_mut() = 0;
    }
}
