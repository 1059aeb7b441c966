// testhost - In-memory HTTP request doubles
//
// Build a request in a test, hand it to application code that only knows the
// request traits, and observe exactly what a real server would have given it.

// Re-export core functionality
pub use testhost_core::*;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ApplicationRequest,
        ByteStream,
        Error,
        FileItem,
        FormItem,
        Headers,
        HttpMethod,
        IncomingContent,
        MultiPartData,
        Parameters,
        PartData,
        RequestConfig,
        RequestConnectionPoint,
        Result,
        TestRequest,
        TestRequestBuilder,
    };

    pub use crate::body::{BodyChannel, read_to_bytes};
}
