// Core library for testhost
// In-memory request doubles for driving server application logic in tests

pub mod body;
pub mod builder;
pub mod config;
pub mod connection;
pub mod content;
pub mod cookies;
pub mod error;
pub mod headers;
pub mod logging;
pub mod method;
pub mod multipart;
pub mod query;
pub mod request;
pub mod traits;
pub mod values;

// Re-export commonly used types
pub use body::{BodyChannel, BodyChannelSender, ByteStream};
pub use builder::TestRequestBuilder;
pub use config::RequestConfig;
pub use connection::TestConnectionPoint;
pub use content::{TestIncomingContent, TestMultiPartData};
pub use cookies::RequestCookies;
pub use error::*;
pub use headers::{HeaderBuilder, Headers};
pub use method::HttpMethod;
pub use multipart::{FileItem, FormItem, PartData};
pub use query::Parameters;
pub use request::TestRequest;
pub use traits::*;
pub use values::StringValues;
