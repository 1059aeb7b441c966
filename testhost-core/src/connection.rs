// Connection point view over a request double

use crate::traits::RequestConnectionPoint;
use crate::{Error, HttpMethod, Result, TestRequest};

/// Host reported when the request carries no `Host` header.
pub const DEFAULT_HOST: &str = "localhost";

/// Port reported when the `Host` header carries none.
pub const DEFAULT_PORT: u16 = 80;

/// Peer address of every simulated request.
pub const REMOTE_HOST: &str = "localhost";

/// Host part of a `Host` header value: everything before the first `:`.
pub fn host_from_header(value: Option<&str>) -> &str {
    match value {
        Some(value) => value.split_once(':').map(|(host, _)| host).unwrap_or(value),
        None => DEFAULT_HOST,
    }
}

/// Port part of a `Host` header value: everything after the first `:`.
///
/// A header without `:` means port 80. A port segment that is not a valid
/// `u16` is an error rather than a silent default.
pub fn port_from_header(value: Option<&str>) -> Result<u16> {
    let Some(value) = value else {
        return Ok(DEFAULT_PORT);
    };

    match value.split_once(':') {
        Some((_, port)) => port
            .parse()
            .map_err(|_| Error::InvalidHostPort(value.to_string())),
        None => Ok(DEFAULT_PORT),
    }
}

/// Local end of the simulated connection.
///
/// Borrows the request and derives every field on access, so it always
/// reflects the request's current method, URI, version and scheme. Reading
/// `host` or `port` reads the headers, which freezes them.
#[derive(Debug, Clone, Copy)]
pub struct TestConnectionPoint<'a> {
    request: &'a TestRequest,
}

impl<'a> TestConnectionPoint<'a> {
    pub fn new(request: &'a TestRequest) -> Self {
        Self { request }
    }

    pub fn scheme(&self) -> &'a str {
        self.request.scheme()
    }

    pub fn version(&self) -> &'a str {
        self.request.version()
    }

    pub fn uri(&self) -> &'a str {
        self.request.uri()
    }

    pub fn method(&self) -> HttpMethod {
        self.request.method()
    }

    pub fn host(&self) -> String {
        let headers = self.request.headers();
        host_from_header(headers.host()).to_string()
    }

    pub fn port(&self) -> Result<u16> {
        let headers = self.request.headers();
        port_from_header(headers.host())
    }

    pub fn remote_host(&self) -> &'static str {
        REMOTE_HOST
    }
}

impl RequestConnectionPoint for TestConnectionPoint<'_> {
    fn scheme(&self) -> &str {
        TestConnectionPoint::scheme(self)
    }

    fn version(&self) -> &str {
        TestConnectionPoint::version(self)
    }

    fn uri(&self) -> &str {
        TestConnectionPoint::uri(self)
    }

    fn method(&self) -> HttpMethod {
        TestConnectionPoint::method(self)
    }

    fn host(&self) -> String {
        TestConnectionPoint::host(self)
    }

    fn port(&self) -> Result<u16> {
        TestConnectionPoint::port(self)
    }

    fn remote_host(&self) -> &str {
        TestConnectionPoint::remote_host(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port_from_header() {
        assert_eq!(host_from_header(Some("example.com:8443")), "example.com");
        assert_eq!(port_from_header(Some("example.com:8443")).unwrap(), 8443);

        assert_eq!(host_from_header(Some("example.com")), "example.com");
        assert_eq!(port_from_header(Some("example.com")).unwrap(), 80);

        assert_eq!(host_from_header(None), "localhost");
        assert_eq!(port_from_header(None).unwrap(), 80);
    }

    #[test]
    fn test_invalid_port_is_error() {
        for value in ["example.com:http", "example.com:", "example.com:70000", "a:1:2"] {
            let err = port_from_header(Some(value)).unwrap_err();
            assert!(matches!(err, Error::InvalidHostPort(_)), "{}", value);
            assert!(err.is_usage_error());
        }
    }

    #[test]
    fn test_split_on_first_colon() {
        // IPv6 literals are not special-cased
        assert_eq!(host_from_header(Some("[::1]:8080")), "[");
    }

    #[test]
    fn test_view_tracks_request_fields() {
        let mut request = TestRequest::new();
        request.set_method(HttpMethod::POST);
        request.set_uri("/upload");
        request.set_scheme("https");
        request.set_version("HTTP/2");

        let local = request.local();
        assert_eq!(local.method(), HttpMethod::POST);
        assert_eq!(local.uri(), "/upload");
        assert_eq!(local.scheme(), "https");
        assert_eq!(local.version(), "HTTP/2");
        assert_eq!(local.remote_host(), "localhost");

        request.set_uri("/changed");
        assert_eq!(request.local().uri(), "/changed");
    }

    #[test]
    fn test_view_reads_host_header() {
        let request = TestRequest::new();
        request.append_header("Host", "example.com:8443").unwrap();

        let local = request.local();
        assert_eq!(local.host(), "example.com");
        assert_eq!(local.port().unwrap(), 8443);
        assert!(request.headers_frozen());
    }

    #[test]
    fn test_view_without_host_header() {
        let request = TestRequest::new();
        let local = request.local();
        assert_eq!(local.host(), "localhost");
        assert_eq!(local.port().unwrap(), 80);
    }
}
