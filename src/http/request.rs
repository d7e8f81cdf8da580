use std::net::SocketAddr;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. The engine rejects any
/// other token with `400 Bad Request` before a handler ever sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, typically uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use weblet::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
}

/// A request exactly as the engine parsed it off the wire.
///
/// Owned by the connection for the duration of one request. Handlers never
/// see this type directly; they get a [`RequestView`] borrowing it.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    /// Version without the `HTTP/` prefix, e.g. `"1.1"`.
    pub http_version: String,
    /// Request target up to (not including) the first `?`.
    pub url: String,
    /// Everything after the first `?`, if there was one.
    pub query_string: Option<String>,
    /// Header pairs in wire order, duplicates kept.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub remote_addr: Option<SocketAddr>,
    pub remote_user: Option<String>,
    pub is_ssl: bool,
    /// Engine-reported status; 0 for ordinary inbound requests.
    pub status_code: i32,
}

impl RawRequest {
    /// Retrieves the first header value matching `key`, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Builder for constructing [`RawRequest`] values outside the parser.
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    query_string: Option<String>,
    http_version: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    remote_addr: Option<SocketAddr>,
    remote_user: Option<String>,
    is_ssl: bool,
    status_code: i32,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            url: None,
            query_string: None,
            http_version: None,
            headers: Vec::new(),
            body: Vec::new(),
            remote_addr: None,
            remote_user: None,
            is_ssl: false,
            status_code: 0,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    pub fn http_version(mut self, version: impl Into<String>) -> Self {
        self.http_version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn remote_user(mut self, user: impl Into<String>) -> Self {
        self.remote_user = Some(user.into());
        self
    }

    pub fn ssl(mut self, is_ssl: bool) -> Self {
        self.is_ssl = is_ssl;
        self
    }

    pub fn status_code(mut self, code: i32) -> Self {
        self.status_code = code;
        self
    }

    pub fn build(self) -> Result<RawRequest, &'static str> {
        Ok(RawRequest {
            method: self.method.ok_or("method missing")?,
            url: self.url.ok_or("url missing")?,
            http_version: self.http_version.unwrap_or_else(|| "1.1".to_string()),
            query_string: self.query_string,
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
            remote_user: self.remote_user,
            is_ssl: self.is_ssl,
            status_code: self.status_code,
        })
    }
}

/// Read-only view of one inbound request, handed to the request handler.
///
/// Every accessor is a pure projection of the engine's parsed request.
/// String accessors return `""` when the field is absent.
///
/// Indexed header access is lenient: [`header_name`](Self::header_name) and
/// [`header_value`](Self::header_value) return `""` for any index outside
/// `0..headers()` rather than panicking.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    raw: &'a RawRequest,
}

impl<'a> RequestView<'a> {
    pub fn new(raw: &'a RawRequest) -> Self {
        Self { raw }
    }

    /// Request method, e.g. `"GET"`.
    pub fn method(&self) -> &'a str {
        self.raw.method.as_str()
    }

    /// Protocol version as reported by the engine, e.g. `"1.1"`.
    pub fn http_version(&self) -> &'a str {
        &self.raw.http_version
    }

    /// Status field passed through from the engine. Only meaningful for
    /// proxy-style requests; 0 otherwise.
    pub fn status_code(&self) -> i32 {
        self.raw.status_code
    }

    pub fn is_ssl(&self) -> bool {
        self.raw.is_ssl
    }

    pub fn url(&self) -> &'a str {
        &self.raw.url
    }

    pub fn query_string(&self) -> &'a str {
        self.raw.query_string.as_deref().unwrap_or("")
    }

    pub fn remote_ip(&self) -> String {
        self.raw
            .remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    pub fn remote_port(&self) -> u16 {
        self.raw.remote_addr.map(|addr| addr.port()).unwrap_or(0)
    }

    pub fn remote_user(&self) -> &'a str {
        self.raw.remote_user.as_deref().unwrap_or("")
    }

    /// Number of header pairs.
    pub fn headers(&self) -> usize {
        self.raw.headers.len()
    }

    pub fn header_name(&self, index: usize) -> &'a str {
        self.raw
            .headers
            .get(index)
            .map(|(name, _)| name.as_str())
            .unwrap_or("")
    }

    pub fn header_value(&self, index: usize) -> &'a str {
        self.raw
            .headers
            .get(index)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// First value of header `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.raw.header(name)
    }

    pub fn header_pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        self.raw
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Request entity, as much as Content-Length announced.
    pub fn body(&self) -> &'a [u8] {
        &self.raw.body
    }
}
