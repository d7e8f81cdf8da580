use std::collections::BTreeMap;
use std::io::Write;

use crate::error::Result;
use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";
const DEFAULT_STATUS: u16 = 200;

/// Serializes a status line and header block, blank line included.
pub fn serialize_head(status: u16, headers: &BTreeMap<String, String>) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status,
        StatusCode::from(status).reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = serialize_head(resp.status.as_u16(), &resp.headers);
    buf.extend_from_slice(&resp.body);
    buf
}

/// Single-use writer for one response on one connection.
///
/// Starts open: status (default 200) and headers can be changed freely.
/// The first [`write_headers`](Self::write_headers) or
/// [`write_body`](Self::write_body) commits them. From then on the head is
/// frozen, setters are ignored and the header block is never written again.
///
/// ```
/// use weblet::http::writer::ResponseWriter;
///
/// let mut wire = Vec::new();
/// let mut response = ResponseWriter::new(&mut wire);
/// response.set_status_code(404);
/// response.set_header("Content-Type", "text/plain");
/// response.write_body("not found").unwrap();
///
/// assert_eq!(
///     wire,
///     b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nnot found"
/// );
/// ```
pub struct ResponseWriter<'c> {
    conn: &'c mut dyn Write,
    status_code: u16,
    headers: BTreeMap<String, String>,
    headers_sent: bool,
}

impl<'c> ResponseWriter<'c> {
    pub fn new(conn: &'c mut dyn Write) -> Self {
        Self {
            conn,
            status_code: DEFAULT_STATUS,
            headers: BTreeMap::new(),
            headers_sent: false,
        }
    }

    /// Currently set status code, 200 by default.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, code: u16) {
        if self.ignore_after_commit("set_status_code") {
            return;
        }
        self.status_code = code;
    }

    /// Value of header `name` (exact match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Sets header `name` to `value`. A name or value containing CR/LF (or a
    /// name containing `:`) is dropped, since it would split the head.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.ignore_after_commit("set_header") {
            return;
        }
        let (name, value) = (name.into(), value.into());
        if is_valid_header(&name, &value) {
            self.headers.insert(name, value);
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Replaces every pending header.
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.ignore_after_commit("set_headers") {
            return;
        }
        self.headers = collect_headers(headers);
    }

    /// Whether the header block has been committed to the connection.
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Sends the status line and `headers`, replacing whatever was pending.
    ///
    /// Does nothing once the head has been committed. The head counts as
    /// committed as soon as the write is attempted, even if it fails.
    pub fn write_headers<I, K, V>(&mut self, status_code: u16, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.headers_sent {
            tracing::debug!(status = status_code, "headers already sent; write_headers ignored");
            return Ok(());
        }

        self.status_code = status_code;
        self.headers = collect_headers(headers);
        self.commit()
    }

    /// Sends `data` as (part of) the body, committing the pending head first
    /// if that has not happened yet.
    pub fn write_body(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        if !self.headers_sent {
            self.commit()?;
        }

        self.conn.write_all(data.as_ref())?;
        Ok(())
    }

    /// Commits the pending status and headers. No-op once committed.
    pub fn flush_headers(&mut self) -> Result<()> {
        if self.headers_sent {
            return Ok(());
        }
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        self.headers_sent = true;

        let head = serialize_head(self.status_code, &self.headers);
        self.conn.write_all(&head)?;

        tracing::trace!(status = self.status_code, headers = self.headers.len(), "response head sent");
        Ok(())
    }

    fn ignore_after_commit(&self, op: &'static str) -> bool {
        if self.headers_sent {
            tracing::debug!(op, "headers already sent; change ignored");
        }
        self.headers_sent
    }
}

fn collect_headers<I, K, V>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    headers
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, v)| is_valid_header(k, v))
        .collect()
}

/// A header line must stay one line: no CR/LF anywhere, and a non-empty
/// name without `:`. Anything else is dropped before it can reach the wire.
fn is_valid_header(name: &str, value: &str) -> bool {
    let breaks_line = |s: &str| s.contains(['\r', '\n']);
    let valid = !name.is_empty() && !name.contains(':') && !breaks_line(name) && !breaks_line(value);

    if !valid {
        tracing::warn!(name = ?name, value = ?value, "Dropping header that would break response framing");
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts nothing; every write fails as if the peer hung up.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn head_is_committed_even_when_write_fails() {
        let mut conn = BrokenPipe;
        let mut resp = ResponseWriter::new(&mut conn);

        let err = resp.write_headers(201, [("X-A", "1")]);
        assert!(matches!(err, Err(crate::Error::Transport(_))));
        assert!(resp.headers_sent());

        resp.set_status_code(500);
        assert_eq!(resp.status_code(), 201);
    }

    #[test]
    fn body_write_failure_is_reported() {
        let mut conn = BrokenPipe;
        let mut resp = ResponseWriter::new(&mut conn);

        assert!(resp.write_body("x").is_err());
        assert!(resp.headers_sent());
        // head is not retried
        assert!(resp.flush_headers().is_ok());
    }

    #[test]
    fn serialize_head_sorts_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("b".to_string(), "2".to_string());
        headers.insert("a".to_string(), "1".to_string());

        let head = serialize_head(204, &headers);
        assert_eq!(head, b"HTTP/1.1 204 No Content\r\na: 1\r\nb: 2\r\n\r\n");
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let head = serialize_head(799, &BTreeMap::new());
        assert_eq!(head, b"HTTP/1.1 799 \r\n\r\n");
    }
}
