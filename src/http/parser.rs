use crate::http::request::{Method, RawRequest};

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidVersion,
    InvalidHeader,
    InvalidContentLength,
    TooManyHeaders,
    Incomplete,
}

/// Parses one request from the start of `buf`.
///
/// Returns the request together with the number of bytes it occupied.
/// Peer information is left empty; the connection fills it in.
pub fn parse_http_request(
    buf: &[u8],
    max_headers: usize,
) -> Result<(RawRequest, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    if parts.next().is_some() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    let http_version = version
        .strip_prefix("HTTP/")
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::InvalidVersion)?;

    let (url, query_string) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };

    // Headers
    let mut headers = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        if headers.len() == max_headers {
            return Err(ParseError::TooManyHeaders);
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.push((key.to_string(), value.trim().to_string()));
    }

    // Body
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = RawRequest {
        method,
        http_version: http_version.to_string(),
        url: url.to_string(),
        query_string,
        headers,
        body,
        remote_addr: None,
        remote_user: None,
        is_ssl: false,
        status_code: 0,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

/// Total size (head plus declared body) of the request at the start of
/// `buf`, once its head has arrived. Lets oversized bodies be rejected early.
pub fn declared_length(buf: &[u8]) -> Option<usize> {
    let headers_end = find_headers_end(buf)?;
    let head = std::str::from_utf8(&buf[..headers_end]).ok()?;

    let content_length = head
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    Some(headers_end + 4 + content_length)
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req, 64).unwrap();

        assert_eq!(parsed.url, "/");
        assert_eq!(parsed.header("Host"), Some("example.com"));
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn declared_length_counts_head_and_body() {
        let req = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n";
        assert_eq!(declared_length(req), Some(req.len() + 10));
        assert_eq!(declared_length(b"POST / HTTP/1.1\r\n"), None);
    }
}
