use std::net::SocketAddr;

use weblet::http::request::{Method, RawRequest, RequestBuilder, RequestView};

fn sample() -> RawRequest {
    let peer: SocketAddr = "192.168.1.20:51000".parse().unwrap();

    RequestBuilder::new()
        .method(Method::POST)
        .url("/submit")
        .query_string("a=1&b=2")
        .header("Host", "example.com")
        .header("Content-Type", "application/json")
        .header("Accept", "*/*")
        .body(b"{}".to_vec())
        .remote_addr(peer)
        .build()
        .unwrap()
}

#[test]
fn test_request_view_scalar_fields() {
    let raw = sample();
    let req = RequestView::new(&raw);

    assert_eq!(req.method(), "POST");
    assert_eq!(req.http_version(), "1.1");
    assert_eq!(req.url(), "/submit");
    assert_eq!(req.query_string(), "a=1&b=2");
    assert_eq!(req.remote_ip(), "192.168.1.20");
    assert_eq!(req.remote_port(), 51000);
    assert!(!req.is_ssl());
    assert_eq!(req.status_code(), 0);
    assert_eq!(req.body(), b"{}");
}

#[test]
fn test_request_view_absent_fields_are_empty() {
    let raw = RequestBuilder::new()
        .method(Method::GET)
        .url("/")
        .build()
        .unwrap();
    let req = RequestView::new(&raw);

    assert_eq!(req.query_string(), "");
    assert_eq!(req.remote_user(), "");
    assert_eq!(req.remote_ip(), "");
    assert_eq!(req.remote_port(), 0);
    assert_eq!(req.headers(), 0);
}

#[test]
fn test_request_view_engine_fields_pass_through() {
    let raw = RequestBuilder::new()
        .method(Method::GET)
        .url("/")
        .http_version("1.0")
        .remote_user("alice")
        .ssl(true)
        .status_code(302)
        .build()
        .unwrap();
    let req = RequestView::new(&raw);

    assert_eq!(req.http_version(), "1.0");
    assert_eq!(req.remote_user(), "alice");
    assert!(req.is_ssl());
    assert_eq!(req.status_code(), 302);
}

#[test]
fn test_request_view_indexed_headers_keep_wire_order() {
    let raw = sample();
    let req = RequestView::new(&raw);

    assert_eq!(req.headers(), 3);
    assert_eq!(req.header_name(0), "Host");
    assert_eq!(req.header_value(0), "example.com");
    assert_eq!(req.header_name(2), "Accept");
    assert_eq!(req.header_value(2), "*/*");

    let pairs: Vec<_> = req.header_pairs().collect();
    assert_eq!(pairs[1], ("Content-Type", "application/json"));
}

#[test]
fn test_request_view_header_pairs_follow_indexed_access() {
    let raw = sample();
    let req = RequestView::new(&raw);

    let pairs: Vec<_> = req.header_pairs().collect();
    assert_eq!(pairs.len(), req.headers());
    for (i, (name, value)) in pairs.into_iter().enumerate() {
        assert_eq!(name, req.header_name(i));
        assert_eq!(value, req.header_value(i));
    }

    let empty = RequestBuilder::new().method(Method::GET).url("/").build().unwrap();
    assert_eq!(RequestView::new(&empty).header_pairs().count(), 0);
}

#[test]
fn test_request_view_out_of_range_header_index_is_empty() {
    let raw = sample();
    let req = RequestView::new(&raw);

    assert_eq!(req.header_name(3), "");
    assert_eq!(req.header_value(3), "");
    assert_eq!(req.header_name(usize::MAX), "");
    assert_eq!(req.header_value(usize::MAX), "");
}

#[test]
fn test_request_header_lookup_ignores_case() {
    let raw = sample();
    let req = RequestView::new(&raw);

    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_duplicate_headers_are_kept() {
    let raw = RequestBuilder::new()
        .method(Method::GET)
        .url("/")
        .header("Accept", "text/html")
        .header("Accept", "text/plain")
        .build()
        .unwrap();
    let req = RequestView::new(&raw);

    assert_eq!(req.headers(), 2);
    assert_eq!(req.header_value(1), "text/plain");
    // lookup returns the first
    assert_eq!(req.header("Accept"), Some("text/html"));
}

#[test]
fn test_request_builder_requires_method_and_url() {
    assert_eq!(RequestBuilder::new().url("/").build().unwrap_err(), "method missing");
    assert_eq!(
        RequestBuilder::new().method(Method::GET).build().unwrap_err(),
        "url missing"
    );
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_request_method_as_str() {
    for name in ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"] {
        assert_eq!(Method::from_str(name).unwrap().as_str(), name);
    }
}
