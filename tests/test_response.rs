use weblet::http::response::{Response, StatusCode};
use weblet::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    assert_eq!(StatusCode::PAYLOAD_TOO_LARGE.as_u16(), 413);
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
    assert_eq!(u16::from(StatusCode::from(302)), 302);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::from(201).reason_phrase(), "Created");
    assert_eq!(StatusCode::from(204).reason_phrase(), "No Content");
    assert_eq!(StatusCode::from(301).reason_phrase(), "Moved Permanently");
    assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::from(405).reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(
        StatusCode::HEADERS_TOO_LARGE.reason_phrase(),
        "Request Header Fields Too Large"
    );
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_status_code_unknown_reason_is_empty() {
    assert_eq!(StatusCode::from(299).reason_phrase(), "");
    assert_eq!(StatusCode::from(0).reason_phrase(), "");
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, b"404 Not Found".to_vec());
    assert_eq!(response.headers.get("Content-Length").unwrap(), "13");
    assert_eq!(response.headers.get("Content-Type").unwrap(), "text/plain");
}

#[test]
fn test_response_plain_serializes_completely() {
    let bytes = serialize_response(&Response::plain(StatusCode::BAD_REQUEST));

    assert_eq!(
        bytes,
        b"HTTP/1.1 400 Bad Request\r\n\
          Connection: close\r\n\
          Content-Length: 15\r\n\
          Content-Type: text/plain\r\n\
          \r\n\
          400 Bad Request"
            .to_vec()
    );
}
