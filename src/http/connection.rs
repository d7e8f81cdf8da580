use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::http::parser::{ParseError, declared_length, parse_http_request};
use crate::http::request::RawRequest;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::serialize_response;

/// Per-connection entry point the engine calls once a request is parsed.
///
/// Runs on a blocking thread and gets the socket as a plain byte sink.
/// Returns whether the request was handled; `false` makes the engine answer
/// with its default `404 Not Found`.
pub type RequestCallback = Arc<dyn Fn(&RawRequest, &mut dyn Write) -> bool + Send + Sync>;

/// Limits applied while reading a request, before anything is dispatched.
#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    pub max_request_bytes: usize,
    pub max_headers: usize,
    pub read_timeout: Duration,
}

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    limits: ConnectionLimits,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Dispatching(RawRequest),
    Rejecting(StatusCode),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, limits: ConnectionLimits) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(4096),
            limits,
            state: ConnectionState::Reading,
        }
    }

    /// Serves exactly one request, then closes.
    pub async fn run(mut self, callback: RequestCallback) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Dispatching(request) => {
                    return self.dispatch(request, callback).await;
                }

                ConnectionState::Rejecting(status) => {
                    tracing::debug!(peer = %self.peer, status = status.as_u16(), "Rejecting request");
                    let bytes = serialize_response(&Response::plain(status));
                    self.stream.write_all(&bytes).await?;
                    self.stream.shutdown().await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer, self.limits.max_headers) {
                Ok((mut request, consumed)) => {
                    let _ = self.buffer.split_to(consumed);
                    request.remote_addr = Some(self.peer);
                    return Ok(ConnectionState::Dispatching(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(ParseError::TooManyHeaders) => {
                    return Ok(ConnectionState::Rejecting(StatusCode::HEADERS_TOO_LARGE));
                }

                Err(e) => {
                    tracing::debug!(peer = %self.peer, error = ?e, "Malformed request");
                    return Ok(ConnectionState::Rejecting(StatusCode::BAD_REQUEST));
                }
            }

            let max = self.limits.max_request_bytes;
            if self.buffer.len() >= max || declared_length(&self.buffer).is_some_and(|n| n > max) {
                return Ok(ConnectionState::Rejecting(StatusCode::PAYLOAD_TOO_LARGE));
            }

            // Read more data
            let n = match timeout(self.limits.read_timeout, self.stream.read_buf(&mut self.buffer)).await {
                Ok(read) => read?,
                Err(_) => {
                    tracing::debug!(peer = %self.peer, "Timed out waiting for request");
                    if self.buffer.is_empty() {
                        return Ok(ConnectionState::Closed);
                    }
                    return Ok(ConnectionState::Rejecting(StatusCode::REQUEST_TIMEOUT));
                }
            };

            if n == 0 {
                // Client closed connection
                return Ok(ConnectionState::Closed);
            }
        }
    }

    /// Hands the request to `callback` on the blocking pool and waits for it.
    async fn dispatch(self, request: RawRequest, callback: RequestCallback) -> anyhow::Result<()> {
        let peer = self.peer;
        let mut stream = self.stream.into_std()?;
        stream.set_nonblocking(false)?;

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let handled = callback(&request, &mut stream);

            if !handled {
                tracing::debug!(peer = %peer, url = %request.url, "Request not handled, sending 404");
                stream.write_all(&serialize_response(&Response::not_found()))?;
            }

            stream.flush()?;
            // Peer may already be gone; nothing left to report.
            let _ = stream.shutdown(std::net::Shutdown::Write);
            Ok(())
        })
        .await??;

        Ok(())
    }
}
