//! HTTP request/response types and the per-connection engine.
//!
//! # Architecture
//!
//! - **`request`**: the engine's parsed [`RawRequest`](request::RawRequest) and the
//!   read-only [`RequestView`](request::RequestView) handed to handlers
//! - **`writer`**: [`ResponseWriter`](writer::ResponseWriter), which sends the head exactly once
//! - **`response`**: status codes and the engine's canned responses
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`connection`**: reads one request, dispatches it, closes
//!
//! # Response Writer State Machine
//!
//! ```text
//!        ┌─────────────┐  set_status_code / set_header / set_headers
//!        │    Open     │ ◀─┐ (mutate pending head)
//!        └──────┬──────┘ ──┘
//!               │ write_headers(..) or first write_body(..)
//!               ▼ head written to the connection
//!        ┌─────────────┐  setters and write_headers are ignored,
//!        │  Committed  │  write_body appends to the body
//!        └─────────────┘
//! ```
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               ├─ malformed / too large → Rejecting → Closed
//!               │ Request parsed
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Handler runs on a blocking thread
//!        └──────┬───────────┘
//!               │ Handler returned
//!               ▼
//!            Closed
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
