//! Server lifecycle and request dispatch.
//!
//! - **`webserver`**: [`WebServer`], the listen/close state machine and handler registration
//! - **`handler`**: the [`RequestHandler`] trait and per-request dispatch
//! - **`listener`**: the accept loop and its runtime, one per active listener
//! - **`port`**: parsing of port specifications such as `8080`, `8443s`, `0.0.0.0:80`
//!
//! # Server State Machine
//!
//! ```text
//!        ┌──────────┐  listen_on_port(p) ok   ┌─────────────┐
//!        │  Closed  │ ──────────────────────▶ │  Listening  │ ─┐ listen_on_port(q) ok:
//!        └──────────┘ ◀────────────────────── └─────────────┘ ◀┘ bind q, then release p
//!             ▲ │            close()                 │
//!             └─┘ close(): no-op                     │ listen_on_port(q) fails:
//!                                                    └─ stays on p
//! ```

pub mod handler;
pub mod listener;
pub mod port;
pub mod webserver;

pub use handler::RequestHandler;
pub use webserver::WebServer;
