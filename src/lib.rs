//! Weblet - embeddable HTTP server
//!
//! Accepts connections on a port, turns each request into a
//! [`RequestView`] and lets a single registered handler answer it through a
//! [`ResponseWriter`].

pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use error::{Error, Result};
pub use http::request::RequestView;
pub use http::writer::ResponseWriter;
pub use server::{RequestHandler, WebServer};
