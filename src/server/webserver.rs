use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::request::RequestView;
use crate::http::writer::ResponseWriter;
use crate::server::handler::{HandlerSlot, RequestHandler};
use crate::server::listener::{self, EngineContext, EngineOptions};
use crate::server::port::PortSpec;

/// Embeddable HTTP server.
///
/// Owns at most one listener at a time. Every accepted request is handed to
/// the registered [`RequestHandler`] together with a [`ResponseWriter`] for
/// its connection.
///
/// `listen_on_port` and `close` are serialized internally and may be called
/// from any thread, including from inside a handler.
///
/// ```no_run
/// use weblet::config::Config;
/// use weblet::server::WebServer;
///
/// let server = WebServer::new(&Config::default());
/// server.on_request(|request, response| {
///     response.set_header("Content-Type", "text/plain");
///     response.write_body(format!("you asked for {}\n", request.url()))?;
///     Ok(())
/// });
///
/// assert!(server.listen_on_port("8080"));
/// // ...
/// server.close();
/// assert_eq!(server.port(), "");
/// ```
pub struct WebServer {
    options: EngineOptions,
    handler: HandlerSlot,
    state: Mutex<ServerState>,
}

#[derive(Default)]
struct ServerState {
    /// Empty while closed.
    port: String,
    spec: Option<PortSpec>,
    context: Option<EngineContext>,
}

impl WebServer {
    pub fn new(config: &Config) -> Self {
        Self {
            options: EngineOptions::from(config),
            handler: HandlerSlot::default(),
            state: Mutex::new(ServerState::default()),
        }
    }

    /// Registers `f` as the request handler, replacing any previous one.
    pub fn on_request<F>(&self, f: F)
    where
        F: Fn(&RequestView<'_>, &mut ResponseWriter<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.set_handler(f);
    }

    pub fn set_handler<H: RequestHandler>(&self, handler: H) {
        self.handler.set(Some(Arc::new(handler)));
    }

    /// Removes the handler; requests are then answered by the engine's
    /// default `404 Not Found`.
    pub fn clear_handler(&self) {
        self.handler.set(None);
    }

    /// Starts listening on `port`.
    ///
    /// Returns `false` if the port is invalid or cannot be bound; in that
    /// case any listener already running is left untouched. On success a
    /// previous listener on another port is released, so at most one is
    /// ever active. Asking for the port already being listened on is a
    /// successful no-op.
    ///
    /// A different spec that resolves onto the socket already held (`"P"`
    /// after `"127.0.0.1:P"`, or a wildcard host on the same port) releases
    /// the old listener before binding; if that bind then fails the server
    /// ends up closed.
    pub fn listen_on_port(&self, port: &str) -> bool {
        let spec = match PortSpec::parse(port) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(port, error = %e, "Cannot listen");
                return false;
            }
        };

        let mut state = self.lock_state();

        if state.context.is_some() && !spec.is_ephemeral() && state.spec.as_ref() == Some(&spec) {
            debug!(port = %state.port, "Already listening");
            return true;
        }

        // The new address would collide with the socket we already hold, so
        // the old listener has to go first.
        let collides = state
            .context
            .as_ref()
            .is_some_and(|context| spec.overlaps(&self.options.bind_host, context.local_addr()));
        if collides {
            if let Some(previous) = state.context.take() {
                debug!(port = %state.port, "Releasing listener on the same socket");
                previous.stop();
            }
            state.port.clear();
            state.spec = None;
        }

        match listener::start(&spec, &self.options, self.handler.callback()) {
            Ok(context) => {
                let local_addr = context.local_addr();

                if let Some(previous) = state.context.replace(context) {
                    debug!(port = %state.port, "Releasing previous listener");
                    previous.stop();
                }

                state.port = spec.bound_display(local_addr);
                state.spec = Some(PortSpec {
                    port: local_addr.port(),
                    ..spec
                });
                info!(port = %state.port, "Server listening");
                true
            }
            Err(e) => {
                warn!(port, error = %e, "Failed to listen");
                false
            }
        }
    }

    /// The port being listened on, or an empty string when closed.
    pub fn port(&self) -> String {
        self.lock_state().port.clone()
    }

    /// Stops listening. Harmless when already closed.
    pub fn close(&self) {
        let mut state = self.lock_state();

        let Some(context) = state.context.take() else {
            return;
        };

        info!(port = %state.port, "Closing server");
        context.stop();
        state.port.clear();
        state.spec = None;
    }

    pub fn is_listening(&self) -> bool {
        self.lock_state().context.is_some()
    }

    /// Address actually bound, while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_state()
            .context
            .as_ref()
            .map(EngineContext::local_addr)
    }

    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        self.close();
    }
}
