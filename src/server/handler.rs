use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use crate::http::connection::RequestCallback;
use crate::http::request::{RawRequest, RequestView};
use crate::http::writer::ResponseWriter;

/// Receives every request accepted by a [`WebServer`](super::WebServer).
///
/// Called synchronously on the connection's thread; the connection is closed
/// once this returns. Implementations should populate the whole response
/// (status, headers, body) before returning and must not block forever.
///
/// Closures with the matching signature implement this trait.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle_request(
        &self,
        request: &RequestView<'_>,
        response: &mut ResponseWriter<'_>,
    ) -> anyhow::Result<()>;
}

impl<F> RequestHandler for F
where
    F: Fn(&RequestView<'_>, &mut ResponseWriter<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handle_request(
        &self,
        request: &RequestView<'_>,
        response: &mut ResponseWriter<'_>,
    ) -> anyhow::Result<()> {
        self(request, response)
    }
}

/// The registered handler, shared between the server and its engine.
#[derive(Clone, Default)]
pub(crate) struct HandlerSlot {
    inner: Arc<RwLock<Option<Arc<dyn RequestHandler>>>>,
}

impl HandlerSlot {
    pub(crate) fn set(&self, handler: Option<Arc<dyn RequestHandler>>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    fn current(&self) -> Option<Arc<dyn RequestHandler>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builds the request view and response writer for one connection and
    /// runs the handler on them.
    ///
    /// Returns `false` when no handler is registered, so the engine can fall
    /// back to its default response.
    pub(crate) fn dispatch(&self, raw: &RawRequest, conn: &mut dyn Write) -> bool {
        let Some(handler) = self.current() else {
            return false;
        };

        let request = RequestView::new(raw);
        let mut response = ResponseWriter::new(conn);

        tracing::debug!(
            method = request.method(),
            url = request.url(),
            peer = %request.remote_ip(),
            "Dispatching request"
        );

        if let Err(e) = handler.handle_request(&request, &mut response) {
            tracing::warn!(
                error = ?e,
                method = request.method(),
                url = request.url(),
                "Request handler failed"
            );
            if !response.headers_sent() {
                response.set_status_code(500);
            }
        }

        // a handler that wrote nothing still owes the client a status line
        if let Err(e) = response.flush_headers() {
            tracing::debug!(error = %e, "Could not send response head");
        }

        true
    }

    pub(crate) fn callback(&self) -> RequestCallback {
        let slot = self.clone();
        Arc::new(move |raw: &RawRequest, conn: &mut dyn Write| slot.dispatch(raw, conn))
    }
}
