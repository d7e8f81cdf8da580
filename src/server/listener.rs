use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::connection::{Connection, ConnectionLimits, RequestCallback};
use crate::server::port::PortSpec;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Engine settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub bind_host: String,
    pub worker_threads: usize,
    pub handler_threads: usize,
    pub shutdown_grace: Duration,
    pub limits: ConnectionLimits,
}

impl From<&Config> for EngineOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            bind_host: cfg.server.bind_host.clone(),
            worker_threads: cfg.server.worker_threads.max(1),
            handler_threads: cfg.server.handler_threads.max(1),
            shutdown_grace: cfg.shutdown_grace(),
            limits: ConnectionLimits {
                max_request_bytes: cfg.limits.max_request_bytes,
                max_headers: cfg.limits.max_headers,
                read_timeout: cfg.read_timeout(),
            },
        }
    }
}

/// One running listener: the bound socket, its accept loop and the runtime
/// both live here. Dropping the context stops it.
pub struct EngineContext {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    /// Fires once the listening socket is closed.
    stopped: mpsc::Receiver<()>,
    /// Fires once every accepted connection has finished.
    drained: Option<mpsc::Receiver<()>>,
    runtime: Option<Runtime>,
    grace: Duration,
    drain_timeout: Duration,
}

/// Binds `spec` and starts accepting connections, calling `callback` for
/// every parsed request.
///
/// The bind happens before this returns, so an unusable port is reported
/// here and not from the accept loop.
pub fn start(spec: &PortSpec, options: &EngineOptions, callback: RequestCallback) -> Result<EngineContext> {
    if spec.tls {
        return Err(Error::TlsUnsupported(spec.to_string()));
    }

    let host = spec.host.as_deref().unwrap_or(&options.bind_host);
    let bind_error = |source| Error::Bind {
        addr: format!("{}:{}", host, spec.port),
        source,
    };

    let std_listener = std::net::TcpListener::bind((host, spec.port)).map_err(bind_error)?;
    std_listener.set_nonblocking(true).map_err(bind_error)?;
    let local_addr = std_listener.local_addr().map_err(bind_error)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.worker_threads)
        .max_blocking_threads(options.handler_threads)
        .thread_name("weblet-engine")
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    let listener = {
        let _guard = runtime.enter();
        TcpListener::from_std(std_listener)
    };
    let listener = match listener {
        Ok(listener) => listener,
        Err(e) => {
            runtime.shutdown_background();
            return Err(bind_error(e));
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (stopped_tx, stopped_rx) = mpsc::channel();
    let (drained_tx, drained_rx) = mpsc::channel();

    runtime.spawn(accept_loop(
        listener,
        options.limits.clone(),
        callback,
        shutdown_rx,
        stopped_tx,
        drained_tx,
    ));

    info!("Listening on {}", local_addr);

    Ok(EngineContext {
        local_addr,
        shutdown: Some(shutdown_tx),
        stopped: stopped_rx,
        drained: Some(drained_rx),
        runtime: Some(runtime),
        grace: options.shutdown_grace,
        drain_timeout: options.limits.read_timeout + options.shutdown_grace,
    })
}

async fn accept_loop(
    listener: TcpListener,
    limits: ConnectionLimits,
    callback: RequestCallback,
    mut shutdown: oneshot::Receiver<()>,
    stopped: mpsc::Sender<()>,
    drained: mpsc::Sender<()>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!("Accepted connection from {}", peer);

                    let limits = limits.clone();
                    let callback = callback.clone();
                    connections.spawn(async move {
                        let conn = Connection::new(socket, peer, limits);
                        if let Err(e) = conn.run(callback).await {
                            tracing::error!("Connection error from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    // release the port before reporting back
    drop(listener);
    let _ = stopped.send(());

    if !connections.is_empty() {
        debug!(open = connections.len(), "Draining connections");
    }
    while connections.join_next().await.is_some() {}
    let _ = drained.send(());
}

impl EngineContext {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting and releases the port. Connections already accepted
    /// are served to completion; the runtime is only torn down once they
    /// have drained (or after the drain timeout) on a background thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if self.stopped.recv_timeout(self.grace).is_err() {
            warn!(addr = %self.local_addr, "Listener did not stop within grace period");
        }
        info!("Stopped listening on {}", self.local_addr);

        let addr = self.local_addr;
        let drained = self.drained.take();
        let drain_timeout = self.drain_timeout;

        let reaper = std::thread::Builder::new()
            .name("weblet-drain".to_string())
            .spawn(move || {
                if let Some(drained) = drained {
                    if drained.recv_timeout(drain_timeout).is_err() {
                        warn!(addr = %addr, "Connections still open after drain timeout");
                    }
                }
                runtime.shutdown_background();
                debug!(addr = %addr, "Engine runtime shut down");
            });

        if let Err(e) = reaper {
            warn!(error = %e, "Could not spawn drain thread");
        }
    }
}

impl Drop for EngineContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
