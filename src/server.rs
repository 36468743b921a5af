//! HTTP server and graceful shutdown.
//!
//! Three ways to run a [`Router`]:
//!
//! - [`Server::serve`]: until SIGTERM / Ctrl-C. What `main` uses.
//! - [`Server::serve_with_shutdown`]: until a caller-supplied future resolves.
//! - [`Server::start`]: binds now, serves in the background, and hands back a
//!   [`RunningServer`] whose [`stop`](RunningServer::stop) shuts it down.
//!   Tests use this with port 0.
//!
//! On shutdown the server:
//! 1. Stops `listener.accept()`; no new connections are made.
//! 2. Asks every open connection to finish its in-flight request and close.
//! 3. Waits up to the drain timeout for connection tasks, aborts whatever is
//!    still running (a client stalled mid-request, a reader that stopped
//!    reading), and returns.
//!
//! Request bodies are buffered up to a byte cap; anything larger is answered
//! with `413`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, Error};
use crate::method::Method;
use crate::middleware;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{Lookup, Router};

/// Default cap on a buffered request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default time connections get to finish after shutdown starts.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug)]
struct Limits {
    max_body_bytes: usize,
    drain_timeout: Duration,
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    limits: Limits,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when it is run.
    ///
    /// ```rust
    /// use recipes::Server;
    /// let server = Server::bind("127.0.0.1:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|source| Error::InvalidAddr {
            addr: addr.to_owned(),
            source,
        })?;
        Ok(Self {
            addr,
            limits: Limits {
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
                drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            },
        })
    }

    /// Largest request body accepted, in bytes. Bigger bodies get `413`.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.limits.max_body_bytes = limit;
        self
    }

    /// How long shutdown waits for open connections before aborting them.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.limits.drain_timeout = timeout;
        self
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains and returns.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves, then drains and returns.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(self.addr).await?;
        run(listener, router, self.limits, signal).await
    }

    /// Binds immediately and serves in a background task.
    ///
    /// Binding `127.0.0.1:0` picks a free port; read it back with
    /// [`RunningServer::local_addr`].
    pub async fn start(self, router: Router) -> Result<RunningServer, Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(run(listener, router, self.limits, async move {
            // A dropped handle counts as a stop request.
            let _ = stop_rx.await;
        }));

        Ok(RunningServer { local_addr, stop_tx, task })
    }
}

/// Handle to a server started with [`Server::start`].
pub struct RunningServer {
    local_addr: SocketAddr,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<(), Error>>,
}

impl RunningServer {
    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL for clients, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Triggers graceful shutdown and waits until the listening socket is
    /// released.
    pub async fn stop(self) -> Result<(), Error> {
        // The serve loop may already have exited on an error; its result is
        // surfaced by the join below either way.
        let _ = self.stop_tx.send(());
        self.task.await?
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn run<F>(
    listener: TcpListener,
    router: Router,
    limits: Limits,
    signal: F,
) -> Result<(), Error>
where
    F: Future<Output = ()> + Send,
{
    let router = Arc::new(router);
    let addr = listener.local_addr()?;
    info!(addr = %addr, "recipes listening");

    // Flipped once on shutdown; every connection task watches it.
    let (closing_tx, closing_rx) = watch::channel(false);
    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Shutdown is checked first so a stop request wins over queued
            // connections.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown requested, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                let mut closing = closing_rx.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req, limits.max_body_bytes).await }
                    });

                    // Serves whichever of HTTP/1.1 or HTTP/2 the client speaks.
                    let builder = ConnBuilder::new(TokioExecutor::new());
                    let conn = builder.serve_connection(io, svc);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = closing.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.as_mut().await
                        }
                    };
                    if let Err(e) = result {
                        debug!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet stays small.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    let _ = closing_tx.send(true);

    let drain = async { while tasks.join_next().await.is_some() {} };
    if tokio::time::timeout(limits.drain_timeout, drain).await.is_err() {
        warn!(remaining = tasks.len(), "drain timeout elapsed, aborting connections");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }

    info!(addr = %addr, "recipes stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// Every failure becomes a status code here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    max_body_bytes: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = middleware::trace(&method, &path, async {
        route(&router, req, max_body_bytes).await.into_response()
    })
    .await;
    Ok(response.into_inner())
}

async fn route(
    router: &Router,
    req: hyper::Request<Incoming>,
    max_body_bytes: usize,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let method = match Method::try_from(&parts.method) {
        Ok(m) => m,
        Err(()) => return Err(not_routed(router.not_matched(&path), &path)),
    };

    let (handler, params) = match router.lookup(method, &path) {
        Lookup::Found(handler, params) => (handler, params),
        other => return Err(not_routed(other, &path)),
    };

    let body = Limited::new(body, max_body_bytes)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::BodyTooLarge { limit: max_body_bytes }
            } else {
                ApiError::UnreadableBody(e.to_string())
            }
        })?
        .to_bytes();

    Ok(handler.call(Request::new(body, params)).await)
}

fn not_routed(lookup: Lookup, path: &str) -> ApiError {
    match lookup {
        Lookup::MethodNotAllowed(allowed) => ApiError::MethodNotAllowed(allowed),
        Lookup::Found(..) | Lookup::NotFound => ApiError::NotFound(format!("No route for `{path}`")),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C).
///
/// If a handler cannot be installed that arm never resolves, leaving the
/// other one in charge.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[tokio::test]
    async fn start_then_stop_releases_the_port() {
        let running = Server::bind("127.0.0.1:0").unwrap()
            .start(Router::new())
            .await
            .unwrap();
        let addr = running.local_addr();
        assert_ne!(addr.port(), 0);
        running.stop().await.unwrap();

        // The same port can be bound again once stop() returns.
        TcpListener::bind(addr).await.unwrap();
    }

    #[tokio::test]
    async fn stop_aborts_a_connection_stalled_mid_request() {
        use tokio::io::AsyncWriteExt;

        async fn accept(_req: Request) -> Status {
            Status::Ok
        }

        let running = Server::bind("127.0.0.1:0").unwrap()
            .drain_timeout(Duration::from_millis(200))
            .start(Router::new().on(Method::Post, "/recipes", accept))
            .await
            .unwrap();

        // Headers promise 100 bytes; only a few ever arrive.
        let mut client = tokio::net::TcpStream::connect(running.local_addr()).await.unwrap();
        client
            .write_all(
                b"POST /recipes HTTP/1.1\r\nhost: localhost\r\n\
                  content-type: application/json\r\ncontent-length: 100\r\n\r\n{\"na",
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(5), running.stop()).await;
        assert!(matches!(stopped, Ok(Ok(()))), "stop() did not return");
        drop(client);
    }

    #[test]
    fn bind_rejects_garbage() {
        assert!(matches!(Server::bind("localhost"), Err(Error::InvalidAddr { .. })));
    }
}
