//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler
//! function. Supports HTTP/1.1 persistent connections (keep-alive) and
//! graceful shutdown: on cancellation the accept loop stops, idle
//! connections are released, and in-flight requests get a bounded drain
//! window to finish.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::http::{
    Response, StatusCode,
    request::{Request, RequestError},
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The diagnostic HTTP server.
///
/// Binds a TCP listener and dispatches incoming HTTP/1.1 requests to a
/// handler function, which receives the parsed request together with the
/// peer address.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use reqtap::server::Server;
/// use reqtap::http::{Response, StatusCode};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind(":2000").await?;
///     let shutdown = CancellationToken::new();
///     server
///         .run_until(
///             |_req, _peer| async { Response::new(StatusCode::OK).body("ok") },
///             shutdown,
///             Duration::from_secs(5),
///         )
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// A bare `:PORT` address binds every IPv4 interface, i.e. `0.0.0.0:PORT`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let normalized = if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_owned()
        };
        let listener = TcpListener::bind(&normalized)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections and dispatches requests to `handler` until
    /// `shutdown` is cancelled.
    ///
    /// Each accepted connection runs in its own Tokio task; the handler is
    /// shared across tasks behind an [`Arc`]. On cancellation the listener
    /// closes immediately and in-flight connections are given up to `drain`
    /// to finish their current request; connections idle between keep-alive
    /// requests are released right away. Exceeding the drain window is a
    /// normal outcome, logged and not escalated.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run_until<H, F>(
        self,
        handler: H,
        shutdown: CancellationToken,
        drain: Duration,
    ) -> Result<(), ServerError>
    where
        H: Fn(Request, SocketAddr) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let tracker = TaskTracker::new();

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);
            let connection_shutdown = shutdown.clone();

            tracker.spawn(async move {
                if let Err(e) =
                    handle_connection(stream, peer_addr, handler, connection_shutdown).await
                {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }

        // Stop accepting before draining.
        drop(self.listener);
        tracker.close();

        info!("shutting down, draining in-flight connections");
        if tokio::time::timeout(drain, tracker.wait()).await.is_err() {
            warn!(
                remaining = tracker.len(),
                "drain window elapsed before all connections finished"
            );
        }

        Ok(())
    }
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, reading one
/// request per iteration, until the peer closes the connection, signals
/// `Connection: close`, or shutdown is requested while the connection sits
/// idle. A request whose headers are already being processed always gets its
/// response written before the shutdown check applies.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error>
where
    H: Fn(Request, SocketAddr) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        let bytes_read = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(peer = %peer_addr, "releasing idle connection on shutdown");
                break;
            }
            read = stream.read_buf(&mut buf) => read?,
        };

        if bytes_read == 0 {
            debug!(peer = %peer_addr, "connection closed by peer");
            break;
        }

        // Guard against excessively large requests.
        if buf.len() > MAX_REQUEST_SIZE {
            warn!(peer = %peer_addr, "request too large — sending 413");
            let response = Response::new(StatusCode::PAYLOAD_TOO_LARGE)
                .body("Request entity too large")
                .keep_alive(false);
            stream.write_all(&response.into_bytes()).await?;
            break;
        }

        // Attempt to parse the buffered data as an HTTP request.
        let (request, body_offset) = match Request::parse(&buf) {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                // Headers not yet fully received — read more data.
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                let response = Response::new(StatusCode::BAD_REQUEST)
                    .body(format!("Bad Request: {e}"))
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        // Wait for the full body to arrive if Content-Length is set.
        let content_length = request.content_length().unwrap_or(0);
        let total_needed = body_offset + content_length;
        if buf.len() < total_needed {
            continue;
        }

        // Reparse now that the complete body is buffered, so the request
        // carries all of it rather than the prefix that happened to arrive
        // with the headers.
        let (request, _) = match Request::parse(&buf[..total_needed]) {
            Ok(pair) => pair,
            Err(_) => break, // already parsed once; only a truncation bug gets here
        };

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request, peer_addr).await;
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        // Drop the consumed request bytes from the buffer.
        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}
