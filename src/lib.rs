//! # reqtap
//!
//! A diagnostic HTTP server for observing requests on a networking path.
//! Every request is printed to a journal (sequence number, timestamp, remote
//! address, method, URI, headers, decoded body) and answered with a
//! configurable static response — or served from a directory in file-server
//! mode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use reqtap::journal::{Journal, RequestRecord};
//! use reqtap::http::{Response, StatusCode};
//! use reqtap::server::Server;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let journal = Arc::new(Journal::stdout());
//!     let server = Server::bind(":2000").await?;
//!     let shutdown = CancellationToken::new();
//!     server
//!         .run_until(
//!             move |req, peer| {
//!                 let journal = Arc::clone(&journal);
//!                 async move {
//!                     journal.record(&RequestRecord {
//!                         remote_addr: peer,
//!                         method: req.method(),
//!                         target: req.target(),
//!                         headers: req.headers(),
//!                         body: Some(req.body().as_ref()),
//!                     });
//!                     Response::new(StatusCode::OK)
//!                 }
//!             },
//!             shutdown,
//!             Duration::from_secs(5),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decode;
pub mod files;
pub mod http;
pub mod journal;
pub mod respond;
pub mod server;

use std::net::SocketAddr;

use journal::RequestRecord;

/// The per-request pipeline: decode the body, journal the request, compose
/// the response for the configured mode.
///
/// This is the function the server loop dispatches every parsed request to.
/// In fixed-response mode a decode failure is journaled and suppresses the
/// configured response; in file-server mode the body is not decoded at all —
/// the journal entry covers the request line and headers, then the file
/// server takes over. Either way the response leaves with permissive CORS
/// headers.
pub async fn handle(
    mode: &Mode,
    journal: &Journal,
    request: Request,
    peer: SocketAddr,
) -> Response {
    match mode {
        Mode::Fixed(fixed) => {
            let outcome = decode::decode(request.body(), request.content_encoding());
            journal.record(&RequestRecord {
                remote_addr: peer,
                method: request.method(),
                target: request.target(),
                headers: request.headers(),
                body: outcome.as_deref().ok(),
            });
            respond::compose(fixed, outcome.as_ref().err(), journal).await
        }
        Mode::FileServer { root } => {
            journal.record(&RequestRecord {
                remote_addr: peer,
                method: request.method(),
                target: request.target(),
                headers: request.headers(),
                body: None,
            });
            let mut response = files::serve(root, request.method(), request.path(), journal).await;
            respond::cors(&mut response);
            response
        }
    }
}

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{Config, ConfigError, Mode, RawOptions};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use journal::Journal;
pub use server::{Server, ServerError};
