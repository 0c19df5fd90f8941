//! The request journal — the diagnostic print stream this server exists for.
//!
//! A [`Journal`] owns the process-wide request counter and the output sink.
//! Each request is rendered as one multi-line block, buffered fully and
//! written under a single lock acquisition so that blocks from concurrent
//! requests never interleave. Sink failures are reported through `tracing`
//! and never surface to the response path.

use std::fmt::Display;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use tracing::warn;

use crate::http::{Headers, Method};

/// Everything the journal prints about one request.
///
/// `body` carries the decoded request body; `None` (or an empty slice)
/// suppresses the body section of the block. The bytes are written verbatim,
/// so binary payloads land in the journal untouched.
pub struct RequestRecord<'a> {
    pub remote_addr: SocketAddr,
    pub method: &'a Method,
    pub target: &'a str,
    pub headers: &'a Headers,
    pub body: Option<&'a [u8]>,
}

/// Shared journal handle: an atomic sequence counter plus a serialized sink.
///
/// Injected into the request pipeline rather than living in a global, so
/// tests can capture output and seed their own counter.
pub struct Journal {
    counter: AtomicU64,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Journal {
    /// Creates a journal writing to standard output.
    pub fn stdout() -> Self {
        Self::with_sink(std::io::stdout())
    }

    /// Creates a journal writing to an arbitrary sink. The sequence counter
    /// starts at zero; the first recorded request is numbered 1.
    pub fn with_sink(sink: impl Write + Send + 'static) -> Self {
        Self {
            counter: AtomicU64::new(0),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Records one request block and returns the sequence number it was
    /// assigned.
    ///
    /// The counter increment is atomic, so concurrently recorded requests
    /// get distinct consecutive numbers; no ordering is promised between a
    /// number and wall-clock arrival order.
    pub fn record(&self, record: &RequestRecord<'_>) -> u64 {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;

        let mut block = Vec::with_capacity(256);
        let _ = writeln!(block, "___________[ {seq} ]___________");
        let _ = writeln!(block, "|  {}", Local::now().format("%Y-%m-%d %H:%M:%S%.9f %z"));
        let _ = writeln!(
            block,
            "|  [{}] {} {}\n|  ",
            record.remote_addr, record.method, record.target
        );

        for name in record.headers.unique_names() {
            let values: Vec<&str> = record.headers.get_all(name).collect();
            let _ = writeln!(block, "|  {name}: {values:?}");
        }

        if let Some(body) = record.body.filter(|b| !b.is_empty()) {
            let _ = writeln!(block);
            let _ = block.write_all(body);
            let _ = writeln!(block);
        }

        self.write_block(&block);
        seq
    }

    /// Prints an `[ERROR]` line for a per-request failure.
    pub fn error(&self, err: &dyn Display) {
        self.line(format_args!("[ERROR] {err}"));
    }

    /// Prints a single line, used for startup records (environment dump,
    /// resolved options, version stamp).
    pub fn line(&self, args: std::fmt::Arguments<'_>) {
        let mut block = Vec::with_capacity(64);
        let _ = writeln!(block, "{args}");
        self.write_block(&block);
    }

    fn write_block(&self, block: &[u8]) {
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = sink.write_all(block).and_then(|()| sink.flush()) {
            warn!(error = %e, "journal sink write failed");
        }
    }
}
