//! Process entry point: flag parsing, environment overrides, startup
//! diagnostics, signal handling, and the run loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use reqtap::config::{Config, Mode, RawOptions, ResponseBody};
use reqtap::journal::Journal;
use reqtap::server::Server;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A diagnostic HTTP server: logs every request, answers with a configured
/// static response or serves files from a directory.
#[derive(Parser, Debug)]
#[command(name = "reqtap", version)]
struct Cli {
    /// Listen address
    #[arg(short = 'a', default_value = ":2000")]
    listen_addr: String,

    /// Response body; `file://<path>` reads the file at response time
    #[arg(short = 'b', default_value = "")]
    response_body: String,

    /// Content type header value
    #[arg(short = 't', default_value = "")]
    content_type: String,

    /// Response status code, 100..999 or 0 for default 200
    #[arg(short = 'c', default_value_t = 0)]
    response_code: i64,

    /// Run as file server with the specified root directory
    #[arg(short = 'f')]
    fs_root: Option<PathBuf>,
}

impl From<Cli> for RawOptions {
    fn from(cli: Cli) -> Self {
        Self {
            listen_addr: cli.listen_addr,
            response_body: cli.response_body,
            content_type: cli.content_type,
            response_code: cli.response_code,
            fs_root: cli.fs_root,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut raw: RawOptions = Cli::parse().into();
    raw.apply_env(std::env::vars())?;
    let config = Config::resolve(raw)?;

    run(config).await?;

    println!("\ndone");
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let journal = Arc::new(Journal::stdout());

    for (name, value) in std::env::vars() {
        journal.line(format_args!("{name}={value}"));
    }
    print_options(&journal, &config);
    journal.line(format_args!(
        "reqtap.{} listen {}",
        env!("CARGO_PKG_VERSION"),
        config.listen_addr
    ));

    let server = Server::bind(&config.listen_addr)
        .await
        .context("error listen address")?;

    if let Mode::FileServer { root } = &config.mode {
        journal.line(format_args!(
            "run as FileServer with path: {}",
            root.display()
        ));
    }

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let mode = Arc::new(config.mode);
    let handler_journal = Arc::clone(&journal);
    server
        .run_until(
            move |request, peer| {
                let journal = Arc::clone(&handler_journal);
                let mode = Arc::clone(&mode);
                async move { reqtap::handle(&mode, &journal, request, peer).await }
            },
            shutdown,
            DRAIN_TIMEOUT,
        )
        .await
        .context("error serve")?;

    Ok(())
}

fn print_options(journal: &Journal, config: &Config) {
    journal.line(format_args!("----- Options -----"));
    journal.line(format_args!("Listen addr:\n{}", config.listen_addr));
    match &config.mode {
        Mode::Fixed(fixed) => {
            let body = match &fixed.body {
                ResponseBody::Empty => String::new(),
                ResponseBody::Literal(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                ResponseBody::File(path) => format!("file://{}", path.display()),
            };
            journal.line(format_args!("Response body:\n{body}"));
            journal.line(format_args!(
                "Response code:\n{}",
                fixed.status.map_or(0, |s| s.as_u16())
            ));
        }
        Mode::FileServer { root } => {
            journal.line(format_args!("File server root:\n{}", root.display()));
        }
    }
    journal.line(format_args!("----------"));
}

/// Cancels the token on SIGINT or SIGTERM.
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        debug!("shutdown signal received");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
