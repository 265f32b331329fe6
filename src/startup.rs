//! Application startup and server initialization.
//!
//! This module builds the metrics registry, the shared state and the router,
//! then drives the accept loop. Each connection is served on its own task
//! and tracked by the connection metrics.

use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tower::Service;
use tracing::{debug, error, info, warn};

use crate::config::ConfigV1;
use crate::error::StartupError;
use crate::metrics::{ConnectionTracker, Metrics};
use crate::routes;
use crate::state::AppState;
use crate::utils::log_throttle::LogThrottle;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);
const CONNECTION_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Routes the scrape endpoint may not be mounted on.
const RESERVED_PATHS: [&str; 2] = ["/", "/health"];

/// Builds the shared state and router for `config`.
///
/// # Errors
///
/// Returns an error if the metrics path is unusable or the metrics registry
/// cannot be created.
pub fn build_app(config: Arc<ConfigV1>) -> Result<(Router, Metrics), StartupError> {
    let metrics_path = &config.metrics.path;
    if !metrics_path.starts_with('/') || RESERVED_PATHS.contains(&metrics_path.as_str()) {
        return Err(StartupError::MetricsPath(metrics_path.clone()));
    }

    let metrics = Metrics::new(config.metrics.max_endpoint_series)?;
    let state = AppState {
        config,
        metrics: metrics.clone(),
    };
    Ok((routes::create_router(state), metrics))
}

/// Initializes and runs the application server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the metrics registry cannot be created or the
/// server fails to bind to the configured address.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), StartupError> {
    let (app, metrics) = build_app(config.clone())?;

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!(
        bind_address = %config.bind_address,
        metrics_path = %config.metrics.path,
        "Starting server"
    );

    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    serve(listener, app, metrics, shutdown_signal(), drain_timeout).await
}

/// Accepts connections on `listener` until `shutdown` resolves, then asks
/// every open connection to finish its in-flight requests and waits up to
/// `drain_timeout` for them to close.
///
/// Connections speak HTTP/1.1 or HTTP/2 (prior knowledge). Accept and
/// connection errors are logged and never end the loop.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    metrics: Metrics,
    shutdown: F,
    drain_timeout: Duration,
) -> Result<(), StartupError>
where
    F: Future<Output = ()>,
{
    let throttle = Arc::new(LogThrottle::new(CONNECTION_ERROR_LOG_INTERVAL));
    // Dropping `signal_tx` tells connections to drain; each connection task
    // holds a `close_rx` clone until it ends.
    let (signal_tx, signal_rx) = watch::channel(());
    let (close_tx, close_rx) = watch::channel(());
    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
        };

        tokio::spawn(serve_connection(
            stream,
            remote_addr,
            app.clone(),
            metrics.clone(),
            throttle.clone(),
            signal_rx.clone(),
            close_rx.clone(),
        ));
    }

    drop(listener);
    drop(signal_rx);
    drop(close_rx);
    drop(signal_tx);

    let open = close_tx.receiver_count();
    if open > 0 {
        info!(open, "Waiting for open connections to finish");
    }
    if tokio::time::timeout(drain_timeout, close_tx.closed())
        .await
        .is_err()
    {
        warn!(
            remaining = close_tx.receiver_count(),
            "Drain timeout elapsed, dropping remaining connections"
        );
    }

    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    app: Router,
    metrics: Metrics,
    throttle: Arc<LogThrottle>,
    mut signal_rx: watch::Receiver<()>,
    _close_rx: watch::Receiver<()>,
) {
    let _tracker = ConnectionTracker::open(metrics);
    debug!(%remote_addr, "Connection opened");

    let service = service_fn(move |request: Request<Incoming>| app.clone().call(request));
    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut draining = false;
    let result = loop {
        tokio::select! {
            result = connection.as_mut() => break result,
            _ = signal_rx.changed(), if !draining => {
                debug!(%remote_addr, "Draining connection");
                draining = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    };

    if let Err(e) = result {
        let kind = connection_error_kind(e.as_ref());
        if let Some(suppressed) = throttle.should_emit(kind) {
            debug!(error = %e, %remote_addr, kind, suppressed, "Connection ended with error");
        }
    }
    debug!(%remote_addr, "Connection closed");
}

fn connection_error_kind(e: &(dyn StdError + Send + Sync + 'static)) -> &'static str {
    let Some(e) = e.downcast_ref::<hyper::Error>() else {
        return "io";
    };
    if e.is_timeout() {
        "timeout"
    } else if e.is_incomplete_message() {
        "incomplete_message"
    } else if e.is_parse() {
        "parse"
    } else if e.is_canceled() {
        "canceled"
    } else {
        "other"
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Unable to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
