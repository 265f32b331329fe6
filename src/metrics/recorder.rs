//! Metrics recording implementation using Prometheus.

use prometheus::proto::MetricFamily;
use prometheus::{
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use super::cardinality::{SeriesLimit, OVERFLOW_LABEL};
use super::MEDIUM_TAG;

/// Meter that owns the application's custom instruments.
pub const CUSTOM_METER_NAME: &str = "MyApp.Custom";
pub const CUSTOM_METER_VERSION: &str = "1.0.0";

/// Instrument name of the custom request counter. Prometheus names cannot
/// contain dots, so the series is exposed as `myapp_custom_request_count_total`
/// and the instrument name is kept in its HELP line.
pub const REQUEST_COUNT_INSTRUMENT: &str = "myapp.custom.request_count";

/// Bucket boundaries (seconds) of `http_server_request_duration_seconds`.
pub const REQUEST_DURATION_BUCKETS: [f64; 15] = [
    0.0, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Trait for recording application metrics.
///
/// Every method is fire-and-forget: recording never reports failure back to
/// the request path.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Counts one request against the given endpoint path.
    fn register_request(&self, path: &str);

    /// Records the duration of a completed HTTP request.
    ///
    /// `medium` is the `mkt_medium` tag, when one was attached.
    fn record_request_duration(
        &self,
        method: &str,
        route: &str,
        status: u16,
        medium: Option<&str>,
        duration_secs: f64,
    );

    /// Marks a request as in flight.
    fn request_started(&self);

    /// Marks an in-flight request as finished.
    fn request_finished(&self);

    /// Records an accepted connection.
    fn connection_opened(&self);

    /// Records a closed connection and how long it lived.
    fn connection_closed(&self, duration_secs: f64);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // MyApp.Custom meter
    request_count: IntCounterVec,
    endpoint_series: Arc<SeriesLimit>,

    // HTTP server request metrics
    request_duration_seconds: HistogramVec,
    active_requests: IntGauge,

    // HTTP server connection metrics
    active_connections: IntGauge,
    connections_total: IntCounter,
    connection_duration_seconds: Histogram,
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    ///
    /// At most `max_endpoint_series` distinct paths get their own request
    /// counter series; later paths share the overflow series.
    ///
    /// # Errors
    ///
    /// Returns the registry error if a metric has an invalid name or is
    /// registered twice.
    pub fn new(max_endpoint_series: usize) -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        // MyApp.Custom meter
        let request_count = register_int_counter_vec_with_registry!(
            Opts::new(
                "myapp_custom_request_count_total",
                format!("Requests handled per endpoint ({REQUEST_COUNT_INSTRUMENT})"),
            )
            .const_label("otel_scope_name", CUSTOM_METER_NAME)
            .const_label("otel_scope_version", CUSTOM_METER_VERSION),
            &["endpoint", OVERFLOW_LABEL],
            registry.clone()
        )?;
        let endpoint_series = Arc::new(SeriesLimit::new(
            "myapp_custom_request_count_total",
            max_endpoint_series,
        ));

        // HTTP server request metrics
        let request_duration_seconds = register_histogram_vec_with_registry!(
            "http_server_request_duration_seconds",
            "Duration of HTTP server requests in seconds",
            &[
                "http_request_method",
                "http_route",
                "http_response_status_code",
                MEDIUM_TAG
            ],
            REQUEST_DURATION_BUCKETS.to_vec(),
            registry.clone()
        )?;

        let active_requests = register_int_gauge_with_registry!(
            Opts::new(
                "http_server_active_requests",
                "Number of HTTP server requests currently in flight"
            ),
            registry.clone()
        )?;

        // HTTP server connection metrics
        let active_connections = register_int_gauge_with_registry!(
            Opts::new(
                "http_server_active_connections",
                "Number of connections currently open"
            ),
            registry.clone()
        )?;

        let connections_total = register_int_counter_with_registry!(
            Opts::new(
                "http_server_connections_total",
                "Total number of accepted connections"
            ),
            registry.clone()
        )?;

        let connection_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "http_server_connection_duration_seconds",
                "Lifetime of closed connections in seconds"
            ),
            registry.clone()
        )?;

        Ok(Metrics {
            registry,
            request_count,
            endpoint_series,
            request_duration_seconds,
            active_requests,
            active_connections,
            connections_total,
            connection_duration_seconds,
        })
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }

    /// Collects the raw metric families of the registry.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current number of open connections.
    pub fn active_connections(&self) -> i64 {
        self.active_connections.get()
    }
}

impl MetricsRecorder for Metrics {
    fn register_request(&self, path: &str) {
        if self.endpoint_series.admit(path) {
            self.request_count.with_label_values(&[path, ""]).inc();
        } else {
            self.request_count.with_label_values(&["", "true"]).inc();
        }
    }

    fn record_request_duration(
        &self,
        method: &str,
        route: &str,
        status: u16,
        medium: Option<&str>,
        duration_secs: f64,
    ) {
        let status = status.to_string();
        self.request_duration_seconds
            .with_label_values(&[method, route, &status, medium.unwrap_or("")])
            .observe(duration_secs);
    }

    fn request_started(&self) {
        self.active_requests.inc();
    }

    fn request_finished(&self) {
        self.active_requests.dec();
    }

    fn connection_opened(&self) {
        self.connections_total.inc();
        self.active_connections.inc();
    }

    fn connection_closed(&self, duration_secs: f64) {
        self.active_connections.dec();
        self.connection_duration_seconds.observe(duration_secs);
    }
}
