use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: sessions committed by the engine.
pub const SESSIONS_SCHEDULED_TOTAL: &str = "gymsched_sessions_scheduled_total";

/// Counter: rejected schedule requests. Labels: reason.
pub const SCHEDULE_REJECTIONS_TOTAL: &str = "gymsched_schedule_rejections_total";

/// Histogram: end-to-end schedule decision latency in seconds.
pub const SCHEDULE_DURATION_SECONDS: &str = "gymsched_schedule_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: number of registered centers.
pub const CENTERS_ACTIVE: &str = "gymsched_centers_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "gymsched_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "gymsched_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
