use std::net::SocketAddr;

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up before their first increment).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_cycles_total", "Monitor cycles started.");
        describe_counter!("relay_fetch_errors_total", "Cycles whose fetch failed.");
        describe_counter!("relay_posts_fetched_total", "Posts returned by the source.");
        describe_counter!("relay_posts_new_total", "Posts newer than the watermark.");
        describe_counter!(
            "relay_deliveries_total",
            "Delivery attempts, labelled by outcome."
        );
        describe_counter!(
            "relay_comment_errors_total",
            "Posts whose comments could not be fetched."
        );
        describe_counter!(
            "relay_watermark_saves_total",
            "Watermark writes, labelled by outcome."
        );
        describe_gauge!("relay_watermark_unix", "Current watermark as unix seconds.");
    });
}

/// Serve Prometheus exposition on `addr` (GET any path). Must run inside a Tokio runtime.
pub fn install_prometheus(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    ensure_metrics_described();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
