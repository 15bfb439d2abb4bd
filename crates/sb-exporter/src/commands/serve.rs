use std::sync::Arc;

use sb_metrics::Registry;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::config::ExporterConfig;
use crate::converter::CommandConverter;
use crate::pipeline::Pipeline;
use crate::server;

pub fn run(config: ExporterConfig) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    runtime.block_on(serve(config))
}

async fn serve(config: ExporterConfig) -> Result<(), String> {
    let bind = config.bind;
    info!(
        saves_dir = %config.saves_dir.display(),
        json_dir = %config.json_dir.display(),
        interval = ?config.refresh_interval,
        "starting exporter"
    );

    let converter = CommandConverter::new(config.converter.clone());
    let pipeline = Arc::new(Pipeline::new(config, converter, Arc::new(Registry::new())));
    let refresher = tokio::spawn(refresh_loop(Arc::clone(&pipeline)));

    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| format!("failed to bind {bind}: {e}"))?;
    info!("metrics available at http://{bind}/metrics");
    info!("health check available at http://{bind}/health");

    let result = axum::serve(listener, server::router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    refresher.abort();
    result.map_err(|e| format!("server exited with error: {e}"))
}

/// Refresh forever. Each cycle does blocking file and process work, so it
/// runs on the blocking pool.
async fn refresh_loop(pipeline: Arc<Pipeline>) {
    loop {
        let cycle = Arc::clone(&pipeline);
        let delay = match tokio::task::spawn_blocking(move || cycle.tick()).await {
            Ok(delay) => delay,
            Err(err) => {
                warn!(error = %err, "refresh task aborted");
                pipeline.config().refresh_interval
            }
        };
        tokio::time::sleep(delay).await;
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}
