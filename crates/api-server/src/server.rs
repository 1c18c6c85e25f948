//! API server — binds the trigger router and the metrics exporter.

use crate::handlers::AppState;
use crate::router;
use std::net::SocketAddr;
use tidypush_core::config::AppConfig;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP server. Runs until the process is stopped.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router::trigger_router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus metrics exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
