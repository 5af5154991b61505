//! ChatRank batch entry point.
//!
//! Loads configuration, connects to the analytics store, runs one
//! ranking pass, and exits. Scheduling belongs to whatever invokes the
//! binary.

use chatrank::config::AppConfig;
use chatrank::db;
use chatrank::db::data_service::MySqlMessageDataService;
use chatrank::db::repository::MySqlRankRepository;
use chatrank::services::ChatRankService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::build()?;

    // 2. Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.observability.log_filter))
        .init();

    tracing::info!("Starting ChatRank...");

    // 3. Metrics exporter, when a port is configured
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    // 4. Connect to the analytics store
    let pool = db::connect(&config.database).await?;

    // 5. Wire the pipeline
    let service = ChatRankService::new(
        Arc::new(MySqlMessageDataService::new(pool.clone())),
        Arc::new(MySqlRankRepository::new(pool)),
    );

    // 6. Run one ranking pass
    let summary = service.run(&config.ranking).await?;
    tracing::info!(
        users = summary.users_ranked,
        iterations = summary.iterations,
        converged = summary.converged,
        "ChatRank finished"
    );

    Ok(())
}
