use std::sync::Arc;

use jobwatch::config::AppConfig;
use jobwatch::coordinator::DeliveryCoordinator;
use jobwatch::database::{self, SqlxPostingRepository};
use jobwatch::logging;
use jobwatch::monitor::JobMonitor;
use jobwatch::notification::build_channels;
use jobwatch::sources::SourceSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init_logging(&config.log_dir)?;

    let cancel = CancellationToken::new();
    logging::spawn_retention_cleanup(config.log_dir.clone(), cancel.child_token());

    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let repo = Arc::new(SqlxPostingRepository::new(pool.clone()));
    let channels = build_channels(&config.channel_configs(), config.request_timeout);
    let coordinator = DeliveryCoordinator::new(repo, channels, config.request_timeout);
    let sources = SourceSet::from_config(&config.sources, config.request_timeout);

    let mut monitor = JobMonitor::new(
        coordinator,
        sources,
        config.keywords.clone(),
        config.check_interval,
    );

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Received shutdown signal");
        shutdown.cancel();
    });

    info!(database = %config.database_url, "jobwatch initialized successfully");

    let result = monitor.run(cancel.clone()).await;
    cancel.cancel();
    pool.close().await;

    result?;
    Ok(())
}
