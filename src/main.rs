use std::net::SocketAddr;

use anyhow::{Context, Result};
use dziennik_treningowy::config::{
    run_migrations, AppConfig, DatabaseConfig, MailConfig, StorageConfig,
};
use dziennik_treningowy::services::{CleanupScheduler, Mailer};
use dziennik_treningowy::storage::FileStorage;
use dziennik_treningowy::{create_routes, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Invalid application configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let database_config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let storage_config = StorageConfig::from_env().context("Invalid storage configuration")?;
    let mail_config = MailConfig::from_env().context("Invalid mail configuration")?;

    let pool = database_config.create_pool().await?;
    run_migrations(&pool).await?;

    FileStorage::new(storage_config.upload_dir.clone())
        .ensure_root()
        .await
        .context("Failed to create upload directory")?;

    let state = AppState::new(pool, config.clone(), storage_config, Mailer::new(&mail_config));
    CleanupScheduler::new(state.auth_service.clone()).start();

    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Dziennik Treningowy listening on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
