use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use salesboard_api::auth::{SessionAuthService, SessionConfig};
use salesboard_api::config::{init_tracing, load_config};
use salesboard_api::db::{establish_connection_from_app_config, run_migrations};
use salesboard_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(environment = %config.environment, "starting salesboard-api");

    let db = Arc::new(
        establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?,
    );

    if config.auto_migrate {
        run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let session_config = SessionConfig::new(
        config.session_secret.clone(),
        Duration::from_secs(config.session_expiration_secs),
    );
    let auth = Arc::new(SessionAuthService::new(session_config, db.clone()));

    let state = AppState::new(db, auth);

    if config.auto_seed {
        state
            .admin
            .seed_defaults()
            .await
            .context("failed to seed default groups and users")?;
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
