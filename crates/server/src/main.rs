mod api;
mod bootstrap;
mod health;
mod mailer;
mod search;
mod transport;
mod worker;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::{Context, Result};
use concierge_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use concierge_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = app.config.worker.enabled.then(|| {
        tokio::spawn(worker::run(
            app.consumer.clone(),
            app.config.queue.poll_interval(),
            shutdown_rx.clone(),
        ))
    });

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;
    let router = api::router(
        api::ApiState { dialog: app.dialog.clone(), consumer: app.consumer.clone() },
        health::HealthState { db_pool: app.db_pool.clone(), queue: app.queue_probe.clone() },
    );

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        worker_enabled = app.config.worker.enabled,
        "concierge-server started"
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stopping| *stopping).await;
        })
        .await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "concierge-server stopping"
    );

    if let Some(handle) = worker {
        let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!(
                event_name = "system.worker.shutdown_timeout",
                correlation_id = "shutdown",
                "queue worker did not stop within the grace period"
            );
        }
    }

    if let Some(pool) = app.db_pool {
        pool.close().await;
    }

    Ok(())
}
