mod config;
mod hipchat;
mod janitor;
mod observability;

use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    observability::init_tracing();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = config::Config::from_args(config::Args::parse())?;

    // Metrics recorder has to be in place before the first sweep records anything
    let metrics_handle = observability::install_metrics_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Bind both listeners up front so a port clash fails startup
    let health_listener = observability::bind("health", config.health_addr).await?;
    let metrics_listener = observability::bind("metrics", config.metrics_addr).await?;

    let health = observability::spawn_server("health", health_listener, observability::health_router());
    let metrics = observability::spawn_server(
        "metrics",
        metrics_listener,
        observability::metrics_router(metrics_handle),
    );

    // Create HipChat client
    let client = hipchat::HipChatClient::new(config.token, config.base_url, config.tls)
        .context("Failed to create HipChat client")?;

    let janitor = janitor::Janitor::new(client, config.max_idle_days);

    run_until_failure(janitor.run(config.interval), health, metrics).await
}

/// Drive the janitor while watching both listeners; whichever stops first
/// ends the process.
async fn run_until_failure<F>(
    janitor: F,
    health: JoinHandle<Result<()>>,
    metrics: JoinHandle<Result<()>>,
) -> Result<()>
where
    F: Future<Output = Result<(), janitor::SweepError>>,
{
    tokio::select! {
        result = janitor => result?,
        result = health => result.context("health server task panicked")??,
        result = metrics => result.context("metrics server task panicked")??,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hipchat::DirectoryError;
    use reqwest::StatusCode;
    use std::future::pending;

    fn idle_server() -> JoinHandle<Result<()>> {
        tokio::spawn(async { pending::<Result<()>>().await })
    }

    #[tokio::test]
    async fn test_stopped_listener_ends_process() {
        let health = tokio::spawn(async { Err::<(), _>(anyhow::anyhow!("health server stopped")) });

        let err = run_until_failure(pending(), health, idle_server())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "health server stopped");
    }

    #[tokio::test]
    async fn test_list_failure_ends_process() {
        let janitor = async {
            Err(janitor::SweepError::ListRooms(DirectoryError::Api {
                endpoint: "/v2/room".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "down".to_string(),
            }))
        };

        let err = run_until_failure(janitor, idle_server(), idle_server())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("could not get rooms list"));
    }
}
