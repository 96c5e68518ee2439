//! Mayil Jira bridge binary.
//!
//! Standalone HTTP service that receives Jira webhooks and runs the in-process
//! poll queue.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mayil_jira::{
    run_poll_worker, server, Bridge, Config, DelayQueue, JiraClient, MayilClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter {:?}", config.log_filter))?;
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Mayil Jira bridge...");

    if config.jira_email.is_none() || config.jira_api_token.is_none() {
        info!("JIRA_EMAIL or JIRA_API_TOKEN not set - Jira requests will be unauthenticated");
    }

    let tracker = JiraClient::new(
        &config.jira_base_url,
        config.jira_email.as_deref(),
        config.jira_api_token.as_deref(),
    )
    .context("Failed to create Jira client")?;
    let processor =
        MayilClient::new(&config.server_url).context("Failed to create Mayil client")?;

    info!(
        jira = %config.jira_base_url,
        mayil = %config.server_url,
        initial_delay_secs = config.poll.initial_delay.as_secs(),
        interval_secs = config.poll.interval.as_secs(),
        max_attempts = config.poll.max_attempts,
        "Clients configured"
    );

    let (queue, receiver) = DelayQueue::new();
    let bridge = Bridge::new(
        Arc::new(tracker),
        Arc::new(processor),
        Arc::new(queue),
        &config.poll,
    );

    tokio::spawn(run_poll_worker(receiver, Arc::clone(&bridge.poller)));

    let app = server::build_router(server::AppState { bridge });

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Mayil Jira bridge listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
