use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use evsim_api::{routes, Dispatcher, Settings, Simulator, StreamConfig};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // .env first, then EVSIM_* variables
    let settings = Settings::load().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        Settings::default()
    });

    let dispatcher = if settings.dry_run {
        info!("dry run, events are logged instead of sent");
        Dispatcher::dry_run()
    } else {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.dispatch_timeout_ms))
            .build()?;
        Dispatcher::http(client)
    };

    let simulator = Arc::new(Simulator::new(
        StreamConfig::from(&settings),
        settings.variant,
        dispatcher,
    ));
    simulator.init().await;

    let app = routes::router(simulator.clone(), settings.max_concurrency);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    info!(variant = ?settings.variant, "Simulator API running → http://{}/health", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    simulator.stop().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
