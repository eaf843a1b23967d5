pub mod api;
pub mod config;
pub mod models;
pub mod pipeline;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pipeline::IntakeContext;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Serve the intake API until Ctrl-C.
pub async fn run() -> Result<(), String> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let intake = Arc::new(IntakeContext::with_default_parsers());
    for key in intake.registry().registered() {
        tracing::info!(parser = %key, "Registered parser");
    }

    let server = api::start_intake_server(intake, config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }

    server.shutdown().await;
    Ok(())
}
