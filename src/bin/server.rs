//! flightserve entry point.
//!
//! Reads configuration from the environment, initializes logging, and
//! serves the configured dataset until the process is stopped.

use tracing::error;
use tracing_subscriber::EnvFilter;

use flightserve::{serve, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(config).await {
        error!(error = %e, "server terminated with error");
        std::process::exit(1);
    }
}
