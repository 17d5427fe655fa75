//! managed-webhooks - validating admission webhooks for managed clusters.
//!
//! Entry point that:
//! - Initializes structured logging
//! - Reads the policy configuration from the environment
//! - Serves the webhook routes (TLS when certificates are mounted)

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use managed_webhooks::{AppState, Config, TLS_CERT_PATH, TLS_KEY_PATH, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("managed_webhooks=info".parse()?),
        )
        .json()
        .init();

    info!("Starting managed-webhooks");

    let config = Config::from_env()?;
    info!(
        admin_groups = ?config.admin_groups,
        identity_provider = %config.identity_provider,
        "Loaded policy configuration"
    );

    let state = Arc::new(AppState::new(config));

    tokio::select! {
        result = run_server(state, TLS_CERT_PATH, TLS_KEY_PATH) => {
            if let Err(e) = result {
                error!("Webhook server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, shutting down");
        }
    }

    info!("managed-webhooks stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the service cannot shut
/// down gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
