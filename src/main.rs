use std::net::SocketAddr;

use axum::Router;
use mockfedcm::idp::{IdpConfig, SessionAccountResolver, fedcm_routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Mock FedCM IdP failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = IdpConfig::from_env()?;
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    tracing::info!(
        mode = ?config.mode(),
        idp_domain = %config.idp_domain(),
        bypass_sec_fetch_check = config.bypass_active(),
        "Starting mock FedCM IdP"
    );

    let app = build_app(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

#[cfg(feature = "ory")]
fn build_app(config: IdpConfig) -> Result<Router, mockfedcm::Error> {
    use std::sync::Arc;

    use mockfedcm::OryClient;
    use mockfedcm::idp::session_service_routes;

    if std::env::var_os("ORY_BASE_PATH").is_none() {
        return Ok(mock_app(config));
    }

    tracing::info!("Delegating sessions to Ory");
    let client = Arc::new(OryClient::from_env()?);
    Ok(session_service_routes(config, "/idp/api/auth/login", client))
}

#[cfg(not(feature = "ory"))]
fn build_app(config: IdpConfig) -> Result<Router, mockfedcm::Error> {
    Ok(mock_app(config))
}

fn mock_app(config: IdpConfig) -> Router {
    let resolver = SessionAccountResolver::from_config(&config);
    fedcm_routes(config, resolver)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
