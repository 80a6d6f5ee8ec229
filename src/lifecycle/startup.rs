//! Startup orchestration.
//!
//! Order: metrics exporter, subsystems, listener. Any error is fatal.

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::GatewayConfig;
use crate::http::{GatewayServer, ServerError};
use crate::observability::metrics;

/// Build every subsystem and bind the listener, without serving yet.
pub async fn prepare(config: GatewayConfig) -> Result<(GatewayServer, TcpListener), ServerError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = GatewayServer::new(config)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    Ok((server, listener))
}

/// Prepare and serve until `shutdown` fires.
pub async fn start(config: GatewayConfig, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
    let (server, listener) = prepare(config).await?;
    server.run(listener, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn local_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config
    }

    #[tokio::test]
    async fn test_prepare_binds_listener() {
        let (_server, listener) = prepare(local_config()).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bad_bind_address_fails_validation() {
        let mut config = local_config();
        config.listener.bind_address = "not-an-address".to_string();
        assert!(matches!(prepare(config).await, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_port_in_use_fails_to_bind() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config();
        config.listener.bind_address = taken.local_addr().unwrap().to_string();
        assert!(matches!(prepare(config).await, Err(ServerError::Io(_))));
    }

    #[tokio::test]
    async fn test_start_returns_after_shutdown() {
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(start(local_config(), shutdown.subscribe()));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
