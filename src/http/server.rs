//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum router for the employee endpoints
//! - Wire middleware: trace id, admission gate, timeout, access logs
//! - Serve on a listener until the shutdown channel fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::http::handlers;
use crate::http::request::trace_id_middleware;
use crate::security::{admission_middleware, AdmissionGate, RateLimitError, RateLimiter, RequestInterceptor};
use crate::service::EmployeeService;
use crate::upstream::{UpstreamClient, UpstreamSetupError};

/// Errors that prevent the server from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Upstream client setup failed: {0}")]
    Upstream(#[from] UpstreamSetupError),

    #[error("Rate limiter setup failed: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: EmployeeService,
}

/// HTTP front end of the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Validate the configuration and build every subsystem from it.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let client = UpstreamClient::new(&config.upstream, &config.retry)?;
        let limiter = RateLimiter::from_config(&config.rate_limit, &config.retry)?;
        Self::with_parts(config, client, Arc::new(limiter))
    }

    /// Build around an existing client and gate.
    pub fn with_parts(
        config: GatewayConfig,
        client: UpstreamClient,
        gate: Arc<dyn AdmissionGate>,
    ) -> Result<Self, ServerError> {
        let trace_header = HeaderName::from_bytes(config.upstream.trace_header.as_bytes())
            .map_err(|_| UpstreamSetupError::InvalidTraceHeader(config.upstream.trace_header.clone()))?;
        let state = AppState {
            service: EmployeeService::new(Arc::new(client)),
        };
        let interceptor = Arc::new(RequestInterceptor::from_config(gate, &config.rate_limit));

        tracing::info!(
            rate_limit_enabled = config.rate_limit.enabled,
            capacity = config.rate_limit.capacity,
            refill_per_second = config.rate_limit.refill_per_second,
            retry_before_reject = config.rate_limit.retry_before_reject,
            "Admission gate configured"
        );

        let router = Self::build_router(&config, state, interceptor, trace_header);
        Ok(Self { router, config })
    }

    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        interceptor: Arc<RequestInterceptor>,
        trace_header: HeaderName,
    ) -> Router {
        let employees = Router::new()
            .route(
                "/api/employees",
                get(handlers::list_employees).post(handlers::create_employee),
            )
            .route("/api/employees/search/{fragment}", get(handlers::search_employees))
            .route("/api/employees/highestSalary", get(handlers::highest_salary))
            .route(
                "/api/employees/topTenHighestEarningEmployeeNames",
                get(handlers::top_earner_names),
            )
            .route(
                "/api/employees/{id}",
                get(handlers::get_employee).delete(handlers::delete_employee),
            )
            .route_layer(from_fn_with_state(interceptor, admission_middleware));

        employees
            .with_state(state)
            .layer(from_fn_with_state(trace_header, trace_id_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until a message (or closure) arrives on `shutdown`.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstream = %self.config.upstream.base_url, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
