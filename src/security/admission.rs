//! Admission middleware in front of the protected endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::Response,
};

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::rate_limit::AdmissionGate;

/// Body written when a request is turned away.
pub const REJECTION_MESSAGE: &str = "Too many requests - rate limit exceeded";

/// How a denied permit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    RejectImmediately,
    RetryBeforeReject,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny { status: StatusCode, message: &'static str },
}

/// Consults the gate for protected paths.
pub struct RequestInterceptor {
    gate: Arc<dyn AdmissionGate>,
    enabled: bool,
    mode: AdmissionMode,
    protected_paths: Vec<String>,
}

impl RequestInterceptor {
    pub fn new(
        gate: Arc<dyn AdmissionGate>,
        enabled: bool,
        mode: AdmissionMode,
        protected_paths: Vec<String>,
    ) -> Self {
        Self {
            gate,
            enabled,
            mode,
            protected_paths,
        }
    }

    pub fn from_config(gate: Arc<dyn AdmissionGate>, config: &RateLimitConfig) -> Self {
        let mode = if config.retry_before_reject {
            AdmissionMode::RetryBeforeReject
        } else {
            AdmissionMode::RejectImmediately
        };
        Self::new(gate, config.enabled, mode, config.protected_paths.clone())
    }

    /// A path is protected when it equals a configured prefix or continues it with `/`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            match path.strip_prefix(prefix) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }

    /// Decide whether the request for `uri` may proceed.
    pub async fn admit(&self, uri: &Uri) -> Admission {
        if !self.enabled || !self.is_protected(uri.path()) {
            return Admission::Allow;
        }

        let admitted = match self.mode {
            AdmissionMode::RejectImmediately => self.gate.try_acquire(),
            AdmissionMode::RetryBeforeReject => self.gate.try_acquire_with_retry().await,
        };

        if admitted {
            Admission::Allow
        } else {
            Admission::Deny {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: REJECTION_MESSAGE,
            }
        }
    }
}

/// Label for a rejected request: the route template, never the raw path.
fn route_label(request: &Request) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
}

const UNMATCHED_ROUTE: &str = "unmatched";

/// Middleware function running the interceptor before the handler.
pub async fn admission_middleware(
    State(interceptor): State<Arc<RequestInterceptor>>,
    request: Request,
    next: Next,
) -> Response {
    let uri = request.uri().clone();

    match interceptor.admit(&uri).await {
        Admission::Allow => next.run(request).await,
        Admission::Deny { status, message } => {
            tracing::warn!(path = %uri.path(), "Rate limit exceeded");
            metrics::record_rate_limited(route_label(&request));
            let mut response = Response::new(Body::from(message));
            *response.status_mut() = status;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use axum::{routing::get, Router};
    use futures_util::future::BoxFuture;
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    struct CountingGate {
        allow: AtomicBool,
        immediate_calls: AtomicUsize,
        retry_calls: AtomicUsize,
    }

    impl CountingGate {
        fn allowing(allow: bool) -> Arc<Self> {
            let gate = Self::default();
            gate.allow.store(allow, Ordering::SeqCst);
            Arc::new(gate)
        }
    }

    impl AdmissionGate for CountingGate {
        fn try_acquire(&self) -> bool {
            self.immediate_calls.fetch_add(1, Ordering::SeqCst);
            self.allow.load(Ordering::SeqCst)
        }

        fn try_acquire_with_retry(&self) -> BoxFuture<'_, bool> {
            self.retry_calls.fetch_add(1, Ordering::SeqCst);
            let allow = self.allow.load(Ordering::SeqCst);
            Box::pin(async move { allow })
        }
    }

    fn interceptor(gate: Arc<CountingGate>, enabled: bool, mode: AdmissionMode) -> RequestInterceptor {
        RequestInterceptor::new(gate, enabled, mode, vec!["/api/employees".to_string()])
    }

    fn uri(path: &str) -> Uri {
        path.parse().unwrap()
    }

    #[tokio::test]
    async fn test_disabled_never_consults_gate() {
        let gate = CountingGate::allowing(false);
        let interceptor = interceptor(gate.clone(), false, AdmissionMode::RejectImmediately);

        for _ in 0..25 {
            assert_eq!(interceptor.admit(&uri("/api/employees")).await, Admission::Allow);
        }
        assert_eq!(gate.immediate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gate.retry_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denied_request_gets_429() {
        let gate = CountingGate::allowing(false);
        let interceptor = interceptor(gate.clone(), true, AdmissionMode::RejectImmediately);

        assert_eq!(
            interceptor.admit(&uri("/api/employees")).await,
            Admission::Deny {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: REJECTION_MESSAGE
            }
        );
        assert_eq!(gate.immediate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_mode_uses_blocking_variant() {
        let gate = CountingGate::allowing(true);
        let interceptor = interceptor(gate.clone(), true, AdmissionMode::RetryBeforeReject);

        assert_eq!(interceptor.admit(&uri("/api/employees/42")).await, Admission::Allow);
        assert_eq!(gate.retry_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gate.immediate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unprotected_paths_bypass_gate() {
        let gate = CountingGate::allowing(false);
        let interceptor = interceptor(gate.clone(), true, AdmissionMode::RejectImmediately);

        assert_eq!(interceptor.admit(&uri("/health")).await, Admission::Allow);
        assert_eq!(interceptor.admit(&uri("/api/employeesX")).await, Admission::Allow);
        assert_eq!(gate.immediate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_middleware_short_circuits_handler() {
        let gate = CountingGate::allowing(false);
        let interceptor = Arc::new(interceptor(gate, true, AdmissionMode::RejectImmediately));
        let handler_runs = Arc::new(AtomicUsize::new(0));
        let runs = handler_runs.clone();

        let app = Router::new()
            .route(
                "/api/employees",
                get(move || {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(interceptor, admission_middleware));

        let response = app
            .oneshot(Request::builder().uri("/api/employees").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], REJECTION_MESSAGE.as_bytes());
        assert_eq!(handler_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejections_share_one_series_per_route() {
        use metrics_util::debugging::DebuggingRecorder;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let _guard = ::metrics::set_default_local_recorder(&recorder);

        let gate = CountingGate::allowing(false);
        let interceptor = Arc::new(interceptor(gate, true, AdmissionMode::RejectImmediately));
        let app = Router::new()
            .route("/api/employees/{id}", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(interceptor, admission_middleware));

        for id in 0..500 {
            let request = Request::builder()
                .uri(format!("/api/employees/{id}"))
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }

        let series: Vec<_> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == "gateway_requests_rejected_total")
            .collect();
        assert_eq!(series.len(), 1);

        let (key, _, _, value) = &series[0];
        let labels: Vec<(String, String)> = key
            .key()
            .labels()
            .map(|l| (l.key().to_string(), l.value().to_string()))
            .collect();
        assert_eq!(labels, vec![("route".to_string(), "/api/employees/{id}".to_string())]);
        assert!(matches!(value, metrics_util::debugging::DebugValue::Counter(500)));
    }
}
