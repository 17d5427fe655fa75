//! Admission webhook server and dispatch layer.
//!
//! One POST route per evaluator, plus /metrics and the health probes. Every
//! inbound call is counted, structurally validated, evaluated, and answered
//! exactly once; any internal fault collapses to the generic invalid denial.
//!
//! The API server only trusts the service over TLS. Certificates are mounted
//! at /service-certs/ in deployment; when they are absent (local runs, tests)
//! the server falls back to plain HTTP.

use std::fmt;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::admission::{self, AdmissionReviewResponse, parse_review};
use crate::config::Config;
use crate::metrics::WebhookMetrics;
use crate::admission::AdmissionRequest;
use crate::webhooks::policies::{self, PolicyError, PolicyOutcome};

/// Path to the serving certificate mounted by the deployment
pub const TLS_CERT_PATH: &str = "/service-certs/tls.crt";
/// Path to the serving key mounted by the deployment
pub const TLS_KEY_PATH: &str = "/service-certs/tls.key";
/// Port the service listens on
pub const SERVICE_PORT: u16 = 5000;

/// The guarded resource kinds, one per route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Webhook {
    Group,
    Namespace,
    Identity,
    User,
    Subscription,
    RegularUser,
}

impl Webhook {
    /// Route path and metrics label for this webhook
    pub fn name(self) -> &'static str {
        match self {
            Webhook::Group => "group-validation",
            Webhook::Namespace => "namespace-validation",
            Webhook::Identity => "identity-validation",
            Webhook::User => "user-validation",
            Webhook::Subscription => "subscription-validation",
            Webhook::RegularUser => "regular-user-validation",
        }
    }

    fn debug_enabled(self, config: &Config) -> bool {
        match self {
            Webhook::Group => config.debug.group,
            Webhook::Namespace => config.debug.namespace,
            Webhook::Identity => config.debug.identity,
            Webhook::User => config.debug.user,
            Webhook::Subscription => config.debug.subscription,
            Webhook::RegularUser => config.debug.regular_user,
        }
    }
}

impl fmt::Display for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared state for all handlers: immutable configuration and the counters
pub struct AppState {
    pub config: Config,
    pub metrics: WebhookMetrics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: WebhookMetrics::new(),
        }
    }
}

/// Decide one admission call. Fully synchronous; the async handlers are thin
/// wrappers around this.
pub fn decide(webhook: Webhook, state: &AppState, payload: &Value) -> AdmissionReviewResponse {
    state.metrics.inc_total(webhook.name());

    // Flag-gated so operators can dump bodies for one route without
    // raising the global log level
    if webhook.debug_enabled(&state.config) {
        info!(webhook = %webhook, body = %payload, "Request body");
    }

    let request = match parse_review(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(webhook = %webhook, error = %e, "Malformed admission review");
            state.metrics.inc_denied(webhook.name());
            return admission::invalid();
        }
    };

    let outcome = match evaluate(webhook, &request, &state.config) {
        Ok(outcome) => outcome,
        Err(e) => {
            // Fail closed: the caller sees only the generic invalid denial
            error!(webhook = %webhook, uid = %request.uid, error = %e, "Policy evaluation fault");
            state.metrics.inc_denied(webhook.name());
            return admission::invalid();
        }
    };

    if outcome.allowed {
        admission::allow(&request, outcome.message)
    } else {
        state.metrics.inc_denied(webhook.name());
        admission::deny(&request, outcome.message)
    }
}

/// Route to the matching evaluator
fn evaluate(
    webhook: Webhook,
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    match webhook {
        Webhook::Group => policies::group::evaluate(request, config),
        Webhook::Namespace => policies::namespace::evaluate(request, config),
        Webhook::Identity => policies::identity::evaluate(request, config),
        Webhook::User => policies::user::evaluate(request, config),
        Webhook::Subscription => policies::subscription::evaluate(request, config),
        Webhook::RegularUser => policies::regular_user::evaluate(request, config),
    }
}

macro_rules! webhook_handler {
    ($name:ident, $webhook:expr) => {
        async fn $name(
            State(state): State<Arc<AppState>>,
            Json(payload): Json<Value>,
        ) -> impl IntoResponse {
            (StatusCode::OK, Json(decide($webhook, &state, &payload)))
        }
    };
}

webhook_handler!(group_validation, Webhook::Group);
webhook_handler!(namespace_validation, Webhook::Namespace);
webhook_handler!(identity_validation, Webhook::Identity);
webhook_handler!(user_validation, Webhook::User);
webhook_handler!(subscription_validation, Webhook::Subscription);
webhook_handler!(regular_user_validation, Webhook::RegularUser);

/// Liveness probe handler
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler. The service carries no state to warm up, so
/// ready and alive coincide.
async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, "ready")
}

/// Metrics handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Create the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/group-validation", post(group_validation))
        .route("/namespace-validation", post(namespace_validation))
        .route("/identity-validation", post(identity_validation))
        .route("/user-validation", post(user_validation))
        .route("/subscription-validation", post(subscription_validation))
        .route("/regular-user-validation", post(regular_user_validation))
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Errors that can occur when running the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Run the webhook server.
///
/// Serves with TLS when both certificate and key exist at the given paths,
/// plain HTTP otherwise.
pub async fn run_server(
    state: Arc<AppState>,
    cert_path: &str,
    key_path: &str,
) -> Result<(), ServerError> {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], SERVICE_PORT));

    if Path::new(cert_path).exists() && Path::new(key_path).exists() {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            PathBuf::from(cert_path),
            PathBuf::from(key_path),
        )
        .await
        .map_err(|e| ServerError::TlsConfig(e.to_string()))?;

        info!(port = SERVICE_PORT, "Webhook server listening with TLS");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        warn!(
            port = SERVICE_PORT,
            "Serving certificates not found, listening without TLS"
        );
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(Config::from_lookup(|_| None).unwrap())
    }

    fn review(operation: &str, object: Value, username: &str, groups: &[&str]) -> Value {
        json!({
            "kind": "AdmissionReview",
            "request": {
                "uid": "dispatch-uid",
                "kind": { "kind": "Group" },
                "resource": { "resource": "groups" },
                "operation": operation,
                "object": object,
                "userInfo": { "username": username, "groups": groups }
            }
        })
    }

    #[test]
    fn test_malformed_body_is_invalid_and_counted() {
        let state = state();
        let verdict = decide(Webhook::Group, &state, &json!({ "kind": "Nonsense" }));
        assert!(!verdict.response.allowed);
        assert_eq!(verdict.response.status.message, "Invalid request");
        assert_eq!(verdict.response.uid, "");

        let text = state.metrics.encode();
        assert!(text.contains("webhook_requests_total{webhook=\"group-validation\"} 1"));
        assert!(text.contains("webhook_requests_denied_total{webhook=\"group-validation\"} 1"));
    }

    #[test]
    fn test_policy_fault_fails_closed() {
        // Passes structural validation but the object has no metadata.name
        let state = state();
        let payload = review("CREATE", json!({ "kind": "Group" }), "bob", &[]);
        let verdict = decide(Webhook::Group, &state, &payload);
        assert!(!verdict.response.allowed);
        assert_eq!(verdict.response.status.message, "Invalid request");
    }

    #[test]
    fn test_deny_keeps_uid_and_message() {
        let state = state();
        let payload = review(
            "UPDATE",
            json!({ "kind": "Group", "metadata": { "name": "dedicated-admins" } }),
            "bob",
            &["some-team"],
        );
        let verdict = decide(Webhook::Group, &state, &payload);
        assert!(!verdict.response.allowed);
        assert_eq!(verdict.response.uid, "dispatch-uid");
        assert_eq!(
            verdict.response.status.message,
            "User not authorized to UPDATE group dedicated-admins"
        );
    }

    #[test]
    fn test_allow_does_not_touch_denied_counter() {
        let state = state();
        let payload = review(
            "UPDATE",
            json!({ "kind": "Group", "metadata": { "name": "customer-group" } }),
            "bob",
            &[],
        );
        let verdict = decide(Webhook::Group, &state, &payload);
        assert!(verdict.response.allowed);
        assert_eq!(verdict.response.status.message, "Access granted");

        let text = state.metrics.encode();
        assert!(text.contains("webhook_requests_total{webhook=\"group-validation\"} 1"));
        assert!(!text.contains("webhook_requests_denied_total{webhook=\"group-validation\"} 1"));
    }

    #[test]
    fn test_idempotent_evaluation() {
        let state = state();
        let payload = review(
            "UPDATE",
            json!({ "kind": "Group", "metadata": { "name": "dedicated-admins" } }),
            "bob",
            &[],
        );
        let first = decide(Webhook::Group, &state, &payload);
        let second = decide(Webhook::Group, &state, &payload);
        assert_eq!(first.response.allowed, second.response.allowed);
        assert_eq!(
            first.response.status.message,
            second.response.status.message
        );
    }

    #[test]
    fn test_webhook_names() {
        assert_eq!(Webhook::Group.to_string(), "group-validation");
        assert_eq!(Webhook::RegularUser.to_string(), "regular-user-validation");
    }
}
