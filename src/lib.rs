//! managed-webhooks library crate
//!
//! Validating admission webhooks guarding the managed resources of an
//! OpenShift Dedicated cluster: Groups, Namespaces, Identities, Users,
//! Subscriptions, and a catch-all regular-user denier.

pub mod admission;
pub mod config;
pub mod metrics;
pub mod webhooks;

pub use config::{Config, ConfigError};
pub use metrics::WebhookMetrics;
pub use webhooks::{
    AppState, SERVICE_PORT, ServerError, TLS_CERT_PATH, TLS_KEY_PATH, Webhook, create_router,
    decide, run_server,
};
