//! Webhook module: policy evaluators and the HTTP dispatch layer.

pub mod policies;
mod server;

pub use policies::{PolicyError, PolicyOutcome};
pub use server::{
    AppState, SERVICE_PORT, ServerError, TLS_CERT_PATH, TLS_KEY_PATH, Webhook, create_router,
    decide, run_server,
};
