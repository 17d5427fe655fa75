//! Prometheus metrics for the webhook service.
//!
//! Two counter families labeled by webhook name: total requests seen and
//! requests denied (structural-invalid or policy deny). Counters are
//! observability only and are never read back for decisions.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabel, EncodeLabelSet, LabelSetEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Labels identifying a webhook route
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct WebhookLabels {
    pub webhook: String,
}

impl EncodeLabelSet for WebhookLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), std::fmt::Error> {
        ("webhook", self.webhook.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Shared counters for all webhook routes
pub struct WebhookMetrics {
    /// Total admission requests received, per webhook
    requests_total: Family<WebhookLabels, Counter>,
    /// Requests answered with a denial, per webhook
    requests_denied: Family<WebhookLabels, Counter>,
    registry: Registry,
}

impl Default for WebhookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<WebhookLabels, Counter>::default();
        registry.register(
            "webhook_requests",
            "Total number of admission requests received",
            requests_total.clone(),
        );

        let requests_denied = Family::<WebhookLabels, Counter>::default();
        registry.register(
            "webhook_requests_denied",
            "Total number of admission requests denied",
            requests_denied.clone(),
        );

        Self {
            requests_total,
            requests_denied,
            registry,
        }
    }

    /// Record one inbound request for a webhook
    pub fn inc_total(&self, webhook: &str) {
        self.requests_total
            .get_or_create(&WebhookLabels {
                webhook: webhook.to_string(),
            })
            .inc();
    }

    /// Record one denied request for a webhook
    pub fn inc_denied(&self, webhook: &str) {
        self.requests_denied
            .get_or_create(&WebhookLabels {
                webhook: webhook.to_string(),
            })
            .inc();
    }

    /// Encode all counters to the Prometheus 0.0.4 text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if encode(&mut buffer, &self.registry).is_err() {
            tracing::error!("Failed to encode metrics");
            return "# Error encoding metrics".to_string();
        }
        buffer
    }
}
