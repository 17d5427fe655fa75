//! Subscription validation policy.
//!
//! Customer admins (dedicated-admins) may only install operators from the
//! approved catalog source namespaces. Everyone else falls through to RBAC.

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{PolicyError, PolicyOutcome};

/// Customer admin group subject to the source-namespace restriction
const DEDICATED_ADMINS: &str = "dedicated-admins";

/// Evaluate a Subscription admission request
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    if !request.groups().iter().any(|g| g == DEDICATED_ADMINS) {
        return Ok(PolicyOutcome::allowed());
    }

    let source_namespace = request
        .target_object()
        .and_then(|obj| obj.spec.source_namespace.as_deref())
        .ok_or(PolicyError::MissingField("spec.sourceNamespace"))?;

    if config
        .valid_source_namespaces
        .iter()
        .any(|ns| ns == source_namespace)
    {
        Ok(PolicyOutcome::allowed())
    } else {
        Ok(PolicyOutcome::denied(format!(
            "You cannot manage Subscriptions that target {}.",
            source_namespace
        )))
    }
}
