//! Identity validation policy.
//!
//! Identities issued by the configured provider belong to SRE; only admin
//! group members may touch them. Identities from any other provider are the
//! customer's to manage.

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{CLUSTER_ADMIN_USERS, OAUTH_SERVICE_ACCOUNT, PolicyError, PolicyOutcome};

/// Evaluate an Identity admission request
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    let target = request
        .target_object()
        .ok_or(PolicyError::MissingField("object"))?;
    let identity_name = target
        .metadata
        .name
        .as_deref()
        .ok_or(PolicyError::MissingField("metadata.name"))?;
    let provider_name = target
        .provider_name
        .as_deref()
        .ok_or(PolicyError::MissingField("providerName"))?;

    let username = request
        .username()
        .ok_or(PolicyError::MissingField("userInfo.username"))?;

    if CLUSTER_ADMIN_USERS.contains(&username) || username == OAUTH_SERVICE_ACCOUNT {
        return Ok(PolicyOutcome::allowed());
    }

    if provider_name != config.identity_provider {
        return Ok(PolicyOutcome::allowed());
    }

    if config.is_admin_member(request.groups()) {
        Ok(PolicyOutcome::allowed_with(format!(
            "{} identity {}",
            request.operation, identity_name
        )))
    } else {
        Ok(PolicyOutcome::denied(format!(
            "User not authorized to {} identity {}",
            request.operation, identity_name
        )))
    }
}
