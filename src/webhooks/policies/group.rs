//! Group validation policy.
//!
//! Guards the cluster's managed groups: names matching the protected pattern
//! (SRE and customer admin groups) may only be created, updated or deleted by
//! members of the configured admin groups. Groups carrying an exclusive
//! prefix additionally require the requester to hold a group with that same
//! prefix, so customer-admin membership alone cannot touch SRE groups.

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{CLUSTER_ADMIN_USERS, PolicyError, PolicyOutcome};

/// Evaluate a Group admission request
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    let group_name = request
        .target_name()
        .ok_or(PolicyError::MissingField("metadata.name"))?;

    // A request without a username is malformed, not merely unauthenticated
    let username = request
        .username()
        .ok_or(PolicyError::MissingField("userInfo.username"))?;

    if CLUSTER_ADMIN_USERS.contains(&username) {
        return Ok(PolicyOutcome::allowed());
    }

    if !config.protected_group_regex.is_match(group_name) {
        return Ok(PolicyOutcome::allowed());
    }

    let deny_msg = format!(
        "User not authorized to {} group {}",
        request.operation, group_name
    );

    if !config.is_admin_member(request.groups()) {
        return Ok(PolicyOutcome::denied(deny_msg));
    }

    // First configured exclusive prefix the target group carries, if any.
    // Admin membership is not enough for these; the requester must also hold
    // a group sharing the prefix.
    let exclusive_prefix = config
        .exclusive_group_prefixes
        .iter()
        .find(|prefix| group_name.starts_with(prefix.as_str()));

    if let Some(prefix) = exclusive_prefix {
        let shares_prefix = request.groups().iter().any(|g| g.starts_with(prefix));
        if !shares_prefix {
            return Ok(PolicyOutcome::denied(deny_msg));
        }
    }

    Ok(PolicyOutcome::allowed_with(format!(
        "{} group {}",
        request.operation, group_name
    )))
}
