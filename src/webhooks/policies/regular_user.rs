//! Regular-user denial policy.
//!
//! A catch-all webhook for resource kinds that only cluster components and
//! admins should touch. Service accounts, system users and admin group
//! members pass; everyone else is denied by name and kind.

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{PolicyError, PolicyOutcome};

/// Decide whether the requester may act at all.
///
/// Explicitly unauthenticated requesters are denied before the system-user
/// shortcut, since "system:unauthenticated" would otherwise match the
/// "system:" prefix.
pub fn is_request_allowed(username: &str, groups: &[String], admin_groups: &[String]) -> bool {
    if username == "system:unauthenticated" {
        return false;
    }
    if username.starts_with("kube:") || username.starts_with("system:") {
        return true;
    }
    groups.iter().any(|g| admin_groups.contains(g))
}

/// Evaluate a generic admission request against the regular-user policy
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    let username = request
        .username()
        .ok_or(PolicyError::MissingField("userInfo.username"))?;

    if is_request_allowed(username, request.groups(), &config.admin_groups) {
        return Ok(PolicyOutcome::allowed());
    }

    let kind = request
        .target_object()
        .and_then(|obj| obj.kind.as_deref())
        .ok_or(PolicyError::MissingField("object.kind"))?;

    Ok(PolicyOutcome::denied(format!(
        "Regular user '{}' cannot {} kind '{}'.",
        username, request.operation, kind
    )))
}
