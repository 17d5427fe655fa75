//! User validation policy.
//!
//! Red Hat users (names ending in @redhat.com) are managed by SRE; only admin
//! group members may touch them. All other User objects are left alone.

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{CLUSTER_ADMIN_USERS, OAUTH_SERVICE_ACCOUNT, PolicyError, PolicyOutcome};

/// Suffix marking a User object as Red Hat managed
const PROTECTED_USER_SUFFIX: &str = "@redhat.com";

/// Evaluate a User admission request
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    let user_name = request
        .target_name()
        .ok_or(PolicyError::MissingField("metadata.name"))?;

    let username = request
        .username()
        .ok_or(PolicyError::MissingField("userInfo.username"))?;

    if CLUSTER_ADMIN_USERS.contains(&username) || username == OAUTH_SERVICE_ACCOUNT {
        return Ok(PolicyOutcome::allowed());
    }

    if !user_name.ends_with(PROTECTED_USER_SUFFIX) {
        return Ok(PolicyOutcome::allowed());
    }

    if config.is_admin_member(request.groups()) {
        Ok(PolicyOutcome::allowed_with(format!(
            "{} user {}",
            request.operation, user_name
        )))
    } else {
        Ok(PolicyOutcome::denied(format!(
            "User not authorized to {} user {}",
            request.operation, user_name
        )))
    }
}
