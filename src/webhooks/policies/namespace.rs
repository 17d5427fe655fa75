//! Namespace validation policy.
//!
//! Keeps non-admins out of the cluster's privileged namespaces. Service
//! accounts from system namespaces bypass the check entirely, layered-product
//! SREs may manage the redhat-* namespaces, and everything unprivileged is
//! left to RBAC.

use std::sync::LazyLock;

use regex::Regex;

use crate::admission::request::AdmissionRequest;
use crate::config::Config;

use super::{CLUSTER_ADMIN_USERS, PolicyError, PolicyOutcome};

/// Group granted access to the redhat-* namespaces
const LAYERED_SRE_GROUP: &str = "layered-sre-cluster-admins";

/// Service accounts from these namespaces may edit any namespace
#[allow(clippy::expect_used)]
static PRIVILEGED_SERVICE_ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^system:serviceaccounts:(kube.*|openshift.*|default|redhat.*)")
        .expect("static pattern")
});

/// Namespaces reserved for cluster management
#[allow(clippy::expect_used)]
static PRIVILEGED_NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(^kube-.*|^openshift.*|^ops-health-monitoring$|^management-infra$|^default$|^logging$|^sre-app-check$|^redhat-.*)",
    )
    .expect("static pattern")
});

#[allow(clippy::expect_used)]
static REDHAT_NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^redhat.*").expect("static pattern")
});

/// Evaluate a Namespace admission request
pub fn evaluate(
    request: &AdmissionRequest,
    config: &Config,
) -> Result<PolicyOutcome, PolicyError> {
    let requester_groups = request.groups();

    if requester_groups
        .iter()
        .any(|g| PRIVILEGED_SERVICE_ACCOUNT_RE.is_match(g))
    {
        return Ok(PolicyOutcome::allowed());
    }

    let namespace = request
        .namespace
        .as_deref()
        .ok_or(PolicyError::MissingField("namespace"))?;

    if REDHAT_NAMESPACE_RE.is_match(namespace)
        && requester_groups.iter().any(|g| g == LAYERED_SRE_GROUP)
    {
        return Ok(PolicyOutcome::allowed());
    }

    if PRIVILEGED_NAMESPACE_RE.is_match(namespace) {
        let username = request
            .username()
            .ok_or(PolicyError::MissingField("userInfo.username"))?;
        if config.is_admin_member(requester_groups) || CLUSTER_ADMIN_USERS.contains(&username) {
            return Ok(PolicyOutcome::allowed());
        }
        return Ok(PolicyOutcome::denied(format!(
            "You cannot update the privileged namespace {}.",
            namespace
        )));
    }

    // Unprivileged namespace; RBAC decides
    Ok(PolicyOutcome::allowed())
}
