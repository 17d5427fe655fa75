//! Admission policy evaluators, one per guarded resource kind.
//!
//! Each evaluator is a pure function from a structurally validated request and
//! the immutable configuration to an outcome. Evaluators hold no state, do no
//! I/O, and are re-entrant; concurrent requests share only the configuration.
//!
//! An `Err` from an evaluator is an internal fault (a field the policy needs
//! was absent in an edge case the parser does not cover) and the dispatch
//! layer converts it to the generic invalid denial. The system never fails
//! open.

pub mod group;
pub mod identity;
pub mod namespace;
pub mod regular_user;
pub mod subscription;
pub mod user;

use thiserror::Error;

/// Usernames that bypass every policy
pub(crate) const CLUSTER_ADMIN_USERS: [&str; 2] = ["kube:admin", "system:admin"];

/// The OAuth operator's service account, which manages Users and Identities
/// as part of normal login flows
pub(crate) const OAUTH_SERVICE_ACCOUNT: &str =
    "system:serviceaccount:openshift-authentication:oauth-openshift";

/// Faults raised while a policy reads the request after structural validation
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A field the policy requires was absent
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Result of a policy evaluation
#[derive(Debug, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Deny reason for the response body, or allow detail for the log line
    pub message: Option<String>,
}

impl PolicyOutcome {
    /// Allow with the default log message
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            message: None,
        }
    }

    /// Allow, logging the given detail
    pub fn allowed_with(message: String) -> Self {
        Self {
            allowed: true,
            message: Some(message),
        }
    }

    /// Deny with the given response message
    pub fn denied(message: String) -> Self {
        Self {
            allowed: false,
            message: Some(message),
        }
    }
}
