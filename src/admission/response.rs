//! Admission verdict construction.
//!
//! Builds the `AdmissionReview` response envelope the API server expects.
//! Verdicts are created fresh per request, serialized once and discarded.
//! Allow verdicts always carry "Access granted" in the body; the richer
//! evaluator message is logged only. Deny verdicts carry the policy message.

use serde::Serialize;
use tracing::info;

use crate::admission::request::AdmissionRequest;

const API_VERSION: &str = "admission.k8s.io/v1beta1";
const ALLOW_BODY_MESSAGE: &str = "Access granted";
const INVALID_MESSAGE: &str = "Invalid request";

const DEFAULT_ALLOW_LOG: &str = "Allowed resource for this cluster";
const DEFAULT_DENY_LOG: &str = "Prohibited resource for this cluster";

/// Placeholder logged when the requester's username cannot be resolved
const UNKNOWN_USER: &str = "<unknown>";

#[derive(Debug, Serialize)]
pub struct VerdictStatus {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Verdict {
    pub uid: String,
    pub allowed: bool,
    pub status: VerdictStatus,
}

/// The wire-format response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: Verdict,
}

impl AdmissionReviewResponse {
    fn build(uid: &str, allowed: bool, message: &str) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "AdmissionReview".to_string(),
            response: Verdict {
                uid: uid.to_string(),
                allowed,
                status: VerdictStatus {
                    message: message.to_string(),
                },
            },
        }
    }
}

/// Allow the request. `msg` is for the log line only.
pub fn allow(request: &AdmissionRequest, msg: Option<String>) -> AdmissionReviewResponse {
    let msg = msg.unwrap_or_else(|| DEFAULT_ALLOW_LOG.to_string());
    info!(
        pid = std::process::id(),
        username = request.username().unwrap_or(UNKNOWN_USER),
        %msg,
        "Allowing admission"
    );
    AdmissionReviewResponse::build(&request.uid, true, ALLOW_BODY_MESSAGE)
}

/// Deny the request with the policy's message in the response body
pub fn deny(request: &AdmissionRequest, msg: Option<String>) -> AdmissionReviewResponse {
    let msg = msg.unwrap_or_else(|| DEFAULT_DENY_LOG.to_string());
    info!(
        pid = std::process::id(),
        username = request.username().unwrap_or(UNKNOWN_USER),
        %msg,
        "Denying admission"
    );
    AdmissionReviewResponse::build(&request.uid, false, &msg)
}

/// Deny a request that never passed structural validation. The uid is left
/// empty because nothing in the payload can be trusted.
pub fn invalid() -> AdmissionReviewResponse {
    AdmissionReviewResponse::build("", false, INVALID_MESSAGE)
}
