//! Admission review request/response plumbing shared by all webhooks.

pub mod request;
pub mod response;

pub use request::{AdmissionRequest, ParseError, parse_review};
pub use response::{AdmissionReviewResponse, allow, deny, invalid};
