//! Typed admission request schema and structural validation.
//!
//! The API server sends an `AdmissionReview` envelope. Everything in the body
//! is attacker-influenced, so the parser checks the expected shape up front and
//! evaluators only ever see a request that passed. Fields the policies do not
//! read stay opaque.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Structural validation failures. Any of these short-circuits to the
/// "Invalid request" verdict before a policy runs.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Top-level kind was missing or not "AdmissionReview"
    #[error("payload is not an AdmissionReview")]
    NotAdmissionReview,

    /// A required key was absent from the request body
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field was present but of the wrong type
    #[error("field {0} has the wrong type")]
    WrongType(&'static str),

    /// The body matched the expected shape but did not deserialize
    #[error("malformed request body: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Identity of the requester, as reported by the API server
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserInfo {
    pub username: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Opaque extensions; never inspected by policy
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Object metadata fragment; only the name matters to policy
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectMeta {
    pub name: Option<String>,
}

/// Subscription spec fragment
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectSpec {
    #[serde(rename = "sourceNamespace")]
    pub source_namespace: Option<String>,
}

/// The slice of the incoming/outgoing object the policies read. The full
/// object is arbitrary; everything else is ignored on deserialization.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RequestObject {
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Identity objects carry the provider at the top level
    #[serde(rename = "providerName")]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub spec: ObjectSpec,
}

/// A structurally validated admission request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Opaque request identifier, echoed back in the verdict
    #[serde(default)]
    pub uid: String,
    /// CREATE, UPDATE or DELETE, passed through verbatim into messages
    #[serde(default)]
    pub operation: String,
    pub namespace: Option<String>,
    /// Proposed new state; null on DELETE
    pub object: Option<RequestObject>,
    /// Prior state; populated on DELETE
    pub old_object: Option<RequestObject>,
    #[serde(default)]
    pub user_info: UserInfo,
}

impl AdmissionRequest {
    /// The object carrying the resource's identity: `object`, or `oldObject`
    /// when the request is a DELETE.
    pub fn target_object(&self) -> Option<&RequestObject> {
        self.object.as_ref().or(self.old_object.as_ref())
    }

    /// `metadata.name` of the target object
    pub fn target_name(&self) -> Option<&str> {
        self.target_object()
            .and_then(|obj| obj.metadata.name.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        self.user_info.username.as_deref()
    }

    pub fn groups(&self) -> &[String] {
        &self.user_info.groups
    }
}

/// Validate the shape of a decoded payload and extract the typed request.
///
/// Valid means: top-level `kind == "AdmissionReview"`, a nested `request`
/// object with the keys `kind`, `resource`, `operation` and `object` (the
/// `object` value may be null, as on DELETE), and a `userInfo` carrying a
/// string `username` and an array `groups`.
pub fn parse_review(payload: &Value) -> Result<AdmissionRequest, ParseError> {
    if payload.get("kind").and_then(Value::as_str) != Some("AdmissionReview") {
        return Err(ParseError::NotAdmissionReview);
    }

    let request = payload
        .get("request")
        .ok_or(ParseError::MissingField("request"))?;
    let body = request
        .as_object()
        .ok_or(ParseError::WrongType("request"))?;

    for key in ["kind", "resource", "operation", "object"] {
        if !body.contains_key(key) {
            return Err(ParseError::MissingField(match key {
                "kind" => "request.kind",
                "resource" => "request.resource",
                "operation" => "request.operation",
                _ => "request.object",
            }));
        }
    }

    let user_info = body
        .get("userInfo")
        .ok_or(ParseError::MissingField("request.userInfo"))?;
    if !user_info
        .get("username")
        .map(Value::is_string)
        .unwrap_or(false)
    {
        return Err(ParseError::MissingField("request.userInfo.username"));
    }
    if !user_info
        .get("groups")
        .map(Value::is_array)
        .unwrap_or(false)
    {
        return Err(ParseError::WrongType("request.userInfo.groups"));
    }

    Ok(serde_json::from_value(request.clone())?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(request: Value) -> Value {
        json!({ "kind": "AdmissionReview", "request": request })
    }

    fn base_request() -> Value {
        json!({
            "uid": "uid-1",
            "kind": { "kind": "Group" },
            "resource": { "resource": "groups" },
            "operation": "UPDATE",
            "object": { "kind": "Group", "metadata": { "name": "some-group" } },
            "userInfo": { "username": "alice", "groups": ["a", "b"] }
        })
    }

    #[test]
    fn test_parse_well_formed() {
        let request = parse_review(&review(base_request())).unwrap();
        assert_eq!(request.uid, "uid-1");
        assert_eq!(request.operation, "UPDATE");
        assert_eq!(request.target_name(), Some("some-group"));
        assert_eq!(request.username(), Some("alice"));
        assert_eq!(request.groups(), ["a", "b"]);
    }

    #[test]
    fn test_wrong_top_level_kind() {
        let mut payload = review(base_request());
        payload["kind"] = json!("DeploymentList");
        assert!(matches!(
            parse_review(&payload),
            Err(ParseError::NotAdmissionReview)
        ));
        payload.as_object_mut().unwrap().remove("kind");
        assert!(parse_review(&payload).is_err());
    }

    #[test]
    fn test_missing_request_keys() {
        for key in ["kind", "resource", "operation", "object", "userInfo"] {
            let mut request = base_request();
            request.as_object_mut().unwrap().remove(key);
            assert!(
                parse_review(&review(request)).is_err(),
                "missing {key} should be invalid"
            );
        }
    }

    #[test]
    fn test_null_object_is_tolerated() {
        // DELETE requests carry object: null and the prior state in oldObject
        let mut request = base_request();
        request["operation"] = json!("DELETE");
        request["object"] = Value::Null;
        request["oldObject"] =
            json!({ "kind": "Group", "metadata": { "name": "old-group" } });
        let parsed = parse_review(&review(request)).unwrap();
        assert!(parsed.object.is_none());
        assert_eq!(parsed.target_name(), Some("old-group"));
    }

    #[test]
    fn test_groups_must_be_a_sequence() {
        let mut request = base_request();
        request["userInfo"]["groups"] = json!("not-a-list");
        assert!(matches!(
            parse_review(&review(request)),
            Err(ParseError::WrongType(_))
        ));
    }

    #[test]
    fn test_username_must_be_a_string() {
        let mut request = base_request();
        request["userInfo"]["username"] = json!(42);
        assert!(parse_review(&review(request)).is_err());
    }

    #[test]
    fn test_subscription_fields_deserialize() {
        let mut request = base_request();
        request["object"] = json!({
            "kind": "Subscription",
            "metadata": { "name": "my-sub" },
            "spec": { "sourceNamespace": "openshift-marketplace", "channel": "stable" }
        });
        let parsed = parse_review(&review(request)).unwrap();
        let object = parsed.object.unwrap();
        assert_eq!(
            object.spec.source_namespace.as_deref(),
            Some("openshift-marketplace")
        );
    }
}
