//! Webhook configuration.
//!
//! All policy knobs are read from the environment exactly once at startup and
//! shared immutably between handlers. Changing a setting requires a re-deploy;
//! evaluators never read ambient state directly.

use regex::Regex;
use thiserror::Error;

/// Default admin groups exempt from the protected-resource policies.
const DEFAULT_ADMIN_GROUPS: &str = "osd-sre-admins,osd-sre-cluster-admins";

/// Default pattern for group names that only admins may manage.
const DEFAULT_PROTECTED_GROUP_REGEX: &str =
    r"(^osd-sre.*|^dedicated-admins$|^cluster-admins$|^layered-cs-sre-admins$)";

/// Default exclusive prefixes: a protected group starting with one of these may
/// only be managed by a requester who is also in a group with that prefix.
const DEFAULT_EXCLUSIVE_PREFIXES: &str = "osd-sre";

/// Default identity provider whose identities are reserved for admins.
const DEFAULT_IDENTITY_PROVIDER: &str = "OpenShift_SRE";

/// Default source namespaces Subscriptions may target.
const DEFAULT_SOURCE_NAMESPACES: &str = "openshift-marketplace";

/// Errors raised while building the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The protected-group pattern did not compile
    #[error("invalid protected group regex {pattern:?}: {source}")]
    BadRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// Per-route debug flags. When set, the raw request body for that route is
/// logged; decisions are never affected.
#[derive(Debug, Default, Clone)]
pub struct DebugFlags {
    pub group: bool,
    pub namespace: bool,
    pub identity: bool,
    pub user: bool,
    pub subscription: bool,
    pub regular_user: bool,
}

/// Immutable policy configuration, constructed once in `main` and injected
/// into every evaluator.
#[derive(Debug, Clone)]
pub struct Config {
    /// Groups whose members may manage protected resources
    pub admin_groups: Vec<String>,
    /// Group names reserved for admin management
    pub protected_group_regex: Regex,
    /// Prefixes requiring same-prefix group membership (first match wins)
    pub exclusive_group_prefixes: Vec<String>,
    /// Identity provider whose identities are protected
    pub identity_provider: String,
    /// Source namespaces a Subscription may target
    pub valid_source_namespaces: Vec<String>,
    /// Per-route request body logging
    pub debug: DebugFlags,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Tests supply a
    /// closure over a map instead of mutating the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_groups = split_list(
            &get("GROUP_VALIDATION_ADMIN_GROUP").unwrap_or_else(|| DEFAULT_ADMIN_GROUPS.into()),
        );

        let pattern = get("GROUP_VALIDATION_PROTECTED_GROUP_REGEX")
            .unwrap_or_else(|| DEFAULT_PROTECTED_GROUP_REGEX.into());
        let protected_group_regex = Regex::new(&pattern).map_err(|source| ConfigError::BadRegex {
            pattern: pattern.clone(),
            source,
        })?;

        let exclusive_group_prefixes = split_list(
            &get("GROUP_VALIDATION_PREFIXES").unwrap_or_else(|| DEFAULT_EXCLUSIVE_PREFIXES.into()),
        );

        let identity_provider =
            get("IDENTITY_PROVIDER").unwrap_or_else(|| DEFAULT_IDENTITY_PROVIDER.into());

        let valid_source_namespaces = split_list(
            &get("SUBSCRIPTION_VALIDATION_NAMESPACES")
                .unwrap_or_else(|| DEFAULT_SOURCE_NAMESPACES.into()),
        );

        let flag = |key: &str| get(key).as_deref() == Some("True");
        let debug = DebugFlags {
            group: flag("DEBUG_GROUP_VALIDATION"),
            namespace: flag("DEBUG_NAMESPACE_VALIDATION"),
            identity: flag("DEBUG_IDENTITY_VALIDATION"),
            user: flag("DEBUG_USER_VALIDATION"),
            subscription: flag("DEBUG_SUBSCRIPTION_VALIDATION"),
            regular_user: flag("DEBUG_REGULAR_USER_VALIDATION"),
        };

        Ok(Self {
            admin_groups,
            protected_group_regex,
            exclusive_group_prefixes,
            identity_provider,
            valid_source_namespaces,
            debug,
        })
    }

    /// Check whether any of the requester's groups is an admin group
    pub fn is_admin_member(&self, groups: &[String]) -> bool {
        groups.iter().any(|g| self.admin_groups.contains(g))
    }
}

/// Split a comma-separated list, dropping empty entries
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
