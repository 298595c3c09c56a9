use crate::error::{Error, Result};
use crate::types::MAX_NAME_LEN;
use std::borrow::Cow;
use std::fmt;

/// Wildcard segment matching any resource or any action.
pub const WILDCARD: &str = "*";

/// Effect of an effective permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Effect {
    /// Grants the action.
    #[cfg_attr(feature = "serde", serde(alias = "ALLOW"))]
    Allow,
    /// Forbids the action; overrides any matching allow.
    #[cfg_attr(feature = "serde", serde(alias = "DENY"))]
    Deny,
}

/// Where an effective permission was resolved from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GrantSource {
    /// An access policy.
    Policy,
    /// A role template assigned to the actor.
    RoleTemplate,
}

/// A flattened `(resource, action, effect)` grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EffectivePermission {
    resource: String,
    action: String,
    effect: Effect,
    source: GrantSource,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    policy_id: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    role_template_id: Option<u64>,
}

impl EffectivePermission {
    /// Creates a validated effective permission.
    ///
    /// Segments are trimmed. Each must be either `*` or a non-empty run of
    /// ASCII alphanumerics, `_`, `-`, `.` and `:`.
    pub fn new(
        resource: impl AsRef<str>,
        action: impl AsRef<str>,
        effect: Effect,
        source: GrantSource,
    ) -> Result<Self> {
        let resource = validate_segment(resource.as_ref(), "resource")?;
        let action = validate_segment(action.as_ref(), "action")?;
        Ok(Self::from_parts(resource, action, effect, source))
    }

    /// Shorthand for a policy-sourced allow.
    pub fn allow(resource: impl AsRef<str>, action: impl AsRef<str>) -> Result<Self> {
        Self::new(resource, action, Effect::Allow, GrantSource::Policy)
    }

    /// Shorthand for a policy-sourced deny.
    pub fn deny(resource: impl AsRef<str>, action: impl AsRef<str>) -> Result<Self> {
        Self::new(resource, action, Effect::Deny, GrantSource::Policy)
    }

    /// Creates a permission from trusted parts without validation.
    pub fn from_parts(
        resource: String,
        action: String,
        effect: Effect,
        source: GrantSource,
    ) -> Self {
        Self {
            resource,
            action,
            effect,
            source,
            policy_id: None,
            role_template_id: None,
        }
    }

    /// Attaches the id of the policy this grant came from.
    pub fn with_policy_id(mut self, id: u64) -> Self {
        self.policy_id = Some(id);
        self
    }

    /// Attaches the id of the role template this grant came from.
    pub fn with_role_template_id(mut self, id: u64) -> Self {
        self.role_template_id = Some(id);
        self
    }

    /// Resource segment, e.g. `product` or `*`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Action segment, e.g. `create` or `*`.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether this grant allows or denies.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Where the grant was resolved from.
    pub fn source(&self) -> GrantSource {
        self.source
    }

    /// Id of the originating policy, if known.
    pub fn policy_id(&self) -> Option<u64> {
        self.policy_id
    }

    /// Id of the originating role template, if known.
    pub fn role_template_id(&self) -> Option<u64> {
        self.role_template_id
    }

    /// Returns `true` for deny grants.
    pub fn is_deny(&self) -> bool {
        self.effect == Effect::Deny
    }
}

impl fmt::Display for EffectivePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = match self.effect {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        };
        write!(f, "{}:{} ({effect})", self.resource, self.action)
    }
}

fn validate_segment(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPermission(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(Error::InvalidPermission(format!(
            "{kind} length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !is_valid_segment(trimmed) {
        return Err(Error::InvalidPermission(format!(
            "{kind} segment contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_valid_segment(segment: &str) -> bool {
    if segment == WILDCARD {
        return true;
    }
    segment
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':'))
}

fn normalize_for_match(value: &str, normalize: bool) -> Cow<'_, str> {
    if normalize {
        Cow::Owned(value.to_ascii_lowercase())
    } else {
        Cow::Borrowed(value)
    }
}

fn segment_matches(granted: &str, required: &str, enable_wildcard: bool, normalize: bool) -> bool {
    if enable_wildcard && granted == WILDCARD {
        return true;
    }
    normalize_for_match(granted, normalize) == normalize_for_match(required, normalize)
}

/// Matches a grant against a queried `(resource, action)` pair.
///
/// `*` in either segment of the grant stands for any value when wildcards are
/// enabled. With wildcards disabled a wildcard grant matches nothing, not even
/// a literal `*` query.
pub(crate) fn permission_matches(
    granted: &EffectivePermission,
    resource: &str,
    action: &str,
    enable_wildcard: bool,
    normalize: bool,
) -> bool {
    if !enable_wildcard && (granted.resource == WILDCARD || granted.action == WILDCARD) {
        return false;
    }
    segment_matches(&granted.resource, resource, enable_wildcard, normalize)
        && segment_matches(&granted.action, action, enable_wildcard, normalize)
}

pub(crate) fn resource_matches(
    granted: &EffectivePermission,
    resource: &str,
    enable_wildcard: bool,
    normalize: bool,
) -> bool {
    if !enable_wildcard && granted.resource == WILDCARD {
        return false;
    }
    segment_matches(&granted.resource, resource, enable_wildcard, normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(resource: &str, action: &str) -> EffectivePermission {
        EffectivePermission::allow(resource, action).unwrap()
    }

    #[test]
    fn new_should_trim_segments() {
        let permission = allow(" product ", " create");
        assert_eq!(permission.resource(), "product");
        assert_eq!(permission.action(), "create");
    }

    #[test]
    fn new_should_reject_empty_segments() {
        let result = EffectivePermission::allow("", "read");
        assert!(matches!(result, Err(Error::InvalidPermission(_))));
        let result = EffectivePermission::deny("order", "  ");
        assert!(matches!(result, Err(Error::InvalidPermission(_))));
    }

    #[test]
    fn new_should_reject_partial_wildcards() {
        let result = EffectivePermission::allow("prod*", "read");
        assert!(matches!(result, Err(Error::InvalidPermission(_))));
    }

    #[test]
    fn wildcard_grant_should_match_any_segment() {
        let granted = allow("*", "delete");
        assert!(permission_matches(&granted, "product", "delete", true, false));
        assert!(permission_matches(&granted, "order", "delete", true, false));
        assert!(!permission_matches(&granted, "order", "create", true, false));
    }

    #[test]
    fn match_should_be_case_sensitive_unless_normalized() {
        let granted = allow("product", "create");
        assert!(!permission_matches(&granted, "Product", "create", true, false));
        assert!(permission_matches(&granted, "Product", "CREATE", true, true));
    }

    #[test]
    fn permission_match_should_ignore_wildcard_grant_when_disabled() {
        let granted = allow("product", "*");
        assert!(!permission_matches(&granted, "product", "read", false, false));
        assert!(!permission_matches(&granted, "product", "*", false, false));
    }

    #[test]
    fn resource_match_should_ignore_wildcard_grant_when_disabled() {
        let granted = allow("*", "read");
        assert!(resource_matches(&granted, "invoice", true, false));
        assert!(!resource_matches(&granted, "invoice", false, false));
    }

    #[test]
    fn display_should_include_effect() {
        let denied = EffectivePermission::deny("order", "refund").unwrap();
        assert_eq!(denied.to_string(), "order:refund (deny)");
    }
}
