use crate::error::{Error, Result};
use std::fmt;

pub(crate) const MAX_NAME_LEN: usize = 128;

fn validate_simple_name(value: &str, kind: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidId(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(Error::InvalidId(format!(
            "{kind} length must be <= {MAX_NAME_LEN}"
        )));
    }
    if !trimmed.chars().all(is_allowed_name_char) {
        return Err(Error::InvalidId(format!(
            "{kind} contains invalid characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_allowed_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-')
}

/// Tenant or store identifier a permission set is loaded for.
///
/// `None` in an `Option<ScopeId>` position means the global, cross-tenant
/// scope.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a validated scope identifier.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        validate_simple_name(value.as_ref(), "scope id").map(Self)
    }

    /// Creates a scope identifier from a trusted string without validation.
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ScopeId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

// Numeric store ids are always valid.
impl From<u64> for ScopeId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeId;

    #[test]
    fn scope_id_should_trim_input() {
        let scope = ScopeId::try_from("  store_42 ").expect("scope id");
        assert_eq!(scope.as_str(), "store_42");
    }

    #[test]
    fn scope_id_should_reject_empty_value() {
        let err = ScopeId::try_from("   ").expect_err("must reject");
        assert!(err.to_string().contains("scope id"));
    }

    #[test]
    fn scope_id_should_reject_invalid_chars() {
        let err = ScopeId::try_from("store 42").expect_err("must reject");
        assert!(err.to_string().contains("invalid characters"));
    }

    #[test]
    fn numeric_store_id_converts_to_scope() {
        assert_eq!(ScopeId::from(7u64).as_str(), "7");
    }
}
