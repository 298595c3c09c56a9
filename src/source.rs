use crate::error::SourceError;
use crate::permission::EffectivePermission;
use crate::types::ScopeId;
use async_trait::async_trait;
use std::sync::Arc;

/// Remote collaborator that resolves the actor's effective permissions.
///
/// Implementations typically call the backend on behalf of the signed-in
/// actor. Any failure (network, authentication, non-success status) is
/// reported as a [`SourceError`] and surfaces as
/// [`Error::SourceUnavailable`](crate::Error::SourceUnavailable).
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Returns the effective permissions for `scope`, or the global set when
    /// `scope` is `None`.
    async fn effective_permissions(
        &self,
        scope: Option<&ScopeId>,
    ) -> std::result::Result<Vec<EffectivePermission>, SourceError>;
}

#[async_trait]
impl<T> PermissionSource for Arc<T>
where
    T: PermissionSource + ?Sized,
{
    async fn effective_permissions(
        &self,
        scope: Option<&ScopeId>,
    ) -> std::result::Result<Vec<EffectivePermission>, SourceError> {
        (**self).effective_permissions(scope).await
    }
}
