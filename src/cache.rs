use crate::permission::EffectivePermission;
use crate::types::ScopeId;
use std::sync::Arc;

/// Lifecycle status of a [`PermissionCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing loaded; every query is denied.
    Empty,
    /// A load is in flight; every query is denied until it lands.
    Loading,
    /// Entries reflect the source for [`PermissionCache::scope`].
    Loaded,
}

/// Immutable snapshot of the session's effective permissions.
///
/// The evaluator never mutates a snapshot in place. Every state change swaps
/// in a new `Arc<PermissionCache>`, so a reader holding one always sees a
/// complete entry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCache {
    entries: Arc<[EffectivePermission]>,
    scope: Option<ScopeId>,
    status: CacheStatus,
}

impl PermissionCache {
    pub(crate) fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            scope: None,
            status: CacheStatus::Empty,
        }
    }

    pub(crate) fn loading(scope: Option<ScopeId>) -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            scope,
            status: CacheStatus::Loading,
        }
    }

    pub(crate) fn loaded(scope: Option<ScopeId>, entries: Arc<[EffectivePermission]>) -> Self {
        Self {
            entries,
            scope,
            status: CacheStatus::Loaded,
        }
    }

    /// Cached entries. Order carries no meaning.
    pub fn entries(&self) -> &[EffectivePermission] {
        &self.entries
    }

    /// Scope the entries were loaded (or are loading) for.
    pub fn scope(&self) -> Option<&ScopeId> {
        self.scope.as_ref()
    }

    /// Lifecycle status of this snapshot.
    pub fn status(&self) -> CacheStatus {
        self.status
    }

    /// Returns `true` once entries reflect a successful load.
    pub fn is_loaded(&self) -> bool {
        self.status == CacheStatus::Loaded
    }

    pub(crate) fn is_loaded_for(&self, scope: Option<&ScopeId>) -> bool {
        self.is_loaded() && self.scope.as_ref() == scope
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::empty()
    }
}
