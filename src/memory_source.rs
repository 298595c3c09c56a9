use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use async_trait::async_trait;
use crate::error::SourceError;
use crate::permission::EffectivePermission;
use crate::source::PermissionSource;
use crate::types::ScopeId;

/// In-memory permission source for tests and demos.
///
/// Clones share state, so a test can keep a handle after handing a clone to
/// an evaluator.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    permissions: RwLock<HashMap<Option<ScopeId>, Vec<EffectivePermission>>>,
    unavailable: AtomicBool,
    fetches: AtomicUsize,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission to the set returned for `scope`.
    pub fn add_permission(&self, scope: Option<ScopeId>, permission: EffectivePermission) {
        let mut guard = self.inner.permissions.write().expect("poisoned lock");
        guard.entry(scope).or_default().push(permission);
    }

    /// Replaces the set returned for `scope`.
    pub fn set_permissions(&self, scope: Option<ScopeId>, permissions: Vec<EffectivePermission>) {
        let mut guard = self.inner.permissions.write().expect("poisoned lock");
        guard.insert(scope, permissions);
    }

    /// Makes every subsequent fetch fail while `unavailable` is true.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of fetches served or refused so far.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionSource for MemorySource {
    async fn effective_permissions(
        &self,
        scope: Option<&ScopeId>,
    ) -> std::result::Result<Vec<EffectivePermission>, SourceError> {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err("memory source marked unavailable".into());
        }
        let guard = self.inner.permissions.read().expect("poisoned lock");
        Ok(guard.get(&scope.cloned()).cloned().unwrap_or_default())
    }
}
