use crate::cache::{CacheStatus, PermissionCache};
use crate::error::{Error, Result, SharedSourceError};
use crate::permission::{EffectivePermission, permission_matches, resource_matches};
use crate::source::PermissionSource;
use crate::types::ScopeId;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

type FetchOutcome = std::result::Result<Arc<[EffectivePermission]>, SharedSourceError>;
type Flight = Shared<BoxFuture<'static, FetchOutcome>>;

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Permission is granted.
    Allow,
    /// Permission is denied.
    Deny,
}

/// Session-scoped permission evaluator.
///
/// Holds the effective permissions of the current actor and answers
/// authorization queries from that cache alone. Queries never touch the
/// source and never fail: anything short of a loaded cache with a matching
/// allow and no matching deny is a denial.
///
/// One evaluator belongs to one session. Share it with `Arc` and drop it (or
/// call [`Evaluator::clear`]) when the session ends.
pub struct Evaluator<S> {
    source: Arc<S>,
    state: RwLock<State>,
    enable_wildcard: bool,
    permission_normalize: bool,
}

struct State {
    cache: Arc<PermissionCache>,
    in_flight: Option<InFlight>,
    next_flight: u64,
    last_error: Option<SharedSourceError>,
}

struct InFlight {
    id: u64,
    scope: Option<ScopeId>,
    future: Flight,
    waiters: usize,
}

/// Registration of one caller awaiting a flight.
///
/// When the last registered caller goes away before the flight settles, the
/// flight is abandoned and the cache returns to empty, so the next `load`
/// fetches again.
struct Waiter<'a, S> {
    evaluator: &'a Evaluator<S>,
    id: u64,
}

impl<S> Drop for Waiter<'_, S> {
    fn drop(&mut self) {
        let Ok(mut state) = self.evaluator.state.write() else {
            return;
        };
        let abandoned = match state.in_flight.as_mut() {
            Some(in_flight) if in_flight.id == self.id => {
                in_flight.waiters = in_flight.waiters.saturating_sub(1);
                in_flight.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            state.in_flight = None;
            state.cache = Arc::new(PermissionCache::empty());
            debug!(flight = self.id, "permission load abandoned by every caller");
        }
    }
}

impl<S> fmt::Debug for Evaluator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Evaluator");
        match self.state.read() {
            Ok(state) => debug
                .field("cache", &state.cache)
                .field("in_flight", &state.in_flight.as_ref().map(|flight| flight.id)),
            Err(_) => debug.field("cache", &"<poisoned>"),
        };
        debug
            .field("enable_wildcard", &self.enable_wildcard)
            .field("permission_normalize", &self.permission_normalize)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Evaluator`].
pub struct EvaluatorBuilder<S> {
    source: S,
    enable_wildcard: bool,
    permission_normalize: bool,
}

impl<S> EvaluatorBuilder<S> {
    /// Creates a new builder with default configuration.
    pub fn new(source: S) -> Self {
        Self {
            source,
            enable_wildcard: true,
            permission_normalize: false,
        }
    }

    /// Enables or disables `*` matching in grants. Enabled by default.
    pub fn enable_wildcard(mut self, on: bool) -> Self {
        self.enable_wildcard = on;
        self
    }

    /// Enables or disables case-insensitive matching. Disabled by default.
    pub fn permission_normalize(mut self, on: bool) -> Self {
        self.permission_normalize = on;
        self
    }

    /// Builds an evaluator with an empty cache.
    pub fn build(self) -> Evaluator<S> {
        Evaluator {
            source: Arc::new(self.source),
            state: RwLock::new(State {
                cache: Arc::new(PermissionCache::empty()),
                in_flight: None,
                next_flight: 0,
                last_error: None,
            }),
            enable_wildcard: self.enable_wildcard,
            permission_normalize: self.permission_normalize,
        }
    }
}

impl<S> Evaluator<S>
where
    S: PermissionSource + 'static,
{
    /// Ensures the cache holds the permissions for `scope`.
    ///
    /// Returns immediately when the cache is already loaded for the same
    /// scope. When a load is in flight the call joins it instead of issuing a
    /// second request, whatever scope that flight was started for. On failure
    /// the cache is emptied and the error is both returned and kept for
    /// [`Evaluator::last_error`].
    ///
    /// Dropping the returned future (for example on a caller-side timeout)
    /// abandons the load once no other caller is waiting on it: the cache
    /// goes back to empty and the next `load` fetches again.
    pub async fn load(&self, scope: Option<ScopeId>) -> Result<()> {
        let (waiter, flight) = {
            let mut state = self.write_state();
            if let Some(in_flight) = state.in_flight.as_mut() {
                debug!(
                    flight = in_flight.id,
                    requested = ?scope,
                    pending = ?in_flight.scope,
                    "joining in-flight permission load"
                );
                in_flight.waiters += 1;
                let waiter = Waiter {
                    evaluator: self,
                    id: in_flight.id,
                };
                (waiter, in_flight.future.clone())
            } else if state.cache.is_loaded_for(scope.as_ref()) {
                return Ok(());
            } else {
                self.start_flight(&mut state, scope)
            }
        };
        let outcome = flight.await;
        self.settle(waiter.id, outcome)
    }

    /// Discards the cache and any pending load, then fetches `scope` afresh.
    pub async fn reload(&self, scope: Option<ScopeId>) -> Result<()> {
        let (waiter, flight) = {
            let mut state = self.write_state();
            state.in_flight = None;
            state.cache = Arc::new(PermissionCache::empty());
            self.start_flight(&mut state, scope)
        };
        let outcome = flight.await;
        self.settle(waiter.id, outcome)
    }

    /// Clears the cache and loads the permissions of another tenant or store.
    pub async fn switch_scope(&self, scope: Option<ScopeId>) -> Result<()> {
        self.clear();
        self.load(scope).await
    }

    fn start_flight<'a>(
        &'a self,
        state: &mut State,
        scope: Option<ScopeId>,
    ) -> (Waiter<'a, S>, Flight) {
        let id = state.next_flight;
        state.next_flight = state.next_flight.wrapping_add(1);

        let source = Arc::clone(&self.source);
        let fetch_scope = scope.clone();
        let fetch: BoxFuture<'static, FetchOutcome> = async move {
            let outcome: FetchOutcome =
                match source.effective_permissions(fetch_scope.as_ref()).await {
                    Ok(entries) => Ok(Arc::from(entries)),
                    Err(error) => Err(SharedSourceError::from(error)),
                };
            outcome
        }
        .boxed();
        let future = fetch.shared();

        debug!(flight = id, scope = ?scope, "loading effective permissions");
        state.cache = Arc::new(PermissionCache::loading(scope.clone()));
        state.in_flight = Some(InFlight {
            id,
            scope,
            future: future.clone(),
            waiters: 1,
        });
        (Waiter { evaluator: self, id }, future)
    }

    fn settle(&self, id: u64, outcome: FetchOutcome) -> Result<()> {
        let mut state = self.write_state();
        let current = state
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.id == id);

        if current && let Some(in_flight) = state.in_flight.take() {
            match &outcome {
                Ok(entries) => {
                    debug!(
                        flight = id,
                        scope = ?in_flight.scope,
                        entries = entries.len(),
                        "effective permissions loaded"
                    );
                    state.cache = Arc::new(PermissionCache::loaded(
                        in_flight.scope,
                        Arc::clone(entries),
                    ));
                    state.last_error = None;
                }
                Err(error) => {
                    warn!(
                        flight = id,
                        scope = ?in_flight.scope,
                        error = %error,
                        "failed to load effective permissions"
                    );
                    state.cache = Arc::new(PermissionCache::empty());
                    state.last_error = Some(Arc::clone(error));
                }
            }
        } else {
            debug!(flight = id, "permission load already settled or superseded");
        }

        outcome.map(|_| ()).map_err(Error::from)
    }
}

impl<S> Evaluator<S> {
    /// Drops every cached entry, the scope, any pending load and the last
    /// recorded error. Called on logout.
    pub fn clear(&self) {
        let mut state = self.write_state();
        state.cache = Arc::new(PermissionCache::empty());
        state.in_flight = None;
        state.last_error = None;
        debug!("permission cache cleared");
    }

    /// Returns whether `action` on `resource` is permitted.
    ///
    /// A matching deny always wins over a matching allow, including a
    /// wildcard deny against an exact allow. Blank queries are denied.
    pub fn check(&self, resource: &str, action: &str) -> bool {
        let cache = self.snapshot();
        self.check_in(&cache, resource, action)
    }

    /// Returns whether at least one of `actions` is permitted on `resource`.
    pub fn check_any<A: AsRef<str>>(&self, resource: &str, actions: &[A]) -> bool {
        let cache = self.snapshot();
        actions
            .iter()
            .any(|action| self.check_in(&cache, resource, action.as_ref()))
    }

    /// Returns whether every one of `actions` is permitted on `resource`.
    pub fn check_all<A: AsRef<str>>(&self, resource: &str, actions: &[A]) -> bool {
        let cache = self.snapshot();
        cache.is_loaded()
            && actions
                .iter()
                .all(|action| self.check_in(&cache, resource, action.as_ref()))
    }

    /// [`Evaluator::check`] expressed as a [`Decision`].
    pub fn decide(&self, resource: &str, action: &str) -> Decision {
        if self.check(resource, action) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Raw cached entries for `resource`, including `*` grants, without
    /// resolving deny against allow.
    pub fn permissions_for(&self, resource: &str) -> Vec<EffectivePermission> {
        let cache = self.snapshot();
        if !cache.is_loaded() {
            return Vec::new();
        }
        cache
            .entries()
            .iter()
            .filter(|granted| {
                resource_matches(
                    granted,
                    resource,
                    self.enable_wildcard,
                    self.permission_normalize,
                )
            })
            .cloned()
            .collect()
    }

    /// Current cache snapshot.
    pub fn snapshot(&self) -> Arc<PermissionCache> {
        Arc::clone(&self.read_state().cache)
    }

    /// All cached entries.
    pub fn permissions(&self) -> Vec<EffectivePermission> {
        self.snapshot().entries().to_vec()
    }

    /// Lifecycle status of the current cache.
    pub fn status(&self) -> CacheStatus {
        self.snapshot().status()
    }

    /// Scope of the loaded (or loading) permission set.
    pub fn scope(&self) -> Option<ScopeId> {
        self.snapshot().scope().cloned()
    }

    /// Returns `true` while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.read_state().in_flight.is_some()
    }

    /// Returns `true` once a load has landed and not been cleared since.
    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_loaded()
    }

    /// Error of the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<SharedSourceError> {
        self.read_state().last_error.clone()
    }

    fn check_in(&self, cache: &PermissionCache, resource: &str, action: &str) -> bool {
        if !cache.is_loaded() {
            return false;
        }
        if resource.trim().is_empty() || action.trim().is_empty() {
            debug!(resource, action, "rejecting permission query with a blank segment");
            return false;
        }

        let matches = |granted: &EffectivePermission| {
            permission_matches(
                granted,
                resource,
                action,
                self.enable_wildcard,
                self.permission_normalize,
            )
        };
        if cache
            .entries()
            .iter()
            .any(|granted| granted.is_deny() && matches(granted))
        {
            return false;
        }
        cache
            .entries()
            .iter()
            .any(|granted| !granted.is_deny() && matches(granted))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().expect("poisoned lock")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().expect("poisoned lock")
    }
}
