//! Axum integration utilities.
//!
//! Session middleware upstream of these layers is expected to insert the
//! session's `Arc<Evaluator<S>>` into request extensions.

use std::future::poll_fn;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::evaluator::Evaluator;
use crate::guard::Guard;

use ::axum::body::Body;
use ::axum::http::{Request, StatusCode};
use ::axum::response::{IntoResponse, Response};
use ::tower::{Layer, Service};

/// Middleware layer that rejects requests whose session fails a [`Guard`].
pub struct RequirePermissionLayer<S> {
    guard: Guard,
    _source: PhantomData<fn() -> S>,
}

impl<S> RequirePermissionLayer<S> {
    /// Creates a layer requiring `action` on `resource`.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::from_guard(Guard::new(resource, action))
    }

    /// Creates a layer enforcing an existing guard.
    pub fn from_guard(guard: Guard) -> Self {
        Self {
            guard,
            _source: PhantomData,
        }
    }
}

impl<S> Clone for RequirePermissionLayer<S> {
    fn clone(&self) -> Self {
        Self::from_guard(self.guard.clone())
    }
}

impl<S> std::fmt::Debug for RequirePermissionLayer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirePermissionLayer")
            .field("guard", &self.guard)
            .finish()
    }
}

impl<S, Inner> Layer<Inner> for RequirePermissionLayer<S> {
    type Service = RequirePermissionService<Inner, S>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RequirePermissionService {
            inner,
            guard: self.guard.clone(),
            _source: PhantomData,
        }
    }
}

/// Middleware service that enforces a [`Guard`].
pub struct RequirePermissionService<Inner, S> {
    inner: Inner,
    guard: Guard,
    _source: PhantomData<fn() -> S>,
}

impl<Inner: Clone, S> Clone for RequirePermissionService<Inner, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            guard: self.guard.clone(),
            _source: PhantomData,
        }
    }
}

impl<Inner, S> Service<Request<Body>> for RequirePermissionService<Inner, S>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    S: Send + Sync + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let evaluator = req.extensions().get::<Arc<Evaluator<S>>>().cloned();
        let allowed = evaluator.map(|evaluator| self.guard.allows::<S>(&evaluator));
        let guard = self.guard.clone();

        Box::pin(async move {
            match allowed {
                None => Ok((StatusCode::UNAUTHORIZED, "missing session permissions").into_response()),
                Some(true) => {
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                Some(false) => {
                    tracing::debug!(
                        resource = guard.resource(),
                        action = guard.action(),
                        "request denied by permission guard"
                    );
                    Ok((StatusCode::FORBIDDEN, "forbidden").into_response())
                }
            }
        })
    }
}
