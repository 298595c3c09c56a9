//! Session-scoped ABAC permission evaluator.
//!
//! An [`Evaluator`] caches the effective permissions of the signed-in actor,
//! optionally for one tenant or store, and answers `(resource, action)`
//! queries from that cache. A matching deny always beats a matching allow and
//! `*` matches any resource or action. Queries are synchronous and fail
//! closed: until a load succeeds every check is denied.
//!
//! # Examples
//!
//! Loading and querying with the in-memory source (enable `memory-source`):
//! ```no_run
//! use rs_permissions::{EffectivePermission, EvaluatorBuilder, ScopeId};
//! # #[cfg(feature = "memory-source")]
//! # {
//! use rs_permissions::MemorySource;
//! let source = MemorySource::new();
//! let store = ScopeId::try_from("store_1").unwrap();
//! source.add_permission(Some(store.clone()), EffectivePermission::allow("product", "*").unwrap());
//! source.add_permission(Some(store.clone()), EffectivePermission::deny("product", "delete").unwrap());
//!
//! let evaluator = EvaluatorBuilder::new(source).build();
//! futures::executor::block_on(evaluator.load(Some(store))).unwrap();
//! assert!(evaluator.check("product", "update"));
//! assert!(!evaluator.check("product", "delete"));
//! # }
//! ```
#![forbid(unsafe_code)]

mod cache;
mod error;
mod evaluator;
mod guard;
mod permission;
mod shortcuts;
mod source;
mod types;

#[cfg(feature = "memory-source")]
mod memory_source;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::cache::{CacheStatus, PermissionCache};
pub use crate::error::{Error, Result, SharedSourceError, SourceError};
pub use crate::evaluator::{Decision, Evaluator, EvaluatorBuilder};
pub use crate::guard::{Affordance, Guard};
pub use crate::permission::{EffectivePermission, Effect, GrantSource, WILDCARD};
pub use crate::source::PermissionSource;
pub use crate::types::ScopeId;

#[cfg(feature = "memory-source")]
pub use crate::memory_source::MemorySource;
