//! SQLite-backed intervention data plus a caller-owned TTL cache.
//!
//! [`InterventionStore`] records interventions and materializes an immutable
//! [`quality_core::InMemoryProvider`] snapshot for the synchronous engine.
//! [`CachedProvider`] memoizes aggregate queries through a shared [`TtlCache`].

pub mod cache;
pub mod db;
pub mod models;
pub mod provider;
pub mod store;

pub use cache::TtlCache;
pub use db::QualityDb;
pub use models::*;
pub use provider::{AggregateCache, CachedProvider};
pub use store::InterventionStore;
