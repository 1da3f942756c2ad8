//! Shared types for the HEDIS decision-support engine.
//!
//! Every calculator crate depends on this one for the aggregate rows it
//! consumes, the `DataProvider` seam, typed configuration and the small
//! statistics toolkit (Wilson interval, least-squares trend).

pub mod config;
pub mod error;
pub mod format;
pub mod memory;
pub mod stats;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use memory::InMemoryProvider;
pub use traits::*;
pub use types::*;
