//! Threshold-based alerting over HEDIS intervention data.
//!
//! Four independent checks (star rating risk, opportunity, deadline,
//! performance anomaly) produce [`AlertDraft`]s. [`AlertSystem`] runs the
//! enabled checks, orders the results by priority and records them in an
//! append-only history addressed by [`AlertId`].

pub mod checks;
pub mod demo;
pub mod history;
pub mod models;
pub mod system;

pub use history::AlertHistory;
pub use models::*;
pub use system::AlertSystem;
