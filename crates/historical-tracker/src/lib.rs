//! Historical Performance Tracker
//!
//! Monthly trend aggregation, seasonality detection, a linear-trend quarterly
//! forecast and on-track / at-risk status classification per measure.

pub mod models;
pub mod tracker;

pub use models::*;
pub use tracker::HistoricalTracker;
