//! ROI modeling for HEDIS measures.
//!
//! Turns intervention aggregates into revenue, quality bonus, cost breakdown
//! and net ROI figures with Wilson confidence bounds, scores investments under
//! three reporting methodologies, runs what-if sensitivity scenarios and
//! renders the CFO justification report.

pub mod calculator;
pub mod models;
pub mod report;

pub use calculator::{recommend_roi_method, RoiCalculator};
pub use models::*;
pub use report::{render_cfo_report, write_cfo_report};
