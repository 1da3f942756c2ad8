//! Budget-constrained intervention portfolio selection.
//!
//! Scores each candidate intervention (closures, star bonus, ROI, confidence)
//! and fills a budget under three strategies. Selection is a greedy
//! heuristic behind [`BudgetSelector`]; it does not guarantee the optimal
//! knapsack packing.

pub mod catalog;
pub mod models;
pub mod optimizer;
pub mod selector;

pub use catalog::default_interventions;
pub use models::*;
pub use optimizer::PortfolioOptimizer;
pub use selector::{BudgetSelector, GreedySelector};
