//! Budget and staffing what-if modeling.
//!
//! Projects interventions, closures and ROI for a budget/FTE/strategy input
//! against a baseline drawn from historical aggregates, and explores the
//! budget x staffing space with a Pareto frontier and a grid search.

pub mod modeler;
pub mod models;
pub mod pareto;

pub use modeler::ScenarioModeler;
pub use models::*;
pub use pareto::pareto_front;
