pub mod executor;
pub mod filter;
pub mod matcher;
pub mod params;
pub mod planner;
pub mod stopwords;

pub use executor::{QueryBudget, QueryExecutor};
pub use filter::{FieldFilter, MatchValue};
pub use params::RawParams;
pub use planner::{FreeText, PageSpec, PlannerLimits, QueryPlan, QueryPlanner};
