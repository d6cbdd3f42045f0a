mod engine;
mod search;
mod types;

pub use engine::{calculate_year, run_projection};
pub use search::find_retirement_age;
pub use types::{Capital, DEPLETED_MARKER, Params, Projection, RetirementMode, YearRecord};
