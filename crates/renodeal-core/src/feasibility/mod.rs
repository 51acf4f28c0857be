pub mod costs;
pub mod engine;
pub mod inputs;
pub mod profitability;
pub mod repository;
pub mod results;
pub mod schedule;
pub mod simulation;
pub mod waterfall;

pub use inputs::{resolve, DealInputs, DealInputsDraft, PropertyProfile};
pub use repository::{recalculate, DealId, DealRecord, DealRepositoryTrait, InMemoryDealRepository};
pub use results::DealResults;
pub use schedule::{generate_quarters, QuarterPeriod};
pub use simulation::simulate;
