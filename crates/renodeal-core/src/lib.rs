pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "feasibility")]
pub mod feasibility;

pub use error::RenoDealError;
pub use types::*;

/// Standard result type for all deal computations
pub type RenoDealResult<T> = Result<T, RenoDealError>;
