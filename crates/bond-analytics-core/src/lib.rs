pub mod error;
pub mod solver;
pub mod types;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "batch")]
pub mod batch;

pub use error::BondAnalyticsError;
pub use types::*;

/// Standard result type for all bond-analytics operations
pub type BondAnalyticsResult<T> = Result<T, BondAnalyticsError>;
