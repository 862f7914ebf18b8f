pub mod calendar;
pub mod error;
pub mod numeric;
pub mod schema;
pub mod time_value;
pub mod types;

#[cfg(feature = "generation")]
pub mod macro_series;

#[cfg(feature = "generation")]
pub mod population;

#[cfg(feature = "generation")]
pub mod origination;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "ecl")]
pub mod ecl;

#[cfg(feature = "calibration")]
pub mod calibration;

#[cfg(feature = "validation")]
pub mod validation;

#[cfg(feature = "reporting")]
pub mod reporting;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::CeclError;
pub use types::*;

/// Standard result type for all panel and loss operations
pub type CeclResult<T> = Result<T, CeclError>;

/// Base seed used when a caller does not supply one.
pub const DEFAULT_SEED: u64 = 12345;
