/// Rejection of a meter input before any calculation happens.
///
/// The messages are meant to be shown to the user as they are.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Current reading must be greater than previous reading")]
    NonIncreasingReading,
    #[error("Current date must be after previous date")]
    NonChronologicalDates,
    #[error("Rate per unit must be greater than 0")]
    NonPositiveRate,
    #[error("Invalid {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("Billing period is empty ({days} days)")]
    EmptyBillingPeriod { days: i64 },
    #[error("Calendar arithmetic failed: {0}")]
    Calendar(#[from] jiff::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}
