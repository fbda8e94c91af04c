//! Meter reading usage and cost calculator.
//!
//! Turns two meter readings, the dates they were taken on and a unit rate into a
//! [`UsageReport`]: totals, the billing period, and daily/weekly/monthly projections.

pub mod batch;
pub mod error;
pub mod notification;
pub mod rate_calculator;
pub mod report;
pub mod usage_data;

pub use crate::error::{ComputeError, Error, ValidationError};
pub use crate::notification::{Notification, NotificationKind, Notifier};
pub use crate::rate_calculator::{MeterCalculator, UsageCalculator};
pub use crate::report::{BillingBreakdown, CalendarBreakdown, UsageReport, WeekBreakdown};
pub use crate::usage_data::{MeterInput, RawMeterInput};
