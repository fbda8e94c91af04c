use crate::error::{ComputeError, Error, ValidationError};
use crate::notification::{Notification, NotificationKind, Notifier};
use crate::report::{BillingBreakdown, CalendarBreakdown, UsageReport, WeekBreakdown, round};
use crate::usage_data::MeterInput;
use bigdecimal::BigDecimal;
use jiff::civil::DateTime;
use tracing::debug;

const MILLIS_PER_DAY: i128 = 86_400_000;
const DAYS_PER_WEEK: i64 = 7;
const DAYS_PER_MONTH: i64 = 30;

pub trait UsageCalculator {
    /// Checks the readings, then the dates, then the rate, stopping at the first failure.
    fn validate(&self, input: &MeterInput) -> Result<(), ValidationError>;

    /// Builds the report. Expects `input` to have passed [`UsageCalculator::validate`].
    fn compute(&self, input: &MeterInput) -> Result<UsageReport, ComputeError>;

    /// Validates and computes, telling `notifier` how validation went.
    fn calculate(
        &self,
        input: &MeterInput,
        notifier: &dyn Notifier,
    ) -> Result<UsageReport, Error> {
        if let Err(error) = self.validate(input) {
            notifier.notify(Notification::new(
                NotificationKind::Warning,
                error.to_string(),
            ));
            return Err(error.into());
        }
        notifier.notify(Notification::new(
            NotificationKind::Success,
            "Calculating...",
        ));
        Ok(self.compute(input)?)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MeterCalculator;

impl UsageCalculator for MeterCalculator {
    fn validate(&self, input: &MeterInput) -> Result<(), ValidationError> {
        if input.current_reading <= input.previous_reading {
            return Err(ValidationError::NonIncreasingReading);
        }
        if input.current_date.date() <= input.previous_date.date() {
            return Err(ValidationError::NonChronologicalDates);
        }
        if input.rate_per_unit <= BigDecimal::from(0) {
            return Err(ValidationError::NonPositiveRate);
        }
        Ok(())
    }

    fn compute(&self, input: &MeterInput) -> Result<UsageReport, ComputeError> {
        let total_units = input.total_units();
        let total_cost = &total_units * &input.rate_per_unit;

        let calendar = calendar_breakdown(input.previous_date, input.current_date)?;
        let billing_period_days = billing_period_days(input.previous_date, input.current_date);
        if billing_period_days <= 0 {
            return Err(ComputeError::EmptyBillingPeriod {
                days: billing_period_days,
            });
        }
        let days = BigDecimal::from(billing_period_days);

        let daily_usage = &total_units / &days;
        let daily_cost = &total_cost / &days;
        let week = BigDecimal::from(DAYS_PER_WEEK);
        let month = BigDecimal::from(DAYS_PER_MONTH);
        debug!(%total_units, %total_cost, billing_period_days, "computed usage");

        Ok(UsageReport {
            total_units: round(&total_units),
            total_cost: round(&total_cost),
            billing_period_days,
            weekly_usage: round(&(&daily_usage * &week)),
            weekly_cost: round(&(&daily_cost * &week)),
            monthly_usage: round(&(&daily_usage * &month)),
            monthly_cost: round(&(&daily_cost * &month)),
            daily_usage: round(&daily_usage),
            daily_cost: round(&daily_cost),
            breakdown: BillingBreakdown {
                calendar,
                weeks: WeekBreakdown::from_days(billing_period_days),
            },
        })
    }
}

/// Elapsed time between the two instants, rounded up to whole days.
pub fn billing_period_days(previous: DateTime, current: DateTime) -> i64 {
    let millis = current.duration_since(previous).as_millis();
    let days = millis.div_euclid(MILLIS_PER_DAY) + i128::from(millis.rem_euclid(MILLIS_PER_DAY) != 0);
    // Civil date-times span at most a few million days.
    i64::try_from(days).unwrap_or(i64::MAX)
}

/// Subtracts calendar fields, borrowing from the month preceding `current`'s month and then
/// from the year. The result is not normalized any further.
pub fn calendar_breakdown(
    previous: DateTime,
    current: DateTime,
) -> Result<CalendarBreakdown, jiff::Error> {
    let mut years = i32::from(current.year()) - i32::from(previous.year());
    let mut months = i32::from(current.month()) - i32::from(previous.month());
    let mut days = i32::from(current.day()) - i32::from(previous.day());

    if days < 0 {
        months -= 1;
        let last_of_prior_month = current.date().first_of_month().yesterday()?;
        days += i32::from(last_of_prior_month.day());
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    Ok(CalendarBreakdown {
        years,
        months,
        days,
    })
}
