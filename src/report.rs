use bigdecimal::{BigDecimal, RoundingMode};
use std::fmt::{Display, Formatter};

/// Number of decimal places every amount in a report is rounded to.
pub const SCALE: i64 = 2;

/// Rounds half-up to [`SCALE`] decimal places.
pub fn round(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(SCALE, RoundingMode::HalfUp)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReport {
    pub total_units: BigDecimal,
    pub total_cost: BigDecimal,
    /// Elapsed time rounded up to whole days. All the projections are derived from this.
    pub billing_period_days: i64,
    pub daily_usage: BigDecimal,
    pub daily_cost: BigDecimal,
    pub weekly_usage: BigDecimal,
    pub weekly_cost: BigDecimal,
    /// Projected over a flat 30-day month.
    pub monthly_usage: BigDecimal,
    pub monthly_cost: BigDecimal,
    pub breakdown: BillingBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingBreakdown {
    pub calendar: CalendarBreakdown,
    pub weeks: WeekBreakdown,
}

/// Difference between the calendar fields of two dates, for display only.
///
/// Borrowing a month can still leave `days` negative when the previous date falls on a day
/// the month before the current date does not have (January 31st to March 1st gives `-2`).
/// Such a triple is kept as computed; see [`CalendarBreakdown::is_normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarBreakdown {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl CalendarBreakdown {
    pub const fn is_normalized(self) -> bool {
        self.years >= 0 && self.months >= 0 && self.months <= 11 && self.days >= 0
    }

    const fn is_empty(self) -> bool {
        self.years <= 0 && self.months <= 0 && self.days <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBreakdown {
    pub weeks: i64,
    pub remaining_days: i64,
}

impl WeekBreakdown {
    pub const fn from_days(days: i64) -> Self {
        Self {
            weeks: days.div_euclid(7),
            remaining_days: days.rem_euclid(7),
        }
    }
}

struct Plural<'a>(i64, &'a str);

impl Display for Plural<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let suffix = if self.0 == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.0, self.1, suffix)
    }
}

impl Display for CalendarBreakdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            Plural(self.years.into(), "year"),
            Plural(self.months.into(), "month"),
            Plural(self.days.into(), "day"),
        )
    }
}

impl Display for WeekBreakdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}",
            Plural(self.weeks, "week"),
            Plural(self.remaining_days, "day"),
        )
    }
}

impl BillingBreakdown {
    /// Human-readable lines. The calendar line is left out when nothing in it is positive.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        if !self.calendar.is_empty() {
            lines.push(self.calendar.to_string());
        }
        lines.push(self.weeks.to_string());
        lines
    }
}

impl UsageReport {
    /// Renders the report as labelled lines, costs prefixed with `currency`.
    pub fn render(&self, currency: &str) -> String {
        let mut out = String::new();
        let mut line = |label: &str, value: String| {
            out.push_str(&format!("{label:<16}{value}\n"));
        };
        line("Total usage:", format!("{} kWh", self.total_units));
        line("Total cost:", format!("{currency}{}", self.total_cost));
        line("Daily usage:", format!("{} kWh", self.daily_usage));
        line("Daily cost:", format!("{currency}{}/day", self.daily_cost));
        line("Weekly usage:", format!("{} kWh", self.weekly_usage));
        line("Weekly cost:", format!("{currency}{}/week", self.weekly_cost));
        line("Monthly usage:", format!("{} kWh", self.monthly_usage));
        line("Monthly cost:", format!("{currency}{}/month", self.monthly_cost));
        line("Billing period:", format!("{} days", self.billing_period_days));
        for breakdown in self.breakdown.lines() {
            line("", breakdown);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_half_up() {
        let value = BigDecimal::from_str("35.715").unwrap();
        assert_eq!(round(&value).to_string(), "35.72");
        assert_eq!(round(&BigDecimal::from(50)).to_string(), "50.00");
    }

    #[test]
    fn test_week_breakdown() {
        assert_eq!(
            WeekBreakdown::from_days(31),
            WeekBreakdown { weeks: 4, remaining_days: 3 }
        );
        assert_eq!(
            WeekBreakdown::from_days(7),
            WeekBreakdown { weeks: 1, remaining_days: 0 }
        );
    }

    #[test]
    fn test_plurals() {
        let calendar = CalendarBreakdown { years: 1, months: 0, days: 2 };
        assert_eq!(calendar.to_string(), "1 year, 0 months, 2 days");
        let weeks = WeekBreakdown { weeks: 2, remaining_days: 1 };
        assert_eq!(weeks.to_string(), "2 weeks, 1 day");
    }

    #[test]
    fn test_lines_skip_empty_calendar() {
        let breakdown = BillingBreakdown {
            calendar: CalendarBreakdown { years: 0, months: 0, days: 0 },
            weeks: WeekBreakdown { weeks: 0, remaining_days: 1 },
        };
        assert_eq!(breakdown.lines(), vec!["0 weeks, 1 day".to_owned()]);
    }

    #[test]
    fn test_lines_with_calendar() {
        let breakdown = BillingBreakdown {
            calendar: CalendarBreakdown { years: 0, months: 1, days: 0 },
            weeks: WeekBreakdown { weeks: 4, remaining_days: 3 },
        };
        assert_eq!(
            breakdown.lines(),
            vec!["0 years, 1 month, 0 days".to_owned(), "4 weeks, 3 days".to_owned()]
        );
    }

    #[test]
    fn test_is_normalized() {
        assert!(CalendarBreakdown { years: 0, months: 11, days: 30 }.is_normalized());
        assert!(!CalendarBreakdown { years: 0, months: 0, days: -2 }.is_normalized());
    }
}
