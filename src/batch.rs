use crate::error::{Error, ValidationError};
use crate::notification::{Notification, NotificationKind, Notifier};
use crate::rate_calculator::UsageCalculator;
use crate::report::UsageReport;
use crate::usage_data::RawMeterInput;
use csv::StringRecord;
use std::io::{Read, Write};
use std::sync::LazyLock;
use tracing::{info, info_span};

static EXPECTED_HEADERS: LazyLock<StringRecord> = LazyLock::new(|| {
    StringRecord::from(vec![
        "previous_reading",
        "current_reading",
        "previous_date",
        "current_date",
        "rate_per_unit",
    ])
});

const OUTPUT_HEADERS: [&str; 17] = [
    "row",
    "status",
    "total_units",
    "total_cost",
    "billing_period_days",
    "daily_usage",
    "daily_cost",
    "weekly_usage",
    "weekly_cost",
    "monthly_usage",
    "monthly_cost",
    "years",
    "months",
    "days",
    "weeks",
    "remaining_days",
    "error",
];

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unexpected headers in batch CSV: {found:?}. Expected: {expected:?}")]
    UnexpectedHeaders {
        found: StringRecord,
        expected: StringRecord,
    },
}

/// One data row: its form values, or why they could not be taken from the row.
pub type BatchInput = Result<RawMeterInput, ValidationError>;

/// Outcome of one data row, numbered from 1.
#[derive(Debug)]
pub struct BatchRow {
    pub row: usize,
    pub outcome: Result<UsageReport, Error>,
}

/// Reads every data row. A row with the wrong number of fields is kept as an error, so only
/// unreadable input or unexpected headers fail the whole batch.
pub fn read_inputs(reader: impl Read) -> Result<Vec<BatchInput>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if headers != *EXPECTED_HEADERS {
        return Err(BatchError::UnexpectedHeaders {
            found: headers,
            expected: EXPECTED_HEADERS.clone(),
        });
    }
    csv_reader
        .into_byte_records()
        .map(|record| -> Result<BatchInput, BatchError> {
            let fields: Vec<String> = record?
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            let input = match <[String; 5]>::try_from(fields) {
                Ok([previous_reading, current_reading, previous_date, current_date, rate_per_unit]) => {
                    Ok(RawMeterInput {
                        previous_reading,
                        current_reading,
                        previous_date,
                        current_date,
                        rate_per_unit,
                    })
                }
                Err(fields) => Err(ValidationError::InvalidInput {
                    field: "row",
                    value: fields.join(","),
                }),
            };
            Ok(input)
        })
        .collect()
}

fn reject(notifier: &dyn Notifier, error: impl Into<Error>) -> Error {
    let error = error.into();
    let kind = match error {
        Error::Validation(_) => NotificationKind::Warning,
        Error::Compute(_) => NotificationKind::Error,
    };
    notifier.notify(Notification::new(kind, error.to_string()));
    error
}

/// Parses, validates and computes every row on its own; a bad row does not stop the rest.
///
/// Every failing row is reported to `notifier` exactly once.
pub fn process(
    calculator: &impl UsageCalculator,
    notifier: &dyn Notifier,
    inputs: &[BatchInput],
) -> Vec<BatchRow> {
    let rows: Vec<BatchRow> = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let _span = info_span!("row", row = index + 1).entered();
            let outcome = match input.as_ref().map(RawMeterInput::parse) {
                Ok(Ok(input)) => match calculator.calculate(&input, notifier) {
                    Err(Error::Compute(error)) => Err(reject(notifier, error)),
                    outcome => outcome,
                },
                Ok(Err(error)) => Err(reject(notifier, error)),
                Err(error) => Err(reject(notifier, error.clone())),
            };
            BatchRow {
                row: index + 1,
                outcome,
            }
        })
        .collect();
    let failed = rows.iter().filter(|row| row.outcome.is_err()).count();
    info!(total = rows.len(), failed, "processed batch");
    rows
}

pub fn write_csv(writer: impl Write, rows: &[BatchRow]) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(OUTPUT_HEADERS)?;
    for row in rows {
        let mut record = vec![row.row.to_string()];
        match &row.outcome {
            Ok(report) => {
                let calendar = report.breakdown.calendar;
                let weeks = report.breakdown.weeks;
                record.push("ok".to_owned());
                record.push(report.total_units.to_string());
                record.push(report.total_cost.to_string());
                record.push(report.billing_period_days.to_string());
                record.extend(
                    [
                        &report.daily_usage,
                        &report.daily_cost,
                        &report.weekly_usage,
                        &report.weekly_cost,
                        &report.monthly_usage,
                        &report.monthly_cost,
                    ]
                    .map(ToString::to_string),
                );
                record.extend(
                    [calendar.years, calendar.months, calendar.days].map(|value| value.to_string()),
                );
                record.extend([weeks.weeks, weeks.remaining_days].map(|value| value.to_string()));
                record.push(String::new());
            }
            Err(error) => {
                record.push("error".to_owned());
                record.extend(std::iter::repeat_n(String::new(), OUTPUT_HEADERS.len() - 3));
                record.push(error.to_string());
            }
        }
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes each row as a rendered report, or its error.
pub fn write_text(mut writer: impl Write, rows: &[BatchRow], currency: &str) -> std::io::Result<()> {
    for row in rows {
        writeln!(writer, "Row {}:", row.row)?;
        match &row.outcome {
            Ok(report) => write!(writer, "{}", report.render(currency))?,
            Err(error) => writeln!(writer, "Error: {error}")?,
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NullNotifier, RecordingNotifier};
    use crate::rate_calculator::MeterCalculator;

    const BATCH: &str = "\
previous_reading,current_reading,previous_date,current_date,rate_per_unit
100,150,2024-01-01,2024-01-08,5
50,50,2024-01-01,2024-01-08,5
0,30,2024-01-01,2024-02-01,8
";

    #[test]
    fn test_read_inputs() {
        let inputs = read_inputs(BATCH.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 3);
        let last = inputs[2].as_ref().unwrap();
        assert_eq!(last.current_date, "2024-02-01");
        assert_eq!(last.rate_per_unit, "8");
    }

    #[test]
    fn test_read_inputs_bad_headers() {
        let result = read_inputs("previous,current\n1,2\n".as_bytes());
        assert!(matches!(result, Err(BatchError::UnexpectedHeaders { .. })));
    }

    #[test]
    fn test_read_inputs_wrong_field_count() {
        let batch = "\
previous_reading,current_reading,previous_date,current_date,rate_per_unit
100,150,2024-01-01,2024-01-08,5
100,150,2024-01-01
100,150,2024-01-01,2024-01-08,5,extra
0,30,2024-01-01,2024-02-01,8
";
        let inputs = read_inputs(batch.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 4);
        assert!(inputs[0].is_ok());
        assert_eq!(
            inputs[1],
            Err(ValidationError::InvalidInput {
                field: "row",
                value: "100,150,2024-01-01".to_owned(),
            })
        );
        assert!(matches!(inputs[2], Err(ValidationError::InvalidInput { field: "row", .. })));
        assert!(inputs[3].is_ok());

        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        assert!(rows[0].outcome.is_ok());
        assert!(rows[1].outcome.is_err());
        assert!(rows[2].outcome.is_err());
        assert_eq!(rows[3].outcome.as_ref().unwrap().billing_period_days, 31);
    }

    #[test]
    fn test_read_inputs_invalid_utf8() {
        let mut batch = b"previous_reading,current_reading,previous_date,current_date,rate_per_unit\n".to_vec();
        batch.extend_from_slice(b"100,\xff\xfe,2024-01-01,2024-01-08,5\n");
        batch.extend_from_slice(b"100,150,2024-01-01,2024-01-08,5\n");
        let inputs = read_inputs(batch.as_slice()).unwrap();
        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        assert!(matches!(
            rows[0].outcome,
            Err(Error::Validation(ValidationError::InvalidInput { field: "current reading", .. }))
        ));
        assert!(rows[1].outcome.is_ok());
    }

    #[test]
    fn test_read_error_message() {
        struct Unreadable;

        impl Read for Unreadable {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk is gone"))
            }
        }

        let error = read_inputs(Unreadable).unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("failed to read batch CSV: "), "{message}");
        assert!(message.contains("disk is gone"), "{message}");
        assert!(!message.contains("CSV error: CSV error"), "{message}");
    }

    #[test]
    fn test_process_notifies_each_failure_once() {
        let batch = "\
previous_reading,current_reading,previous_date,current_date,rate_per_unit
100,150,2024-01-01,2024-01-08,5
50,50,2024-01-01,2024-01-08,5
abc,150,2024-01-01,2024-01-08,5
100,150,2024-01-01
";
        let inputs = read_inputs(batch.as_bytes()).unwrap();
        let notifier = RecordingNotifier::default();
        process(&MeterCalculator, &notifier, &inputs);
        assert_eq!(
            notifier.take(),
            vec![
                Notification::new(NotificationKind::Success, "Calculating..."),
                Notification::new(
                    NotificationKind::Warning,
                    "Current reading must be greater than previous reading"
                ),
                Notification::new(NotificationKind::Warning, "Invalid previous reading: \"abc\""),
                Notification::new(NotificationKind::Warning, "Invalid row: \"100,150,2024-01-01\""),
            ]
        );
    }

    #[test]
    fn test_process_keeps_going_after_failure() {
        let inputs = read_inputs(BATCH.as_bytes()).unwrap();
        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].outcome.is_ok());
        assert!(matches!(
            rows[1].outcome,
            Err(Error::Validation(ValidationError::NonIncreasingReading))
        ));
        assert_eq!(rows[2].outcome.as_ref().unwrap().billing_period_days, 31);
    }

    #[test]
    fn test_process_invalid_field() {
        let inputs = vec![Ok(RawMeterInput {
            previous_reading: "1".into(),
            current_reading: "two".into(),
            previous_date: "2024-01-01".into(),
            current_date: "2024-01-02".into(),
            rate_per_unit: "1".into(),
        })];
        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        assert!(matches!(
            rows[0].outcome,
            Err(Error::Validation(ValidationError::InvalidInput { field: "current reading", .. }))
        ));
    }

    #[test]
    fn test_write_csv() {
        let inputs = read_inputs(BATCH.as_bytes()).unwrap();
        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "1,ok,50.00,250.00,7,7.14,35.71,50.00,250.00,214.29,1071.43,0,0,7,1,0,"
        );
        assert_eq!(
            lines[2],
            "2,error,,,,,,,,,,,,,,,Current reading must be greater than previous reading"
        );
    }

    #[test]
    fn test_write_text() {
        let inputs = read_inputs(BATCH.as_bytes()).unwrap();
        let rows = process(&MeterCalculator, &NullNotifier, &inputs);
        let mut out = Vec::new();
        write_text(&mut out, &rows, "$").unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Row 1:\nTotal usage:    50.00 kWh\n"));
        assert!(out.contains("Total cost:     $250.00\n"));
        assert!(out.contains("Row 2:\nError: Current reading must be greater than previous reading\n"));
        assert!(out.contains("0 years, 1 month, 0 days"));
    }
}
