use anyhow::{Context, bail};
use clap::{Args, Parser, ValueEnum};
use jiff::Zoned;
use meter_calc::batch;
use meter_calc::notification::{NullNotifier, TracingNotifier};
use meter_calc::{MeterCalculator, Notifier, RawMeterInput};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Meter usage calculator.
/// Given two meter readings, the dates they were taken on and your rate per unit, calculates
/// how much you used and paid over the billing period, and projects it per day, week and month.
#[derive(Parser, Debug)]
#[command(version, long_about)]
struct MeterCalc {
    #[command(flatten)]
    reading: ReadingArgs,
    /// CSV file with one calculation per row. Its header must be
    /// `previous_reading,current_reading,previous_date,current_date,rate_per_unit`.
    #[arg(long, env = "METER_CALC_BATCH", conflicts_with = "reading")]
    batch: Option<PathBuf>,
    /// Currency symbol printed in front of costs.
    #[arg(long, env = "METER_CALC_CURRENCY", default_value = "₹")]
    currency: String,
    #[arg(long, value_enum, env = "METER_CALC_OUTPUT", default_value_t = Output::Text)]
    output: Output,
}

#[derive(Args, Debug)]
#[group(id = "reading", multiple = true)]
struct ReadingArgs {
    /// Meter reading at the start of the period.
    #[arg(long, env = "METER_CALC_PREVIOUS_READING")]
    previous_reading: Option<String>,
    /// Meter reading at the end of the period.
    #[arg(long, env = "METER_CALC_CURRENT_READING")]
    current_reading: Option<String>,
    /// When the previous reading was taken, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`.
    #[arg(long, env = "METER_CALC_PREVIOUS_DATE")]
    previous_date: Option<String>,
    /// When the current reading was taken. Defaults to today.
    #[arg(long, env = "METER_CALC_CURRENT_DATE")]
    current_date: Option<String>,
    /// Price of one unit.
    #[arg(long, env = "METER_CALC_RATE")]
    rate: Option<String>,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
enum Output {
    Text,
    Csv,
}

impl ReadingArgs {
    fn into_raw(self) -> anyhow::Result<RawMeterInput> {
        fn required(value: Option<String>, flag: &str) -> anyhow::Result<String> {
            value.with_context(|| format!("`{flag}` is required unless `--batch` is given"))
        }
        Ok(RawMeterInput {
            previous_reading: required(self.previous_reading, "--previous-reading")?,
            current_reading: required(self.current_reading, "--current-reading")?,
            previous_date: required(self.previous_date, "--previous-date")?,
            current_date: self
                .current_date
                .unwrap_or_else(|| Zoned::now().date().to_string()),
            rate_per_unit: required(self.rate, "--rate")?,
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,meter_calc=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = MeterCalc::parse();
    let calculator = MeterCalculator;
    // A single calculation reports its failure as the exit error, so only batches log per row.
    let notifier: &dyn Notifier = if args.batch.is_some() {
        &TracingNotifier
    } else {
        &NullNotifier
    };

    let inputs = match &args.batch {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open batch file {}", path.display()))?;
            let inputs = batch::read_inputs(BufReader::new(file))
                .with_context(|| format!("failed to read batch file {}", path.display()))?;
            info!(rows = inputs.len(), "loaded batch");
            inputs
        }
        None => vec![Ok(args.reading.into_raw()?)],
    };

    let rows = batch::process(&calculator, notifier, &inputs);
    let mut stdout = io::stdout().lock();
    match (args.output, rows.as_slice()) {
        (Output::Csv, _) => batch::write_csv(&mut stdout, &rows)?,
        (Output::Text, [row]) if args.batch.is_none() => match &row.outcome {
            Ok(report) => write!(stdout, "{}", report.render(&args.currency))?,
            Err(error) => bail!("{error}"),
        },
        (Output::Text, _) => batch::write_text(&mut stdout, &rows, &args.currency)?,
    }
    Ok(())
}
