use super::row::{build_row, RowArgs};
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use growthlog_core::config::{Config, WarnLevel, ENV_SPREADSHEET_ID};
use growthlog_core::sink::{record_row, MetricsSink, RecordOutcome, SinkChoice};
use std::path::Path;

#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub row: RowArgs,

    /// Destination: auto (remote with local fallback), remote, or local
    #[arg(long)]
    pub sink: Option<SinkChoice>,

    /// Exit non-zero when no sink stored the row
    #[arg(long)]
    pub strict: bool,
}

pub fn run(root: &Path, args: RecordArgs, json: bool) -> anyhow::Result<()> {
    let mut config = Config::resolve(root).context("failed to load config")?;
    if let Some(choice) = args.sink {
        config.sink = choice;
    }
    check_config(root, &config)?;
    let row = build_row(root, &config, &args.row)?;

    let local = config.local_sink(root);
    let remote = config.remote_sink(root);

    let outcome = match (config.sink, &remote) {
        (SinkChoice::Local, _) => record_row(&row, &local, None),
        (SinkChoice::Remote, Some(remote)) => record_row(&row, remote, None),
        (SinkChoice::Remote, None) => {
            anyhow::bail!("sink 'remote' needs a spreadsheet id (set {ENV_SPREADSHEET_ID})")
        }
        (SinkChoice::Auto, Some(remote)) => {
            record_row(&row, remote, Some(&local as &dyn MetricsSink))
        }
        (SinkChoice::Auto, None) => {
            tracing::info!("no spreadsheet configured, recording to local file");
            record_row(&row, &local, None)
        }
    };

    report(&row, &outcome, &config, json)?;

    if args.strict && !outcome.recorded() {
        anyhow::bail!("metrics row was not recorded");
    }
    Ok(())
}

/// Refuse to record with a config `config validate` would reject.
fn check_config(root: &Path, config: &Config) -> anyhow::Result<()> {
    let mut errors = Vec::new();
    for warning in config.validate(root) {
        match warning.level {
            WarnLevel::Warning => tracing::debug!(warning = %warning.message, "config warning"),
            WarnLevel::Error => errors.push(warning.message),
        }
    }
    if !errors.is_empty() {
        anyhow::bail!("invalid config: {}", errors.join("; "));
    }
    Ok(())
}

fn report(
    row: &growthlog_core::row::MetricsRow,
    outcome: &RecordOutcome,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let date = config.date_format.render(row.date);
    if json {
        let value = serde_json::json!({
            "date": date,
            "query": row.query,
            "recorded": outcome.recorded(),
            "sink": outcome.sink,
            "fell_back": outcome.fell_back,
        });
        return print_json(&value);
    }

    match outcome.sink {
        Some(sink) if outcome.fell_back => {
            println!("Recorded metrics for {date} ({}) to {sink} (fallback)", row.query)
        }
        Some(sink) => println!("Recorded metrics for {date} ({}) to {sink}", row.query),
        None => println!("Metrics for {date} were not recorded; see log for details"),
    }
    Ok(())
}
