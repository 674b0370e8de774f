use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use growthlog_core::config::Config;
use growthlog_core::pain_point::{extract_pain_points, load_results};
use growthlog_core::row::{DateFormat, MetricsRow, MetricsRowBuilder, HEADER};
use std::path::{Path, PathBuf};

/// Inputs shared by `record` and `row`.
#[derive(Args)]
pub struct RowArgs {
    /// JSON file of analysis results (array, or object with a `results` array)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Search query used today (default: today's entry in the query rotation)
    #[arg(long)]
    pub query: Option<String>,

    /// Leads found today
    #[arg(long, default_value_t = 0)]
    pub leads: u64,

    /// Replies sent today
    #[arg(long, default_value_t = 0)]
    pub replies: u64,

    /// Revenue amount
    #[arg(long, default_value_t = 0.0)]
    pub revenue: f64,

    /// Maximum pain points to extract (default from config)
    #[arg(long)]
    pub max_points: Option<usize>,
}

#[derive(Args)]
pub struct RowCommandArgs {
    #[command(flatten)]
    pub row: RowArgs,

    /// Date format: short (M/D/YYYY) or padded (MM/DD/YYYY)
    #[arg(long)]
    pub format: Option<DateFormat>,
}

// ---------------------------------------------------------------------------
// Row assembly
// ---------------------------------------------------------------------------

pub fn build_row(root: &Path, config: &Config, args: &RowArgs) -> anyhow::Result<MetricsRow> {
    let today = chrono::Local::now().date_naive();
    let query = match &args.query {
        Some(q) => q.clone(),
        None => config.rotation().for_date(today).to_string(),
    };

    let points = match &args.results {
        Some(path) => {
            let path = growthlog_core::paths::resolve(root, path);
            let results = load_results(&path).context("failed to load analysis results")?;
            let max = args.max_points.unwrap_or(config.max_points);
            let points = extract_pain_points(&results, max);
            tracing::info!(
                results = results.len(),
                extracted = points.len(),
                "extracted pain points"
            );
            points
        }
        None => Vec::new(),
    };

    Ok(MetricsRowBuilder::new(query)
        .leads(args.leads)
        .replies(args.replies)
        .revenue(args.revenue)
        .pain_points(points)
        .build(today))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, args: RowCommandArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::resolve(root).context("failed to load config")?;
    let row = build_row(root, &config, &args.row)?;
    let format = args.format.unwrap_or(config.date_format);

    if json {
        let value = serde_json::json!({
            "header": HEADER,
            "fields": row.to_fields(format),
        });
        print_json(&value)?;
        return Ok(());
    }

    let rows = HEADER
        .iter()
        .zip(row.to_strings(format))
        .map(|(column, value)| vec![column.to_string(), value])
        .collect();
    print_table(&["Column", "Value"], rows);
    Ok(())
}
