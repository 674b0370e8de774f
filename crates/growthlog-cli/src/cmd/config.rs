use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use growthlog_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the resolved configuration (file + environment)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::resolve(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(root, &config, json),
        ConfigSubcommand::Validate => validate(root, &config, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }

    println!("Root:           {}", root.display());
    println!("Sink:           {}", config.sink);
    println!(
        "Spreadsheet:    {}",
        config.spreadsheet_id.as_deref().unwrap_or("(none)")
    );
    println!("Credentials:    {}", config.credentials_file(root).display());
    println!("CSV file:       {}", config.csv_file(root).display());
    println!("Date format:    {}", config.date_format);
    println!("Max points:     {}", config.max_points);
    println!("HTTP timeout:   {}s", config.http_timeout_secs);
    println!("Queries:");
    for q in &config.queries {
        println!("  - {q}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate(root);

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
