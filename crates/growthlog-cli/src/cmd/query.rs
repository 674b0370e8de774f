use crate::output::print_json;
use anyhow::Context;
use growthlog_core::config::Config;
use growthlog_core::row::DateFormat;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::resolve(root).context("failed to load config")?;
    let rotation = config.rotation();
    let today = chrono::Local::now().date_naive();
    let query = rotation.for_date(today);

    if json {
        let value = serde_json::json!({
            "date": DateFormat::Short.render(today),
            "query": query,
            "rotation_size": rotation.len(),
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("{query}");
    Ok(())
}
