use crate::output::print_json;
use anyhow::Context;
use growthlog_core::config::Config;
use growthlog_core::paths;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let created = Config::init(root).context("failed to write growthlog.yaml")?;
    let path = paths::config_path(root);

    if json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
            "created": created,
        });
        print_json(&value)?;
        return Ok(());
    }

    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}
