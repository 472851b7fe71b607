use std::path::Path;

use anyhow::Result;

use blogfeed_core::AppConfig;

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    AppConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    println!("Edit the [[sources]] entries to choose which feeds are ingested.");

    Ok(())
}
