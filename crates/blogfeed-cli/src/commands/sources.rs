use std::fmt::Write;
use std::path::Path;

use anyhow::Result;

use blogfeed_core::AppConfig;

pub fn run(config: &AppConfig, config_path: &Path) -> Result<()> {
    print!("{}", render(config, config_path)?);
    Ok(())
}

fn render(config: &AppConfig, config_path: &Path) -> Result<String> {
    let mut out = String::new();

    if config.sources.is_empty() {
        writeln!(out, "No feed sources configured.")?;
        writeln!(out, "\nAdd [[sources]] entries to {}", config_path.display())?;
        return Ok(out);
    }

    writeln!(out, "Feed sources ({}):\n", config.sources.len())?;

    for source in &config.sources {
        let state = if source.active { "" } else { " [inactive]" };
        writeln!(out, "  {}{}", source.name, state)?;
        writeln!(out, "    URL: {}", source.url)?;
    }

    Ok(out)
}
