use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::pipeline::checkpoint::count_done;
use crate::pipeline::status::{status_path, RunStatus};

/// Show checkpoint size and the last run's status snapshot.
pub fn show_status(config: &Config) -> Result<()> {
    let checkpoint = &config.output.checkpoint;
    let done = count_done(checkpoint)
        .with_context(|| format!("Failed to read checkpoint {}", checkpoint.display()))?;

    println!("vidtext status:");
    println!("  Checkpoint:       {}", checkpoint.display());
    println!("  Videos processed: {}", done);
    println!("  Report:           {}", config.output.report.display());

    match RunStatus::read(&status_path(checkpoint)) {
        Some(status) => {
            println!("  Last run:         {}", status.summary_line());
            println!("  Started:          {}", status.started_at);
            println!("  Updated:          {}", status.updated_at);
            if let Some(video) = &status.last_video {
                println!("  Last video:       {}", video);
            }
        }
        None => println!("  Last run:         none recorded"),
    }

    Ok(())
}

/// Default location for `init-config` when no path is given.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("vidtext").join("config.toml"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine the platform config directory"))
}

/// Write the commented default config to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, Config::generate_default_commented())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
