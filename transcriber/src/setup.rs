use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{default_config_path, Settings};

/// Configuration for the `init` command.
#[derive(Debug, Clone, Default)]
pub struct InitConfig {
    /// Target file; defaults to the per-user config location.
    pub path: Option<PathBuf>,
    /// Replace an existing file.
    pub force: bool,
    /// Whether to run in dry-run mode (no changes applied).
    pub dry_run: bool,
}

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new file was written.
    Created,
    /// An existing file was replaced.
    Overwritten,
    /// The file exists and `--force` was not given.
    Skipped,
    /// Nothing was written because of `--dry-run`.
    DryRun,
}

/// Writes a commented default settings file.
///
/// # Errors
/// Returns an error if the config directory cannot be determined or the file cannot be written.
pub fn run_init(config: &InitConfig) -> anyhow::Result<(PathBuf, InitOutcome)> {
    let path = match &config.path {
        Some(path) => path.clone(),
        None => default_config_path().context("Could not determine the user config directory")?,
    };
    let outcome = write_default_config(&path, config)?;
    Ok((path, outcome))
}

fn write_default_config(path: &Path, config: &InitConfig) -> anyhow::Result<InitOutcome> {
    println!("Checking settings file at: {}", path.display());

    let exists = path.exists();
    if exists && !config.force {
        println!(
            "[SKIP] {} already exists. Pass --force to overwrite it.",
            path.display()
        );
        return Ok(InitOutcome::Skipped);
    }

    let content = Settings::default()
        .to_commented_toml()
        .context("Failed to render default settings")?;

    if config.dry_run {
        println!("[DRY RUN] Would write {}:\n\n{content}", path.display());
        return Ok(InitOutcome::DryRun);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote default settings");

    if exists {
        println!("[OK] Overwrote {}.", path.display());
        Ok(InitOutcome::Overwritten)
    } else {
        println!("[OK] Created {}.", path.display());
        Ok(InitOutcome::Created)
    }
}
