//! Config command handlers.

use std::path::Path;

use anyhow::{Context, Result};

use relaybot::config::validate::{validate_config, validate_context_settings, DiagnosticLevel};

use super::{load_config, ConfigAction};

pub(crate) fn cmd_config(path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Check => cmd_check(path)?,
    }
    Ok(())
}

/// Validate the configuration file.
fn cmd_check(path: &Path) -> Result<()> {
    println!("Config file: {}", path.display());

    if !path.exists() {
        println!("[OK] No config file found (using defaults)");
        return Ok(());
    }

    let content = std::fs::read_to_string(path).context("Failed to read config file")?;

    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            println!("[ERROR] Invalid JSON: {}", e);
            return Ok(());
        }
    };

    let mut diagnostics = validate_config(&raw);
    // Unknown fields are tolerated by serde, so this only fails on type errors.
    match load_config(path) {
        Ok(config) => diagnostics.extend(validate_context_settings(&config.context)),
        Err(e) => println!("[ERROR] {:#}", e),
    }

    for diag in &diagnostics {
        println!("{}", diag);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
        .count();

    if errors == 0 && warnings == 0 {
        println!("\nConfiguration looks good!");
    } else {
        println!("\nFound {} error(s), {} warning(s)", errors, warnings);
    }
    Ok(())
}
