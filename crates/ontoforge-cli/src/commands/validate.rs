use std::path::Path;

use anyhow::{Context, Result};
use ontoforge_core::validate_config_value;

use crate::ui;

pub fn run(config_path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", config_path.display()))?;

    let errors = validate_config_value(&value);
    if errors.is_empty() {
        ui::success(&format!("{} is a valid ontology config", config_path.display()));
        return Ok(());
    }

    ui::error(&format!(
        "{}: {} problem(s)",
        config_path.display(),
        errors.len()
    ));
    for error in &errors {
        ui::item(error);
    }
    anyhow::bail!("invalid config")
}
