use std::path::Path;

use anyhow::{Context, Result};
use ontoforge_core::{EngineSettings, OntoPaths, OntologyConfig, Pipeline};

use crate::ui;

pub async fn run(config_path: &Path, out: &Path, settings_path: Option<&Path>) -> Result<()> {
    let paths = OntoPaths::from_env();
    let settings = EngineSettings::load(settings_path.unwrap_or(paths.settings_path.as_path()))?;

    let config = OntologyConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let pipeline = Pipeline::new(settings, &paths)?;
    let output = pipeline
        .run(&config)
        .await
        .with_context(|| format!("Extraction failed for {}", config.name))?;

    let (source_path, compact_path) = output.write_artifacts(out).await?;

    ui::success(&format!("extracted {}", output.source.name));
    ui::detail(
        "entities",
        format!(
            "{} kept, {} ignored",
            output.source.entities.len(),
            output.source.ignored_entities.len()
        ),
    );
    ui::detail(
        "relations",
        format!(
            "{} kept, {} ignored",
            output.source.relationships.len(),
            output.source.ignored_relationships.len()
        ),
    );
    for (url, reason) in &output.failed_imports {
        ui::warn(&format!("skipped import {}: {}", url, reason));
    }
    if let Some(anomaly) = &output.anomaly {
        if anomaly.is_critical() {
            ui::error("every relationship was pruned; check the entity selection settings");
        }
    }
    ui::detail("source", source_path.display());
    ui::detail("compact", compact_path.display());

    Ok(())
}
