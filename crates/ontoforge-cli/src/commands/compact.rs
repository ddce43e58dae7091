use std::path::Path;

use anyhow::{Context, Result};
use ontoforge_graph::{compact, SourceOntology};

pub fn run(source_path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;
    let ontology: SourceOntology = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a source ontology", source_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&compact(&ontology))?);
    Ok(())
}
