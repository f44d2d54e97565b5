use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use pbi_docs::export::{jsonl, markdown};
use pbi_docs::{AgentContext, Catalog, Language, MetadataExport, write_atomic};

use crate::output::json::write_json_file;

pub const METADATA_FILE: &str = "metadata.json";
pub const DOCUMENTATION_FILE: &str = "model_documentation.md";
pub const AGENT_CONTEXT_FILE: &str = "agent_context.json";
pub const CONTEXT_JSONL_FILE: &str = "model_context.jsonl";

/// `<root>/<input file name>`, e.g. `output/Sales.pbit`.
pub fn input_output_dir(root: &Path, input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => root.join(name),
        None => root.join("input"),
    }
}

/// Writes the four per-model artifacts into `dir` and returns their paths.
pub fn write_model_artifacts(
    dir: &Path,
    export: &MetadataExport,
    catalog: &Catalog,
    lang: Language,
) -> Result<Vec<PathBuf>> {
    let metadata = dir.join(METADATA_FILE);
    write_json_file(&metadata, export)
        .with_context(|| format!("Failed to write {}", metadata.display()))?;

    let documentation = dir.join(DOCUMENTATION_FILE);
    let doc = markdown::render(export, catalog, lang);
    write_atomic(&documentation, doc.as_bytes())
        .with_context(|| format!("Failed to write {}", documentation.display()))?;

    let agent = dir.join(AGENT_CONTEXT_FILE);
    write_json_file(&agent, &AgentContext::build(export, catalog, lang))
        .with_context(|| format!("Failed to write {}", agent.display()))?;

    let context = dir.join(CONTEXT_JSONL_FILE);
    let lines = jsonl::to_jsonl(&jsonl::records(export))?;
    write_atomic(&context, &lines)
        .with_context(|| format!("Failed to write {}", context.display()))?;

    Ok(vec![metadata, documentation, agent, context])
}
