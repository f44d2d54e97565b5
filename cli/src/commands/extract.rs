use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Context, Result};
use log::{info, warn};
use pbi_docs::{
    Catalog, ExtractConfig, Extraction, Extractor, FsDiagnosticSink, Language, MetadataExport,
};
use serde::Serialize;

use crate::output::artifacts::{input_output_dir, write_model_artifacts};

/// What one successfully processed input produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedInput {
    pub output_dir: PathBuf,
    pub tables: usize,
    pub measures: usize,
    pub relationships: usize,
    pub formatting_warnings: usize,
    pub low_confidence: bool,
}

pub fn run(config: &ExtractConfig, input: &Path, output: &Path, lang: Language) -> Result<ExitCode> {
    let catalog = Catalog::builtin();
    let processed = process_input(config, &catalog, input, output, lang)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "{}: {} tables, {} measures, {} relationships",
        input.display(),
        processed.tables,
        processed.measures,
        processed.relationships
    )?;
    if processed.formatting_warnings > 0 {
        writeln!(
            handle,
            "  {} measure(s) shown unformatted",
            processed.formatting_warnings
        )?;
    }
    writeln!(handle, "Artifacts written to {}", processed.output_dir.display())?;

    Ok(ExitCode::from(0))
}

/// Extracts `input` and writes its artifacts under `output_root`.
pub fn process_input(
    config: &ExtractConfig,
    catalog: &Catalog,
    input: &Path,
    output_root: &Path,
    lang: Language,
) -> Result<ProcessedInput> {
    extract_and_write(config, catalog, input, output_root, lang).map(|(_, processed)| processed)
}

/// Like [`process_input`], also handing back the extraction for further use.
pub fn extract_and_write(
    config: &ExtractConfig,
    catalog: &Catalog,
    input: &Path,
    output_root: &Path,
    lang: Language,
) -> Result<(Extraction, ProcessedInput)> {
    let dir = input_output_dir(output_root, input);
    let mut diagnostics = FsDiagnosticSink::new(&dir);

    let extraction = Extractor::new(config)
        .extract_path(input, &mut diagnostics)
        .with_context(|| format!("Failed to extract {}", input.display()))?;
    for advisory in &extraction.advisories {
        warn!("{}: {}", input.display(), advisory);
    }

    let export = MetadataExport::from_extraction(&extraction);
    let formatting_warnings = export
        .tables
        .iter()
        .flat_map(|t| &t.measures)
        .filter(|m| m.warning.is_some())
        .count();

    let written = write_model_artifacts(&dir, &export, catalog, lang)?;
    info!("{}: wrote {} artifacts to {}", input.display(), written.len(), dir.display());

    let processed = ProcessedInput {
        output_dir: dir,
        tables: export.summary.total_tables,
        measures: export.summary.total_measures,
        relationships: export.summary.total_relationships,
        formatting_warnings,
        low_confidence: !export.advisories.is_empty(),
    };
    Ok((extraction, processed))
}
