use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Context, Result};
use pbi_docs::export::file_stem;
use pbi_docs::{Catalog, ExtractConfig, Language, ModelDiff, diff_models};

use crate::commands::extract::extract_and_write;
use crate::output::json::write_json_file;

/// `diff_<a>_vs_<b>.json`, named after the input file stems.
pub fn diff_file_name(a: &Path, b: &Path) -> String {
    let stem = |p: &Path| file_stem(&p.to_string_lossy());
    format!("diff_{}_vs_{}.json", stem(a), stem(b))
}

/// Writes the full artifact set of both models, then the diff between them.
pub fn run(
    config: &ExtractConfig,
    a: &Path,
    b: &Path,
    output: &Path,
    lang: Language,
) -> Result<ExitCode> {
    let catalog = Catalog::builtin();

    let (model_a, processed_a) = extract_and_write(config, &catalog, a, output, lang)
        .with_context(|| format!("Failed to process base package: {}", a.display()))?;
    let (model_b, processed_b) = extract_and_write(config, &catalog, b, output, lang)
        .with_context(|| format!("Failed to process changed package: {}", b.display()))?;

    let diff = diff_models(
        &model_a.source_name,
        &model_a.schema,
        &model_b.source_name,
        &model_b.schema,
    );

    let path: PathBuf = output.join(diff_file_name(a, b));
    write_json_file(&path, &diff).with_context(|| format!("Failed to write {}", path.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Artifacts written to {}", processed_a.output_dir.display())?;
    writeln!(handle, "Artifacts written to {}", processed_b.output_dir.display())?;
    write_diff_summary(&mut handle, &diff)?;
    writeln!(handle, "Diff written to {}", path.display())?;

    Ok(ExitCode::from(0))
}

fn write_diff_summary<W: Write>(w: &mut W, diff: &ModelDiff) -> Result<()> {
    if diff.is_empty() {
        writeln!(w, "No differences found.")?;
        return Ok(());
    }
    for m in &diff.measures_added {
        writeln!(w, "+ measure {}[{}]", m.table, m.measure)?;
    }
    for m in &diff.measures_removed {
        writeln!(w, "- measure {}[{}]", m.table, m.measure)?;
    }
    for m in &diff.measures_modified {
        writeln!(w, "~ measure {}[{}]", m.table, m.measure)?;
    }
    for r in &diff.relationships_added {
        writeln!(
            w,
            "+ relationship {}.{} -> {}.{}",
            r.from_table, r.from_column, r.to_table, r.to_column
        )?;
    }
    for r in &diff.relationships_removed {
        writeln!(
            w,
            "- relationship {}.{} -> {}.{}",
            r.from_table, r.from_column, r.to_table, r.to_column
        )?;
    }
    Ok(())
}
