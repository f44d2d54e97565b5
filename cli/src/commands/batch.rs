use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Context, Result, bail};
use globset::{GlobBuilder, GlobMatcher};
use log::{error, info};
use pbi_docs::{Catalog, ExtractConfig, ExtractError, Language};
use serde::Serialize;
use walkdir::WalkDir;

use crate::commands::extract::{ProcessedInput, process_input};
use crate::output::json::write_json_file;

pub const SUMMARY_FILE: &str = "batch_summary.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub input: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessedInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub pattern: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

fn has_glob_meta(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Leading path components of `pattern` that contain no glob syntax; `None`
/// when the pattern is relative and starts with a glob.
fn literal_root(pattern: &str) -> Option<PathBuf> {
    let mut root = PathBuf::new();
    for component in Path::new(pattern).components() {
        if has_glob_meta(&component.as_os_str().to_string_lossy()) {
            break;
        }
        root.push(component);
    }
    if root.as_os_str().is_empty() {
        None
    } else {
        Some(root)
    }
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// Files under the pattern's literal prefix that match it, sorted.
pub fn collect_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = build_matcher(pattern)?;
    let root = literal_root(pattern);
    let walk_root = root.clone().unwrap_or_else(|| PathBuf::from("."));

    let mut files = Vec::new();
    for entry in WalkDir::new(&walk_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        // walkdir yields `./a.pbit` for a pattern written as `*.pbit`
        let candidate = if root.is_none() {
            path.strip_prefix(".").unwrap_or(path)
        } else {
            path
        };
        if matcher.is_match(candidate) {
            files.push(candidate.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn error_code(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ExtractError>() {
            return Some(e.code());
        }
        cause.downcast_ref::<pbi_docs::WriteError>().map(|e| e.code())
    })
}

pub fn run(config: &ExtractConfig, pattern: &str, output: &Path, lang: Language) -> Result<ExitCode> {
    let inputs = collect_inputs(pattern)?;
    if inputs.is_empty() {
        bail!("No files match pattern: {}", pattern);
    }
    info!("batch: {} input(s) match {}", inputs.len(), pattern);

    let catalog = Catalog::builtin();
    let mut items = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let item = match process_input(config, &catalog, input, output, lang) {
            Ok(result) => {
                info!("batch: {} ok", input.display());
                BatchItem {
                    input: input.display().to_string(),
                    status: ItemStatus::Ok,
                    result: Some(result),
                    error_code: None,
                    error: None,
                }
            }
            Err(e) => {
                error!("batch: {}: {:#}", input.display(), e);
                BatchItem {
                    input: input.display().to_string(),
                    status: ItemStatus::Failed,
                    result: None,
                    error_code: error_code(&e),
                    error: Some(format!("{:#}", e)),
                }
            }
        };
        items.push(item);
    }

    let failed = items
        .iter()
        .filter(|item| matches!(item.status, ItemStatus::Failed))
        .count();
    let summary = BatchSummary {
        pattern: pattern.to_string(),
        total: items.len(),
        succeeded: items.len() - failed,
        failed,
        items,
    };

    let summary_path = output.join(SUMMARY_FILE);
    write_json_file(&summary_path, &summary)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Processed {} file(s): {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    )?;
    writeln!(handle, "Summary written to {}", summary_path.display())?;

    if failed > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::from(0))
    }
}
