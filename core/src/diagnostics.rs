//! Diagnostic artifacts for payloads that could not be recovered.
//!
//! When extraction of an input fails after the payload was read, the
//! extractor hands a [`DiagnosticReport`] with a bounded raw-text snippet to a
//! [`DiagnosticSink`] before returning the error.

use serde::Serialize;

use crate::encoding::Encoding;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub source_name: String,
    pub entry: Option<String>,
    pub encoding: Option<Encoding>,
    pub error: String,
    pub snippet: String,
}

impl DiagnosticReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("source: {}\n", self.source_name));
        if let Some(entry) = &self.entry {
            out.push_str(&format!("entry: {}\n", entry));
        }
        if let Some(encoding) = self.encoding {
            out.push_str(&format!("encoding: {}\n", encoding));
        }
        out.push_str(&format!("error: {}\n", self.error));
        out.push_str("--- snippet ---\n");
        out.push_str(&self.snippet);
        if !self.snippet.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Consumer of diagnostic reports.
pub trait DiagnosticSink {
    fn record(&mut self, report: DiagnosticReport) -> Result<(), DiagnosticError>;
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiagnosticError {
    #[cfg(feature = "std-fs")]
    #[error(transparent)]
    Write(#[from] crate::write::WriteError),
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn record(&mut self, _report: DiagnosticReport) -> Result<(), DiagnosticError> {
        Ok(())
    }
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct VecDiagnostics {
    reports: Vec<DiagnosticReport>,
}

impl VecDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[DiagnosticReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<DiagnosticReport> {
        self.reports
    }
}

impl DiagnosticSink for VecDiagnostics {
    fn record(&mut self, report: DiagnosticReport) -> Result<(), DiagnosticError> {
        self.reports.push(report);
        Ok(())
    }
}

/// Writes `<dir>/<stem>.diagnostic.txt` per report.
#[cfg(feature = "std-fs")]
#[derive(Debug, Clone)]
pub struct FsDiagnosticSink {
    dir: std::path::PathBuf,
    written: Vec<std::path::PathBuf>,
}

#[cfg(feature = "std-fs")]
impl FsDiagnosticSink {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[std::path::PathBuf] {
        &self.written
    }

    fn file_name(source_name: &str) -> String {
        let stem = std::path::Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("input");
        format!("{}.diagnostic.txt", stem)
    }
}

#[cfg(feature = "std-fs")]
impl DiagnosticSink for FsDiagnosticSink {
    fn record(&mut self, report: DiagnosticReport) -> Result<(), DiagnosticError> {
        let path = self.dir.join(Self::file_name(&report.source_name));
        crate::write::write_atomic(&path, report.render_text().as_bytes())?;
        log::info!("diagnostic written to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// At most `max_chars` characters of `text`, centred on `around` when given.
pub fn snippet(text: &str, around: Option<usize>, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let start = match around {
        Some(offset) => offset
            .min(total)
            .saturating_sub(max_chars / 2)
            .min(total - max_chars),
        None => 0,
    };
    text.chars().skip(start).take(max_chars).collect()
}

/// Character offset of a 1-based line/column position as reported by
/// `serde_json` (columns count bytes).
pub fn char_offset(text: &str, line: usize, column: usize) -> usize {
    let mut byte = 0;
    for (index, content) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            byte += column.saturating_sub(1).min(content.len());
            break;
        }
        byte += content.len();
    }
    text.char_indices().take_while(|(i, _)| *i < byte).count()
}
