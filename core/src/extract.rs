//! The extraction pipeline: locate, decode, repair, validate, render.

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ComplexityPolicy, ExtractConfig, FormatOptions};
use crate::container::{Container, ContainerError};
use crate::dax::MeasureRenderer;
use crate::diagnostics::{DiagnosticReport, DiagnosticSink, char_offset, snippet};
use crate::encoding::{DecodeAttempt, DecodedPayload, Encoding, decode_payload};
use crate::error_codes;
use crate::locate::{MatchKind, PayloadCandidate, PayloadLocator, payload_not_found};
use crate::model::ModelSchema;
use crate::repair::{RepairOutcome, repair_json};
use crate::validate::{SchemaValidationError, validate_schema};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(
        "[PBIDOCS_EXTRACT_001] payload not found; visible entries: [{}]",
        .available.join(", ")
    )]
    PayloadNotFound { available: Vec<String> },
    #[error(
        "[PBIDOCS_EXTRACT_002] '{entry}' is not valid JSON after repair (line {line}, column {column}): {message}"
    )]
    Parse {
        entry: String,
        line: usize,
        column: usize,
        message: String,
    },
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),
}

impl ExtractError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::Container(e) => e.code(),
            ExtractError::PayloadNotFound { .. } => error_codes::EXTRACT_PAYLOAD_NOT_FOUND,
            ExtractError::Parse { .. } => error_codes::EXTRACT_PARSE,
            ExtractError::Validation(e) => e.code(),
        }
    }
}

/// Advisory: the payload only decoded through the lossy Latin-1 fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowConfidenceDecode {
    pub entry: String,
    pub attempts: Vec<DecodeAttempt>,
}

impl std::fmt::Display for LowConfidenceDecode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' decoded as latin-1 after {} failed attempt(s); non-ASCII text may be wrong",
            self.entry,
            self.attempts.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadInfo {
    pub entry: String,
    pub match_kind: MatchKind,
    pub encoding: Encoding,
    pub attempts: Vec<DecodeAttempt>,
    pub comments_removed: usize,
    pub trailing_commas_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub source_name: String,
    pub payload: PayloadInfo,
    pub schema: ModelSchema,
    pub advisories: Vec<LowConfidenceDecode>,
}

struct CandidateFailure {
    error: ExtractError,
    report: Option<DiagnosticReport>,
}

pub struct Extractor<'c> {
    config: &'c ExtractConfig,
}

impl<'c> Extractor<'c> {
    pub fn new(config: &'c ExtractConfig) -> Self {
        Self { config }
    }

    /// Opens the package at `path` and extracts its schema.
    #[cfg(feature = "std-fs")]
    pub fn extract_path(
        &self,
        path: impl AsRef<std::path::Path>,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<Extraction, ExtractError> {
        let path = path.as_ref();
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut container = crate::container::open_container(path, self.config.limits)?;
        self.extract_container(&source_name, &mut container, diagnostics)
    }

    /// Tries each payload candidate in order; the first one that decodes,
    /// parses and validates wins. When all fail, the last failure is recorded
    /// with `diagnostics` and returned.
    pub fn extract_container(
        &self,
        source_name: &str,
        container: &mut dyn Container,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<Extraction, ExtractError> {
        let names = container.entry_names();
        let candidates = PayloadLocator::from_config(self.config).candidates(&names);
        if candidates.is_empty() {
            return Err(payload_not_found(&names));
        }

        let mut last_failure = None;
        for candidate in candidates {
            debug!(
                "{}: trying payload entry '{}' ({:?} match)",
                source_name, candidate.name, candidate.kind
            );
            match self.try_candidate(source_name, container, &candidate) {
                Ok(mut extraction) => {
                    let warnings = render_measures(
                        &mut extraction.schema,
                        &self.config.format,
                        &self.config.complexity,
                    );
                    info!(
                        "{}: extracted {} tables, {} measures, {} relationships from '{}'",
                        source_name,
                        extraction.schema.tables.len(),
                        extraction.schema.measure_count(),
                        extraction.schema.relationships.len(),
                        candidate.name
                    );
                    if warnings > 0 {
                        warn!("{}: {} measure(s) could not be formatted", source_name, warnings);
                    }
                    return Ok(extraction);
                }
                Err(failure) => {
                    debug!("{}: entry '{}' rejected: {}", source_name, candidate.name, failure.error);
                    last_failure = Some(failure);
                }
            }
        }

        let Some(failure) = last_failure else {
            return Err(payload_not_found(&names));
        };
        if let Some(report) = failure.report {
            if let Err(e) = diagnostics.record(report) {
                warn!("{}: could not persist diagnostic: {}", source_name, e);
            }
        }
        Err(failure.error)
    }

    fn try_candidate(
        &self,
        source_name: &str,
        container: &mut dyn Container,
        candidate: &PayloadCandidate,
    ) -> Result<Extraction, CandidateFailure> {
        let bytes = container
            .read_entry(&candidate.name)
            .map_err(|e| CandidateFailure {
                error: e.into(),
                report: None,
            })?;

        let decoded = decode_payload(&bytes);
        debug!(
            "{}: '{}' decoded as {} after {} rejected attempt(s)",
            source_name,
            candidate.name,
            decoded.encoding,
            decoded.attempts.len()
        );

        let repaired = repair_json(&decoded.text);
        if repaired.changed() {
            debug!(
                "{}: repair removed {} comment(s) and {} trailing comma(s)",
                source_name, repaired.comments_removed, repaired.trailing_commas_removed
            );
        }

        let value: serde_json::Value = match serde_json::from_str(&repaired.text) {
            Ok(value) => value,
            Err(e) => {
                let offset = char_offset(&repaired.text, e.line(), e.column());
                let error = ExtractError::Parse {
                    entry: candidate.name.clone(),
                    line: e.line(),
                    column: e.column(),
                    message: e.to_string(),
                };
                let report = self.report(source_name, candidate, &decoded, &repaired, Some(offset), &error);
                return Err(CandidateFailure {
                    error,
                    report: Some(report),
                });
            }
        };

        let schema = validate_schema(&value).map_err(|e| {
            let error = ExtractError::Validation(e);
            let report = self.report(source_name, candidate, &decoded, &repaired, None, &error);
            CandidateFailure {
                error,
                report: Some(report),
            }
        })?;

        let mut advisories = Vec::new();
        if decoded.low_confidence() {
            let advisory = LowConfidenceDecode {
                entry: candidate.name.clone(),
                attempts: decoded.attempts.clone(),
            };
            warn!("{}: {}", source_name, advisory);
            advisories.push(advisory);
        }

        Ok(Extraction {
            source_name: source_name.to_string(),
            payload: PayloadInfo {
                entry: candidate.name.clone(),
                match_kind: candidate.kind,
                encoding: decoded.encoding,
                attempts: decoded.attempts,
                comments_removed: repaired.comments_removed,
                trailing_commas_removed: repaired.trailing_commas_removed,
            },
            schema,
            advisories,
        })
    }

    fn report(
        &self,
        source_name: &str,
        candidate: &PayloadCandidate,
        decoded: &DecodedPayload,
        repaired: &RepairOutcome,
        offset: Option<usize>,
        error: &ExtractError,
    ) -> DiagnosticReport {
        DiagnosticReport {
            source_name: source_name.to_string(),
            entry: Some(candidate.name.clone()),
            encoding: Some(decoded.encoding),
            error: error.to_string(),
            snippet: snippet(&repaired.text, offset, self.config.max_snippet_chars),
        }
    }
}

/// Formats and scores every measure in place. Returns the number of
/// measures whose expression was left unformatted because of a warning.
pub fn render_measures(
    schema: &mut ModelSchema,
    options: &FormatOptions,
    policy: &ComplexityPolicy,
) -> usize {
    let renderer = MeasureRenderer::new(options, policy);
    let mut warnings = 0;
    for table in &mut schema.tables {
        for measure in &mut table.measures {
            if measure.rendering().is_some() {
                continue;
            }
            let rendering = renderer.render(measure.raw_expression());
            if let Some(warning) = &rendering.warning {
                warn!("measure '{}'[{}]: {}", table.name, measure.name, warning);
                warnings += 1;
            }
            measure.attach_rendering(rendering);
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::dax::ComplexityLabel;
    use crate::diagnostics::{NullDiagnostics, VecDiagnostics};

    const SCHEMA: &str = r#"{
        // exported by Power BI
        "model": {
            "tables": [{"name": "Sales", "measures": [
                {"name": "Total", "expression": "SUM(Sales[Amount])"},
            ]}],
            "relationships": [],
        }
    }"#;

    fn extract(container: &mut MemoryContainer) -> Result<Extraction, ExtractError> {
        let cfg = ExtractConfig::default();
        Extractor::new(&cfg).extract_container("test.pbit", container, &mut NullDiagnostics)
    }

    #[test]
    fn lenient_payload_is_repaired_and_rendered() {
        let mut container = MemoryContainer::new()
            .with_entry("Version", "1.28")
            .with_entry("DataModelSchema", SCHEMA);
        let extraction = extract(&mut container).expect("extract");
        assert_eq!(extraction.payload.entry, "DataModelSchema");
        assert_eq!(extraction.payload.comments_removed, 1);
        assert_eq!(extraction.payload.trailing_commas_removed, 2);
        let measure = &extraction.schema.tables[0].measures[0];
        assert_eq!(measure.complexity(), Some(ComplexityLabel::Simple));
        assert_eq!(
            measure.formatted_expression(),
            Some("SUM(\n    Sales[Amount]\n)")
        );
        assert!(extraction.advisories.is_empty());
    }

    #[test]
    fn falls_back_to_next_candidate() {
        let mut container = MemoryContainer::new()
            .with_entry("DataModelSchema", "{ not json")
            .with_entry("DataModel", SCHEMA);
        let extraction = extract(&mut container).expect("alias should succeed");
        assert_eq!(extraction.payload.entry, "DataModel");
        assert_eq!(extraction.payload.match_kind, MatchKind::Alias);
    }

    #[test]
    fn missing_payload_lists_entries() {
        let mut container = MemoryContainer::new().with_entry("Report/Layout", "{}");
        let err = extract(&mut container).expect_err("no payload");
        assert_eq!(err.code(), "PBIDOCS_EXTRACT_001");
    }

    #[test]
    fn parse_failure_records_bounded_snippet() {
        let cfg = ExtractConfig::builder()
            .max_snippet_chars(8)
            .build()
            .expect("config");
        let mut container =
            MemoryContainer::new().with_entry("DataModelSchema", "{\"model\": {\"tables\": [1 2]}}");
        let mut sink = VecDiagnostics::new();
        let err = Extractor::new(&cfg)
            .extract_container("bad.pbit", &mut container, &mut sink)
            .expect_err("parse error");
        assert!(matches!(err, ExtractError::Parse { line: 1, .. }));
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].entry.as_deref(), Some("DataModelSchema"));
        assert!(reports[0].snippet.chars().count() <= 8);
        assert!(reports[0].snippet.contains('2'));
    }

    #[test]
    fn validation_failure_is_fatal() {
        let mut container = MemoryContainer::new()
            .with_entry("DataModelSchema", r#"{"model": {"tables": {}}}"#);
        match extract(&mut container) {
            Err(ExtractError::Validation(e)) => assert_eq!(e.path, "model.tables"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn latin1_payload_carries_advisory() {
        let mut bytes = br#"{"model":{"tables":[{"name":"Caf"#.to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(br#""}],"relationships":[]}}"#);
        let mut container = MemoryContainer::new().with_entry("DataModelSchema", bytes);
        let extraction = extract(&mut container).expect("latin-1 still parses");
        assert_eq!(extraction.payload.encoding, Encoding::Latin1);
        assert_eq!(extraction.advisories.len(), 1);
        assert_eq!(extraction.schema.tables[0].name, "Café");
    }

    #[test]
    fn render_measures_skips_rendered_measures() {
        let mut container = MemoryContainer::new().with_entry("DataModelSchema", SCHEMA);
        let mut extraction = extract(&mut container).expect("extract");
        let before = extraction.schema.clone();
        let cfg = ExtractConfig::default();
        let warnings = render_measures(&mut extraction.schema, &cfg.format, &cfg.complexity);
        assert_eq!(warnings, 0);
        assert_eq!(extraction.schema, before);
    }
}
