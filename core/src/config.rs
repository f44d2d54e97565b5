//! Configuration for extraction and expression layout.
//!
//! `ExtractConfig` centralizes the payload names, container limits, layout
//! options and complexity policy so the pipeline never reaches for hidden
//! constants. It is built once per run and handed to each component by
//! reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::ContainerLimits;
use crate::error_codes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// Thresholds and function registry used to label measure complexity.
///
/// A measure is `simple` when its deepest call nesting is at most
/// `simple_max_depth` and it calls no registered function; `medium` when the
/// depth is at most `medium_max_depth` or it makes exactly
/// `medium_match_count` registered calls; `complex` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityPolicy {
    pub simple_max_depth: usize,
    pub medium_max_depth: usize,
    pub medium_match_count: usize,
    pub complex_functions: Vec<String>,
}

const DEFAULT_COMPLEX_FUNCTIONS: &[&str] = &[
    // iterators over tables
    "SUMX",
    "AVERAGEX",
    "COUNTX",
    "COUNTAX",
    "MINX",
    "MAXX",
    "MEDIANX",
    "PRODUCTX",
    "RANKX",
    "CONCATENATEX",
    // filter context
    "FILTER",
    "ALL",
    "ALLEXCEPT",
    "ALLSELECTED",
    "REMOVEFILTERS",
    "KEEPFILTERS",
    "CALCULATETABLE",
    "USERELATIONSHIP",
    "CROSSFILTER",
    "TREATAS",
    // time intelligence
    "DATEADD",
    "DATESYTD",
    "DATESQTD",
    "DATESMTD",
    "DATESBETWEEN",
    "DATESINPERIOD",
    "TOTALYTD",
    "TOTALQTD",
    "TOTALMTD",
    "SAMEPERIODLASTYEAR",
    "PARALLELPERIOD",
    "PREVIOUSYEAR",
    "PREVIOUSQUARTER",
    "PREVIOUSMONTH",
    "PREVIOUSDAY",
    "NEXTYEAR",
    "NEXTQUARTER",
    "NEXTMONTH",
    "NEXTDAY",
    // safe division
    "DIVIDE",
];

impl Default for ComplexityPolicy {
    fn default() -> Self {
        Self {
            simple_max_depth: 1,
            medium_max_depth: 3,
            medium_match_count: 1,
            complex_functions: DEFAULT_COMPLEX_FUNCTIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Entry name tried first when locating the schema payload.
    pub payload_entry: String,
    /// Alternative entry names, tried in order after `payload_entry`.
    #[serde(alias = "aliases")]
    pub payload_aliases: Vec<String>,
    pub limits: ContainerLimits,
    /// Upper bound on the raw text persisted with a diagnostic report.
    pub max_snippet_chars: usize,
    pub format: FormatOptions,
    pub complexity: ComplexityPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            payload_entry: "DataModelSchema".to_string(),
            payload_aliases: vec!["DataModel".to_string(), "model.json".to_string()],
            limits: ContainerLimits::default(),
            max_snippet_chars: 500,
            format: FormatOptions::default(),
            complexity: ComplexityPolicy::default(),
        }
    }
}

impl ExtractConfig {
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            inner: ExtractConfig::default(),
        }
    }

    /// Parses a JSON configuration document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ExtractConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payload_entry.trim().is_empty() {
            return Err(ConfigError::EmptyPayloadEntry);
        }
        ensure_non_zero(self.format.indent_width, "format.indent_width")?;
        ensure_non_zero(self.max_snippet_chars, "max_snippet_chars")?;
        ensure_non_zero(self.limits.max_entries, "limits.max_entries")?;

        if self.complexity.simple_max_depth > self.complexity.medium_max_depth {
            return Err(ConfigError::InvertedDepthThresholds {
                simple: self.complexity.simple_max_depth,
                medium: self.complexity.medium_max_depth,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("[PBIDOCS_CONFIG_001] payload_entry must not be empty")]
    EmptyPayloadEntry,
    #[error("[PBIDOCS_CONFIG_001] {field} must be greater than zero")]
    NonPositive { field: &'static str },
    #[error(
        "[PBIDOCS_CONFIG_001] complexity.simple_max_depth ({simple}) exceeds complexity.medium_max_depth ({medium})"
    )]
    InvertedDepthThresholds { simple: usize, medium: usize },
    #[error("[PBIDOCS_CONFIG_001] malformed configuration: {message}")]
    Malformed { message: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        error_codes::CONFIG_INVALID
    }
}

fn ensure_non_zero(value: usize, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositive { field });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ExtractConfigBuilder {
    inner: ExtractConfig,
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        ExtractConfig::builder()
    }
}

impl ExtractConfigBuilder {
    pub fn payload_entry(mut self, value: impl Into<String>) -> Self {
        self.inner.payload_entry = value.into();
        self
    }

    pub fn payload_aliases<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.payload_aliases = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn limits(mut self, value: ContainerLimits) -> Self {
        self.inner.limits = value;
        self
    }

    pub fn max_snippet_chars(mut self, value: usize) -> Self {
        self.inner.max_snippet_chars = value;
        self
    }

    pub fn indent_width(mut self, value: usize) -> Self {
        self.inner.format.indent_width = value;
        self
    }

    pub fn complexity(mut self, value: ComplexityPolicy) -> Self {
        self.inner.complexity = value;
        self
    }

    pub fn build(self) -> Result<ExtractConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let cfg = ExtractConfig::default();
        assert_eq!(cfg.payload_entry, "DataModelSchema");
        assert_eq!(cfg.payload_aliases, vec!["DataModel", "model.json"]);
        assert_eq!(cfg.max_snippet_chars, 500);
        assert_eq!(cfg.format.indent_width, 4);
        assert_eq!(cfg.complexity.simple_max_depth, 1);
        assert_eq!(cfg.complexity.medium_max_depth, 3);
        assert!(cfg.complexity.complex_functions.iter().any(|f| f == "FILTER"));
        assert!(!cfg.complexity.complex_functions.iter().any(|f| f == "CALCULATE"));
    }

    #[test]
    fn serde_roundtrip_preserves_defaults() {
        let cfg = ExtractConfig::default();
        let json = serde_json::to_string(&cfg).expect("serialize default config");
        let parsed = ExtractConfig::from_json(&json).expect("deserialize default config");
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let cfg = ExtractConfig::from_json(r#"{"format": {"indent_width": 2}, "aliases": ["x.json"]}"#)
            .expect("partial config should parse");
        assert_eq!(cfg.format.indent_width, 2);
        assert_eq!(cfg.payload_aliases, vec!["x.json"]);
        assert_eq!(cfg.payload_entry, "DataModelSchema");
    }

    #[test]
    fn builder_rejects_zero_indent() {
        let err = ExtractConfig::builder()
            .indent_width(0)
            .build()
            .expect_err("zero indent must be rejected");
        assert_eq!(
            err,
            ConfigError::NonPositive {
                field: "format.indent_width"
            }
        );
    }

    #[test]
    fn inverted_depth_thresholds_are_rejected() {
        let policy = ComplexityPolicy {
            simple_max_depth: 4,
            medium_max_depth: 2,
            ..ComplexityPolicy::default()
        };
        let err = ExtractConfig::builder()
            .complexity(policy)
            .build()
            .expect_err("simple depth above medium depth is invalid");
        assert!(matches!(
            err,
            ConfigError::InvertedDepthThresholds { simple: 4, medium: 2 }
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = ExtractConfig::from_json("{ not json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
