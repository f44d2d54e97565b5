//! PBI Docs: schema extraction and DAX layout for Power BI template packages.
//!
//! This crate provides functionality for:
//! - Opening `.pbit` ZIP containers under configurable size limits
//! - Locating, decoding and repairing the embedded `DataModelSchema` payload
//! - Validating the payload into a typed [`ModelSchema`]
//! - Formatting and scoring DAX measure expressions
//! - Comparing two models and exporting documentation artifacts
//!
//! # Quick Start
//!
//! ```ignore
//! use pbi_docs::{ExtractConfig, Extractor, NullDiagnostics};
//!
//! let config = ExtractConfig::default();
//! let extraction = Extractor::new(&config)
//!     .extract_path("Sales.pbit".as_ref(), &mut NullDiagnostics)?;
//!
//! for (table, measure) in extraction.schema.measures() {
//!     println!("{}[{}]\n{}", table.name, measure.name, measure.displayed_expression());
//! }
//! ```

mod categorize;
mod config;
mod container;
pub mod dax;
mod diagnostics;
mod encoding;
pub mod error_codes;
pub mod export;
mod extract;
mod i18n;
mod locate;
mod model;
mod model_diff;
mod repair;
mod validate;
#[cfg(feature = "std-fs")]
mod write;

pub use categorize::{
    ColumnCategory, MeasureCategory, categorize_column, categorize_measure, is_technical_table,
};
pub use config::{ComplexityPolicy, ConfigError, ExtractConfig, ExtractConfigBuilder, FormatOptions};
#[cfg(feature = "std-fs")]
pub use container::open_container;
pub use container::{Container, ContainerError, ContainerLimits, MemoryContainer, ZipContainer};
pub use dax::{
    ComplexityLabel, FormattingWarning, MeasureRenderer, MeasureRendering, format_expression,
};
#[cfg(feature = "std-fs")]
pub use diagnostics::FsDiagnosticSink;
pub use diagnostics::{
    DiagnosticError, DiagnosticReport, DiagnosticSink, NullDiagnostics, VecDiagnostics,
};
pub use encoding::{DecodeAttempt, DecodedPayload, Encoding, decode_payload};
pub use export::{AgentContext, ContextRecord, MetadataExport};
pub use extract::{
    ExtractError, Extraction, Extractor, LowConfidenceDecode, PayloadInfo, render_measures,
};
pub use i18n::{Catalog, Language};
pub use locate::{MatchKind, PayloadCandidate, PayloadLocator};
pub use model::{
    Cardinality, Column, FilterDirection, Measure, ModelSchema, Multiplicity, Relationship,
    RelationshipKey, Table,
};
pub use model_diff::{MeasureRef, ModelDiff, RelationshipRef, diff_models};
pub use repair::{RepairOutcome, repair_json};
pub use validate::{SchemaValidationError, validate_schema};
#[cfg(feature = "std-fs")]
pub use write::{WriteError, write_atomic};
