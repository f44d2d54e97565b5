//! One-record-per-line context for embedding and retrieval.

use std::io::{self, Write};
use serde::Serialize;

use crate::categorize::MeasureCategory;
use crate::dax::{ComplexityLabel, FormattingWarning};
use crate::export::{MeasureExport, MetadataExport, ModelSummary, TableExport};
use crate::model::{Cardinality, FilterDirection, Relationship};

const TABLE_PROMPT_MEASURES: usize = 3;
const TABLE_SUMMARY_MEASURES: usize = 5;
const TABLE_PROMPT_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnBrief {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContextRecord {
    Model {
        id: String,
        title: String,
        summary: ModelSummary,
        #[serde(skip_serializing_if = "Option::is_none")]
        compatibility_level: Option<u64>,
        /// The schema text only decoded through the lossy fallback encoding.
        low_confidence_decode: bool,
        sample_prompts: Vec<String>,
        short_summary: String,
    },
    Table {
        id: String,
        title: String,
        columns: Vec<ColumnBrief>,
        sample_prompts: Vec<String>,
        short_summary: String,
    },
    Measure {
        id: String,
        title: String,
        expression: String,
        formatted_expression: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        format_string: Option<String>,
        category: MeasureCategory,
        #[serde(skip_serializing_if = "Option::is_none")]
        complexity: Option<ComplexityLabel>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<FormattingWarning>,
        sample_prompts: Vec<String>,
        short_summary: String,
    },
    Relationship {
        id: String,
        title: String,
        from_table: String,
        from_column: String,
        to_table: String,
        to_column: String,
        cardinality: Cardinality,
        cross_filter: FilterDirection,
        is_active: bool,
        sample_prompts: Vec<String>,
        short_summary: String,
    },
}

impl ContextRecord {
    pub fn id(&self) -> &str {
        match self {
            ContextRecord::Model { id, .. }
            | ContextRecord::Table { id, .. }
            | ContextRecord::Measure { id, .. }
            | ContextRecord::Relationship { id, .. } => id,
        }
    }
}

fn model_record(export: &MetadataExport) -> ContextRecord {
    let summary = &export.summary;
    ContextRecord::Model {
        id: "model_overview".to_string(),
        title: format!("Model: {}", export.file_name),
        summary: summary.clone(),
        compatibility_level: export.compatibility_level,
        low_confidence_decode: !export.advisories.is_empty(),
        sample_prompts: vec![
            "How many tables does this model have?".to_string(),
            "What are the main measures in the model?".to_string(),
            "Explain the general structure of the model".to_string(),
            "What tables are related?".to_string(),
        ],
        short_summary: format!(
            "Power BI model with {} business tables, {} measures and {} relationships",
            summary.business_tables, summary.total_measures, summary.total_relationships
        ),
    }
}

fn table_record(table: &TableExport) -> ContextRecord {
    let columns: Vec<ColumnBrief> = table
        .visible_columns()
        .map(|c| ColumnBrief {
            name: c.name.clone(),
            data_type: c.data_type.clone(),
        })
        .collect();
    let measures: Vec<&MeasureExport> = table.visible_measures().collect();

    let mut sample_prompts = Vec::new();
    for m in measures.iter().take(TABLE_PROMPT_MEASURES) {
        sample_prompts.push(format!(
            "What is the measure that calculates {}?",
            m.name.to_lowercase()
        ));
        sample_prompts.push(format!("Explain how the {} measure works", m.name));
    }
    sample_prompts.push(format!("What relationships does the {} table have?", table.name));
    sample_prompts.push(format!("Explain the structure of the {} table", table.name));
    sample_prompts.truncate(TABLE_PROMPT_LIMIT);

    let mut short_summary = format!("Table {}", table.name);
    if !columns.is_empty() {
        short_summary.push_str(&format!(" with {} columns", columns.len()));
    }
    if !measures.is_empty() {
        let names: Vec<&str> = measures
            .iter()
            .take(TABLE_SUMMARY_MEASURES)
            .map(|m| m.name.as_str())
            .collect();
        short_summary.push_str(&format!(". Contains measures: {}", names.join(", ")));
    }

    let title = if table.is_hidden {
        format!("{} (Hidden)", table.name)
    } else {
        table.name.clone()
    };

    ContextRecord::Table {
        id: table.name.clone(),
        title,
        columns,
        sample_prompts,
        short_summary,
    }
}

fn measure_record(table: &TableExport, measure: &MeasureExport) -> ContextRecord {
    let name = &measure.name;
    let mut sample_prompts = vec![
        format!("What does the {} measure calculate?", name),
        format!("Explain the formula for {}", name),
        format!("How to use {} in an analysis?", name),
        format!("What filters can I apply to {}?", name),
    ];
    match measure.complexity {
        Some(ComplexityLabel::Complex) => {
            sample_prompts.push(format!("Why is the {} measure complex?", name));
            sample_prompts.push(format!("How to simplify {}?", name));
        }
        Some(ComplexityLabel::Simple) => {
            sample_prompts.push(format!("How to optimize {}?", name));
            sample_prompts.push(format!("What variations of {} exist?", name));
        }
        Some(ComplexityLabel::Medium) | None => {}
    }

    let category = measure.category.as_str();
    let mut short_summary = format!("Measure {} of type {}", name, category);
    if let Some(format) = &measure.format_string {
        short_summary.push_str(&format!(" with format {}", format));
    }
    if measure.warning.is_some() {
        short_summary.push_str(" (shown unformatted)");
    }

    ContextRecord::Measure {
        id: format!("{}.{}", table.name, name),
        title: format!("{} ({})", name, category),
        expression: measure.expression.clone(),
        formatted_expression: measure.displayed_expression.clone(),
        format_string: measure.format_string.clone(),
        category: measure.category,
        complexity: measure.complexity,
        warning: measure.warning.clone(),
        sample_prompts,
        short_summary,
    }
}

fn relationship_record(index: usize, rel: &Relationship) -> ContextRecord {
    let from = format!("{}.{}", rel.from_table, rel.from_column);
    let to = format!("{}.{}", rel.to_table, rel.to_column);
    let id = rel
        .name
        .clone()
        .unwrap_or_else(|| format!("relationship_{}", index + 1));

    let mut short_summary = format!("Relationship {} between {} and {}", rel.cardinality, from, to);
    if !rel.is_active {
        short_summary.push_str(" (inactive)");
    }

    ContextRecord::Relationship {
        title: format!("Relationship: {} -> {}", rel.from_table, rel.to_table),
        sample_prompts: vec![
            format!("How are {} and {} related?", rel.from_table, rel.to_table),
            format!(
                "Explain the cardinality between {} and {}",
                rel.from_table, rel.to_table
            ),
            format!("What does the {} relationship mean?", id),
            format!("How does filtering affect the relationship {} -> {}?", from, to),
        ],
        id,
        from_table: rel.from_table.clone(),
        from_column: rel.from_column.clone(),
        to_table: rel.to_table.clone(),
        to_column: rel.to_column.clone(),
        cardinality: rel.cardinality,
        cross_filter: rel.cross_filter,
        is_active: rel.is_active,
        short_summary,
    }
}

/// Model record, then each documented business table followed by its visible
/// measures, then every relationship.
pub fn records(export: &MetadataExport) -> Vec<ContextRecord> {
    let mut out = vec![model_record(export)];
    for table in export.business_tables().filter(|t| t.is_documented()) {
        out.push(table_record(table));
        out.extend(table.visible_measures().map(|m| measure_record(table, m)));
    }
    out.extend(
        export
            .relationships
            .iter()
            .enumerate()
            .map(|(i, rel)| relationship_record(i, rel)),
    );
    out
}

pub fn write_jsonl<W: Write>(w: &mut W, records: &[ContextRecord]) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *w, record)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

pub fn to_jsonl(records: &[ContextRecord]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_jsonl(&mut buf, records)?;
    Ok(buf)
}
