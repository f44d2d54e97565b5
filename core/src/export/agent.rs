//! Compact JSON context for LLM agents.

use serde::Serialize;

use crate::categorize::{ColumnCategory, MeasureCategory};
use crate::dax::{ComplexityLabel, FormattingWarning};
use crate::export::MetadataExport;
use crate::i18n::{Catalog, Language, SAMPLE_QUESTION_COUNT, USAGE_NOTE_COUNT};

pub const MAX_KEY_MEASURES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    /// Business tables only.
    pub total_tables: usize,
    pub total_measures: usize,
    pub total_relationships: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<u64>,
    /// Names may be garbled: the schema only decoded through the lossy fallback.
    pub low_confidence_decode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMeasure {
    pub name: String,
    pub table: String,
    pub expression: String,
    pub formatted_expression: String,
    pub category: MeasureCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
    /// Set when `formatted_expression` is the raw text because layout failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<FormattingWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalColumn {
    pub name: String,
    pub table: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentContext {
    pub model_name: String,
    pub summary: AgentSummary,
    pub key_measures: Vec<KeyMeasure>,
    pub temporal_columns: Vec<TemporalColumn>,
    pub sample_questions: Vec<String>,
    pub usage_notes: Vec<String>,
}

impl AgentContext {
    pub fn build(export: &MetadataExport, catalog: &Catalog, lang: Language) -> Self {
        let mut key_measures: Vec<KeyMeasure> = export
            .business_measures()
            .map(|(table, m)| KeyMeasure {
                name: m.name.clone(),
                table: table.name.clone(),
                expression: m.expression.clone(),
                formatted_expression: m.displayed_expression.clone(),
                category: m.category,
                complexity: m.complexity,
                format_string: m.format_string.clone(),
                warning: m.warning.clone(),
            })
            .collect();
        // Stable sort keeps model order among equal names.
        key_measures.sort_by(|a, b| {
            a.category
                .priority()
                .cmp(&b.category.priority())
                .then_with(|| a.name.cmp(&b.name))
        });
        key_measures.truncate(MAX_KEY_MEASURES);

        let temporal_columns = export
            .business_tables()
            .flat_map(|table| {
                table
                    .visible_columns()
                    .filter(|c| c.category == ColumnCategory::Temporal)
                    .map(move |c| TemporalColumn {
                        name: c.name.clone(),
                        table: table.name.clone(),
                        data_type: c.data_type.clone(),
                    })
            })
            .collect();

        Self {
            model_name: export.file_name.clone(),
            summary: AgentSummary {
                total_tables: export.summary.business_tables,
                total_measures: export.summary.total_measures,
                total_relationships: export.summary.total_relationships,
                compatibility_level: export.compatibility_level,
                low_confidence_decode: !export.advisories.is_empty(),
            },
            key_measures,
            temporal_columns,
            sample_questions: catalog.numbered("sample_question", SAMPLE_QUESTION_COUNT, lang),
            usage_notes: catalog.numbered("agent_usage_note", USAGE_NOTE_COUNT, lang),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::sales_model;
    use crate::model::{Measure, ModelSchema, Table};

    #[test]
    fn key_measures_follow_category_priority_then_name() {
        let export = MetadataExport::build("Sales", &sales_model());
        let ctx = AgentContext::build(&export, &Catalog::builtin(), Language::En);
        let names: Vec<&str> = ctx.key_measures.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Total Revenue", "Total Cost", "Gross Margin", "Broken"]);
        assert_eq!(ctx.key_measures[0].formatted_expression, "SUM(\n    Sales[Amount]\n)");
        assert_eq!(ctx.summary.total_tables, 2);
        assert!(!ctx.summary.low_confidence_decode);
    }

    #[test]
    fn unformatted_key_measure_keeps_warning() {
        let export = MetadataExport::build("Sales", &sales_model());
        let ctx = AgentContext::build(&export, &Catalog::builtin(), Language::En);
        let broken = ctx
            .key_measures
            .iter()
            .find(|m| m.name == "Broken")
            .expect("Broken is a key measure");
        assert!(broken.warning.is_some());
        assert_eq!(broken.formatted_expression, broken.expression);
        assert!(ctx.key_measures[0].warning.is_none());
    }

    #[test]
    fn temporal_columns_exclude_technical_tables() {
        let export = MetadataExport::build("Sales", &sales_model());
        let ctx = AgentContext::build(&export, &Catalog::builtin(), Language::En);
        assert_eq!(
            ctx.temporal_columns,
            vec![TemporalColumn {
                name: "OrderDate".to_string(),
                table: "Sales".to_string(),
                data_type: "dateTime".to_string(),
            }]
        );
    }

    #[test]
    fn key_measures_are_capped() {
        let measures = (0..30)
            .map(|i| Measure::new(format!("M{:02}", i), "1"))
            .collect();
        let schema = ModelSchema {
            compatibility_level: None,
            tables: vec![Table {
                name: "Fact".to_string(),
                is_hidden: false,
                columns: Vec::new(),
                measures,
                partition_count: 0,
            }],
            relationships: Vec::new(),
        };
        let export = MetadataExport::build("Big", &schema);
        let ctx = AgentContext::build(&export, &Catalog::builtin(), Language::Es);
        assert_eq!(ctx.key_measures.len(), MAX_KEY_MEASURES);
        assert_eq!(ctx.key_measures[19].name, "M19");
        assert_eq!(ctx.sample_questions.len(), SAMPLE_QUESTION_COUNT);
        assert_eq!(ctx.usage_notes[0], catalog_note());
    }

    fn catalog_note() -> String {
        Catalog::builtin()
            .text("agent_usage_note_1", Language::Es)
            .to_string()
    }
}
