//! Documents assembled from an extracted model.
//!
//! [`MetadataExport`] is the categorized, flattened view every other artifact
//! is built from. All exports are deterministic: the same model always yields
//! byte-identical output.

pub mod agent;
pub mod jsonl;
pub mod markdown;

use serde::Serialize;

use crate::categorize::{
    ColumnCategory, MeasureCategory, categorize_column, categorize_measure, is_technical_table,
};
use crate::dax::{ComplexityLabel, FormattingWarning};
use crate::extract::{Extraction, LowConfidenceDecode};
use crate::model::{Column, Measure, ModelSchema, Relationship, Table};

pub use agent::AgentContext;
pub use jsonl::ContextRecord;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ModelSummary {
    pub total_tables: usize,
    pub business_tables: usize,
    pub technical_tables: usize,
    /// Visible columns only.
    pub total_columns: usize,
    /// Visible measures only.
    pub total_measures: usize,
    pub total_relationships: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnExport {
    pub name: String,
    pub data_type: String,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
    pub category: ColumnCategory,
}

impl From<&Column> for ColumnExport {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            is_hidden: column.is_hidden,
            source_column: column.source_column.clone(),
            format_string: column.format_string.clone(),
            category: categorize_column(&column.data_type, &column.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureExport {
    pub name: String,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_expression: Option<String>,
    /// Formatted text, or the raw expression when formatting was not possible.
    pub displayed_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<FormattingWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_folder: Option<String>,
    pub is_hidden: bool,
    pub category: MeasureCategory,
}

impl From<&Measure> for MeasureExport {
    fn from(measure: &Measure) -> Self {
        Self {
            name: measure.name.clone(),
            expression: measure.raw_expression().to_string(),
            formatted_expression: measure.formatted_expression().map(str::to_string),
            displayed_expression: measure.displayed_expression().to_string(),
            complexity: measure.complexity(),
            warning: measure.warning().cloned(),
            format_string: measure.format_string.clone(),
            display_folder: measure.display_folder.clone(),
            is_hidden: measure.is_hidden,
            category: categorize_measure(&measure.name, measure.raw_expression()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableExport {
    pub name: String,
    pub is_hidden: bool,
    pub is_technical: bool,
    pub partition_count: usize,
    pub columns: Vec<ColumnExport>,
    pub measures: Vec<MeasureExport>,
}

impl TableExport {
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnExport> + '_ {
        self.columns.iter().filter(|c| !c.is_hidden)
    }

    pub fn visible_measures(&self) -> impl Iterator<Item = &MeasureExport> + '_ {
        self.measures.iter().filter(|m| !m.is_hidden)
    }

    /// Hidden tables are documented only for the visible measures they host.
    pub fn is_documented(&self) -> bool {
        !self.is_hidden || self.visible_measures().next().is_some()
    }
}

impl From<&Table> for TableExport {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            is_hidden: table.is_hidden,
            is_technical: is_technical_table(&table.name),
            partition_count: table.partition_count,
            columns: table.columns.iter().map(ColumnExport::from).collect(),
            measures: table.measures.iter().map(MeasureExport::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataExport {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<u64>,
    pub summary: ModelSummary,
    pub tables: Vec<TableExport>,
    pub relationships: Vec<Relationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<LowConfidenceDecode>,
}

impl MetadataExport {
    /// `file_name` is the model's display name, usually the input file stem.
    pub fn build(file_name: &str, schema: &ModelSchema) -> Self {
        let tables: Vec<TableExport> = schema.tables.iter().map(TableExport::from).collect();
        let technical_tables = tables.iter().filter(|t| t.is_technical).count();
        let summary = ModelSummary {
            total_tables: tables.len(),
            business_tables: tables.len() - technical_tables,
            technical_tables,
            total_columns: tables.iter().map(|t| t.visible_columns().count()).sum(),
            total_measures: tables.iter().map(|t| t.visible_measures().count()).sum(),
            total_relationships: schema.relationships.len(),
        };

        Self {
            file_name: file_name.to_string(),
            compatibility_level: schema.compatibility_level,
            summary,
            tables,
            relationships: schema.relationships.clone(),
            advisories: Vec::new(),
        }
    }

    pub fn from_extraction(extraction: &Extraction) -> Self {
        let mut export = Self::build(&file_stem(&extraction.source_name), &extraction.schema);
        export.advisories = extraction.advisories.clone();
        export
    }

    pub fn business_tables(&self) -> impl Iterator<Item = &TableExport> + '_ {
        self.tables.iter().filter(|t| !t.is_technical)
    }

    /// Visible measures of business tables with their table name, in model order.
    pub fn business_measures(&self) -> impl Iterator<Item = (&TableExport, &MeasureExport)> + '_ {
        self.business_tables()
            .flat_map(|t| t.visible_measures().map(move |m| (t, m)))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// File name without directories or extension.
pub fn file_stem(name: &str) -> String {
    std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::config::ExtractConfig;
    use crate::extract::render_measures;
    use crate::model::{
        Cardinality, Column, FilterDirection, Measure, ModelSchema, Relationship, Table,
    };

    fn column(name: &str, data_type: &str, hidden: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_hidden: hidden,
            source_column: None,
            format_string: None,
        }
    }

    fn measure(name: &str, expr: &str, folder: Option<&str>, format: Option<&str>) -> Measure {
        let mut m = Measure::new(name, expr);
        m.display_folder = folder.map(str::to_string);
        m.format_string = format.map(str::to_string);
        m
    }

    /// A small sales model with one technical table and one broken measure.
    pub(crate) fn sales_model() -> ModelSchema {
        let mut schema = ModelSchema {
            compatibility_level: Some(1567),
            tables: vec![
                Table {
                    name: "Sales".to_string(),
                    is_hidden: false,
                    columns: vec![
                        column("OrderDate", "dateTime", false),
                        column("Amount", "decimal", false),
                        column("RowKey", "int64", true),
                    ],
                    measures: vec![
                        measure("Total Revenue", "SUM(Sales[Amount])", Some("KPIs"), Some("#,0")),
                        measure("Gross Margin", "[Total Revenue] - [Total Cost]", None, None),
                        measure("Broken", "CALCULATE([X],FILTER(T,T[c]=1)", None, None),
                    ],
                    partition_count: 1,
                },
                Table {
                    name: "Costs".to_string(),
                    is_hidden: true,
                    columns: vec![column("Cost", "decimal", true)],
                    measures: vec![measure("Total Cost", "SUM(Costs[Cost])", None, None)],
                    partition_count: 1,
                },
                Table {
                    name: "LocalDateTable_1234".to_string(),
                    is_hidden: true,
                    columns: vec![column("Date", "dateTime", false)],
                    measures: Vec::new(),
                    partition_count: 1,
                },
            ],
            relationships: vec![Relationship {
                name: Some("rel-1".to_string()),
                from_table: "Sales".to_string(),
                from_column: "CostKey".to_string(),
                to_table: "Costs".to_string(),
                to_column: "CostKey".to_string(),
                cardinality: Cardinality::ManyToOne,
                cross_filter: FilterDirection::OneDirection,
                is_active: false,
            }],
        };
        let cfg = ExtractConfig::default();
        render_measures(&mut schema, &cfg.format, &cfg.complexity);
        schema
    }
}
