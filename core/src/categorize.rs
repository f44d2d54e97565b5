//! Keyword-based business categories for tables, columns and measures.
//!
//! Rules match lowercase substrings in English and Spanish. Measure names are
//! checked before expressions, so `Revenue %` is a revenue measure even though
//! its expression divides.

use serde::Serialize;

const TECHNICAL_TABLE_PREFIXES: &[&str] = &["LocalDateTable_", "DateTableTemplate_", "ParameterTable_"];

/// Auto-generated date and parameter tables that carry no business meaning.
pub fn is_technical_table(name: &str) -> bool {
    TECHNICAL_TABLE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureCategory {
    Revenue,
    Cost,
    Margin,
    Percentage,
    Ratio,
    Temporal,
    Calendar,
    Aggregation,
    Filtering,
    Other,
}

impl MeasureCategory {
    /// Every category in business priority order.
    pub const ALL: [MeasureCategory; 10] = [
        MeasureCategory::Revenue,
        MeasureCategory::Cost,
        MeasureCategory::Margin,
        MeasureCategory::Percentage,
        MeasureCategory::Ratio,
        MeasureCategory::Temporal,
        MeasureCategory::Calendar,
        MeasureCategory::Aggregation,
        MeasureCategory::Filtering,
        MeasureCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureCategory::Revenue => "revenue",
            MeasureCategory::Cost => "cost",
            MeasureCategory::Margin => "margin",
            MeasureCategory::Percentage => "percentage",
            MeasureCategory::Ratio => "ratio",
            MeasureCategory::Temporal => "temporal",
            MeasureCategory::Calendar => "calendar",
            MeasureCategory::Aggregation => "aggregation",
            MeasureCategory::Filtering => "filtering",
            MeasureCategory::Other => "other",
        }
    }

    /// Position in [`MeasureCategory::ALL`]; lower is more important.
    pub fn priority(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnCategory {
    Identifier,
    Temporal,
    Metric,
    Numeric,
    Descriptive,
    Categorical,
    Other,
}

impl ColumnCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnCategory::Identifier => "identifier",
            ColumnCategory::Temporal => "temporal",
            ColumnCategory::Metric => "metric",
            ColumnCategory::Numeric => "numeric",
            ColumnCategory::Descriptive => "descriptive",
            ColumnCategory::Categorical => "categorical",
            ColumnCategory::Other => "other",
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Ordered name rules; the first hit wins.
const NAME_RULES: &[(&[&str], MeasureCategory)] = &[
    (&["revenue", "sales", "ventas", "ingresos"], MeasureCategory::Revenue),
    (&["cost", "costo", "expense", "gasto"], MeasureCategory::Cost),
    (&["margin", "margen", "profit", "beneficio"], MeasureCategory::Margin),
    (
        &["%", "percent", "porcentaje", "ratio", "rate"],
        MeasureCategory::Percentage,
    ),
    (&["ytd", "sply", "year", "año", "period"], MeasureCategory::Temporal),
];

pub fn categorize_measure(name: &str, expression: &str) -> MeasureCategory {
    let name = name.to_lowercase();
    let expr = expression.to_lowercase();

    for (keywords, category) in NAME_RULES {
        if contains_any(&name, keywords) {
            return *category;
        }
    }

    if contains_any(&name, &["count", "total", "sum", "number"])
        && contains_any(&expr, &["sum", "count", "total"])
    {
        return MeasureCategory::Aggregation;
    }
    if contains_any(&expr, &["/", "divide", "%"]) {
        return MeasureCategory::Ratio;
    }
    if contains_any(&expr, &["dateadd", "datesytd", "datesmtd", "datesqtd"]) {
        return MeasureCategory::Calendar;
    }
    if contains_any(&expr, &["filter", "all", "selectedvalue", "hasonevalue"]) {
        return MeasureCategory::Filtering;
    }
    MeasureCategory::Other
}

pub fn categorize_column(data_type: &str, name: &str) -> ColumnCategory {
    let name = name.to_lowercase();

    if contains_any(&name, &["id", "sk.", "ck.", "key"]) {
        return ColumnCategory::Identifier;
    }
    if matches!(data_type, "dateTime" | "date") || contains_any(&name, &["fecha", "date"]) {
        return ColumnCategory::Temporal;
    }
    match data_type {
        "int64" | "double" | "decimal" => {
            if contains_any(&name, &["cantidad", "monto", "total", "count", "amount"]) {
                ColumnCategory::Metric
            } else {
                ColumnCategory::Numeric
            }
        }
        "string" => {
            if contains_any(&name, &["nombre", "descripcion", "name", "description"]) {
                ColumnCategory::Descriptive
            } else {
                ColumnCategory::Categorical
            }
        }
        _ => ColumnCategory::Other,
    }
}
