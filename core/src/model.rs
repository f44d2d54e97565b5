//! Typed tabular model recovered from the schema payload.
//!
//! Everything here is built once by [`crate::validate`] and is read-only
//! afterwards, apart from the single rendering attached to each measure.

use serde::Serialize;

use crate::dax::{ComplexityLabel, FormattingWarning, MeasureRendering};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ModelSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<u64>,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl ModelSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Every measure paired with its owning table, in discovery order.
    pub fn measures(&self) -> impl Iterator<Item = (&Table, &Measure)> + '_ {
        self.tables
            .iter()
            .flat_map(|table| table.measures.iter().map(move |m| (table, m)))
    }

    pub fn measure_count(&self) -> usize {
        self.tables.iter().map(|t| t.measures.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub is_hidden: bool,
    pub columns: Vec<Column>,
    pub measures: Vec<Measure>,
    pub partition_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
}

/// A named DAX expression. The raw expression is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub name: String,
    #[serde(rename = "expression")]
    raw_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_folder: Option<String>,
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendering: Option<MeasureRendering>,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_expression: expression.into(),
            format_string: None,
            display_folder: None,
            is_hidden: false,
            rendering: None,
        }
    }

    pub fn raw_expression(&self) -> &str {
        &self.raw_expression
    }

    pub fn rendering(&self) -> Option<&MeasureRendering> {
        self.rendering.as_ref()
    }

    /// Stores the derived layout; later calls are ignored and return `false`.
    pub(crate) fn attach_rendering(&mut self, rendering: MeasureRendering) -> bool {
        if self.rendering.is_some() {
            return false;
        }
        self.rendering = Some(rendering);
        true
    }

    pub fn formatted_expression(&self) -> Option<&str> {
        self.rendering.as_ref().and_then(|r| r.formatted.as_deref())
    }

    pub fn complexity(&self) -> Option<ComplexityLabel> {
        self.rendering.as_ref().map(|r| r.complexity)
    }

    pub fn warning(&self) -> Option<&FormattingWarning> {
        self.rendering.as_ref().and_then(|r| r.warning.as_ref())
    }

    /// Formatted text when available, otherwise the raw expression unmodified.
    pub fn displayed_expression(&self) -> &str {
        self.formatted_expression().unwrap_or(&self.raw_expression)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    One,
    Many,
}

impl Multiplicity {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("one") {
            Some(Multiplicity::One)
        } else if value.eq_ignore_ascii_case("many") {
            Some(Multiplicity::Many)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    #[serde(rename = "one:one")]
    OneToOne,
    #[serde(rename = "one:many")]
    OneToMany,
    #[serde(rename = "many:one")]
    ManyToOne,
    #[serde(rename = "many:many")]
    ManyToMany,
}

impl Cardinality {
    pub fn from_sides(from: Multiplicity, to: Multiplicity) -> Self {
        match (from, to) {
            (Multiplicity::One, Multiplicity::One) => Cardinality::OneToOne,
            (Multiplicity::One, Multiplicity::Many) => Cardinality::OneToMany,
            (Multiplicity::Many, Multiplicity::One) => Cardinality::ManyToOne,
            (Multiplicity::Many, Multiplicity::Many) => Cardinality::ManyToMany,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one:one",
            Cardinality::OneToMany => "one:many",
            Cardinality::ManyToOne => "many:one",
            Cardinality::ManyToMany => "many:many",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterDirection {
    OneDirection,
    BothDirections,
    Automatic,
}

impl FilterDirection {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("oneDirection") {
            Some(FilterDirection::OneDirection)
        } else if value.eq_ignore_ascii_case("bothDirections") {
            Some(FilterDirection::BothDirections)
        } else if value.eq_ignore_ascii_case("automatic") {
            Some(FilterDirection::Automatic)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterDirection::OneDirection => "oneDirection",
            FilterDirection::BothDirections => "bothDirections",
            FilterDirection::Automatic => "automatic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Relationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub cardinality: Cardinality,
    pub cross_filter: FilterDirection,
    pub is_active: bool,
}

/// Identity of a relationship: the from/to table-column pair.
pub type RelationshipKey<'a> = (&'a str, &'a str, &'a str, &'a str);

impl Relationship {
    pub fn key(&self) -> RelationshipKey<'_> {
        (
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        )
    }
}
