//! Structural comparison of two extracted models.
//!
//! Measures are keyed by (table, measure) name and relationships by their
//! from/to table-column pair. Reported items keep each model's discovery
//! order; neither input is modified.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::model::{ModelSchema, Relationship, RelationshipKey};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MeasureRef {
    pub table: String,
    pub measure: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationshipRef {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl From<&Relationship> for RelationshipRef {
    fn from(rel: &Relationship) -> Self {
        Self {
            from_table: rel.from_table.clone(),
            from_column: rel.from_column.clone(),
            to_table: rel.to_table.clone(),
            to_column: rel.to_column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ModelDiff {
    pub a_model: String,
    pub b_model: String,
    pub measures_added: Vec<MeasureRef>,
    pub measures_removed: Vec<MeasureRef>,
    /// Present in both models with a different raw expression.
    pub measures_modified: Vec<MeasureRef>,
    pub relationships_added: Vec<RelationshipRef>,
    pub relationships_removed: Vec<RelationshipRef>,
}

impl ModelDiff {
    pub fn is_empty(&self) -> bool {
        self.measures_added.is_empty()
            && self.measures_removed.is_empty()
            && self.measures_modified.is_empty()
            && self.relationships_added.is_empty()
            && self.relationships_removed.is_empty()
    }
}

fn measure_index(schema: &ModelSchema) -> FxHashMap<(&str, &str), &str> {
    schema
        .measures()
        .map(|(table, m)| ((table.name.as_str(), m.name.as_str()), m.raw_expression()))
        .collect()
}

fn relationship_keys(schema: &ModelSchema) -> FxHashSet<RelationshipKey<'_>> {
    schema.relationships.iter().map(Relationship::key).collect()
}

fn measures_missing_from(
    source: &ModelSchema,
    other: &FxHashMap<(&str, &str), &str>,
) -> Vec<MeasureRef> {
    source
        .measures()
        .filter(|(table, m)| !other.contains_key(&(table.name.as_str(), m.name.as_str())))
        .map(|(table, m)| MeasureRef {
            table: table.name.clone(),
            measure: m.name.clone(),
        })
        .collect()
}

fn relationships_missing_from(
    source: &ModelSchema,
    other: &FxHashSet<RelationshipKey<'_>>,
) -> Vec<RelationshipRef> {
    source
        .relationships
        .iter()
        .filter(|rel| !other.contains(&rel.key()))
        .map(RelationshipRef::from)
        .collect()
}

pub fn diff_models(
    a_name: &str,
    a: &ModelSchema,
    b_name: &str,
    b: &ModelSchema,
) -> ModelDiff {
    let a_measures = measure_index(a);
    let b_measures = measure_index(b);

    let measures_modified = b
        .measures()
        .filter(|(table, m)| {
            a_measures
                .get(&(table.name.as_str(), m.name.as_str()))
                .is_some_and(|expr| *expr != m.raw_expression())
        })
        .map(|(table, m)| MeasureRef {
            table: table.name.clone(),
            measure: m.name.clone(),
        })
        .collect();

    let a_rels = relationship_keys(a);
    let b_rels = relationship_keys(b);

    ModelDiff {
        a_model: a_name.to_string(),
        b_model: b_name.to_string(),
        measures_added: measures_missing_from(b, &a_measures),
        measures_removed: measures_missing_from(a, &b_measures),
        measures_modified,
        relationships_added: relationships_missing_from(b, &a_rels),
        relationships_removed: relationships_missing_from(a, &b_rels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, FilterDirection, Measure, Table};

    fn table(name: &str, measures: &[(&str, &str)]) -> Table {
        Table {
            name: name.to_string(),
            is_hidden: false,
            columns: Vec::new(),
            measures: measures
                .iter()
                .map(|(n, e)| Measure::new(*n, *e))
                .collect(),
            partition_count: 0,
        }
    }

    fn rel(from: &str, to: &str) -> Relationship {
        Relationship {
            name: None,
            from_table: from.to_string(),
            from_column: "Key".to_string(),
            to_table: to.to_string(),
            to_column: "Key".to_string(),
            cardinality: Cardinality::ManyToOne,
            cross_filter: FilterDirection::OneDirection,
            is_active: true,
        }
    }

    fn schema(tables: Vec<Table>, relationships: Vec<Relationship>) -> ModelSchema {
        ModelSchema {
            compatibility_level: None,
            tables,
            relationships,
        }
    }

    #[test]
    fn measure_swap_is_reported_both_ways() {
        let a = schema(vec![table("Fact", &[("M1", "1")])], vec![rel("Fact", "Dim")]);
        let b = schema(vec![table("Fact", &[("M2", "2")])], vec![rel("Fact", "Dim")]);
        let diff = diff_models("a.pbit", &a, "b.pbit", &b);
        assert_eq!(
            diff.measures_removed,
            vec![MeasureRef {
                table: "Fact".to_string(),
                measure: "M1".to_string()
            }]
        );
        assert_eq!(diff.measures_added[0].measure, "M2");
        assert!(diff.measures_modified.is_empty());
        assert!(diff.relationships_added.is_empty());
        assert!(diff.relationships_removed.is_empty());
    }

    #[test]
    fn order_follows_discovery_not_sorting() {
        let a = schema(vec![], vec![]);
        let b = schema(
            vec![table("Zeta", &[("b", "1"), ("a", "1")]), table("Alpha", &[("c", "1")])],
            vec![rel("Z", "Y"), rel("A", "B")],
        );
        let diff = diff_models("a", &a, "b", &b);
        let names: Vec<&str> = diff.measures_added.iter().map(|m| m.measure.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(diff.relationships_added[0].from_table, "Z");
    }

    #[test]
    fn relationship_identity_ignores_cardinality() {
        let mut changed = rel("Fact", "Dim");
        changed.cardinality = Cardinality::OneToOne;
        let a = schema(vec![], vec![rel("Fact", "Dim")]);
        let b = schema(vec![], vec![changed]);
        assert!(diff_models("a", &a, "b", &b).is_empty());
    }

    #[test]
    fn changed_expression_is_modified() {
        let a = schema(vec![table("Fact", &[("M", "SUM(x)")])], vec![]);
        let b = schema(vec![table("Fact", &[("M", "SUM(y)")])], vec![]);
        let diff = diff_models("a", &a, "b", &b);
        assert_eq!(diff.measures_modified.len(), 1);
        assert!(diff.measures_added.is_empty());
    }
}
