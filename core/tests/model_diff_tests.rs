mod common;

use common::extract_bytes;
use pbi_docs::{ExtractConfig, MeasureRef, ModelSchema, VecDiagnostics, diff_models};

fn schema_with_measure(measure: &str) -> ModelSchema {
    let payload = format!(
        r#"{{
          "model": {{
            "tables": [
              {{ "name": "Fact", "measures": [ {{ "name": "{measure}", "expression": "SUM(Fact[v])" }} ] }},
              {{ "name": "Dim" }}
            ],
            "relationships": [
              {{ "fromTable": "Fact", "fromColumn": "k", "toTable": "Dim", "toColumn": "k" }}
            ]
          }}
        }}"#
    );
    extract_bytes(
        &ExtractConfig::default(),
        &[("DataModelSchema", payload.as_bytes())],
        &mut VecDiagnostics::new(),
    )
    .expect("extraction should succeed")
    .schema
}

#[test]
fn swapped_measure_reports_removed_and_added() {
    let a = schema_with_measure("M1");
    let b = schema_with_measure("M2");
    let before = a.clone();

    let diff = diff_models("a.pbit", &a, "b.pbit", &b);

    assert_eq!(
        diff.measures_removed,
        vec![MeasureRef {
            table: "Fact".to_string(),
            measure: "M1".to_string(),
        }]
    );
    assert_eq!(
        diff.measures_added,
        vec![MeasureRef {
            table: "Fact".to_string(),
            measure: "M2".to_string(),
        }]
    );
    assert!(diff.relationships_added.is_empty());
    assert!(diff.relationships_removed.is_empty());
    assert_eq!(a, before, "diff must not modify its inputs");
}

#[test]
fn identical_models_produce_empty_diff() {
    let a = schema_with_measure("M1");
    let diff = diff_models("a", &a, "a", &a.clone());
    assert!(diff.is_empty());

    let json = serde_json::to_value(&diff).expect("serialize diff");
    assert_eq!(json["a_model"], "a");
    assert_eq!(json["measures_added"], serde_json::json!([]));
}
