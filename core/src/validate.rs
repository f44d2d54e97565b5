//! Shape checks on the repaired payload and conversion into [`ModelSchema`].
//!
//! All type questions about the JSON tree are answered here; later stages only
//! see typed entities. Optional fields that are `null` count as absent.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error_codes;
use crate::model::{
    Cardinality, Column, FilterDirection, Measure, ModelSchema, Multiplicity, Relationship, Table,
};

const ROOT_PATH: &str = "$";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("[PBIDOCS_SCHEMA_001] invalid schema at {path}: expected {expected}, found {found}")]
pub struct SchemaValidationError {
    pub path: String,
    pub expected: &'static str,
    pub found: String,
}

impl SchemaValidationError {
    pub fn code(&self) -> &'static str {
        error_codes::SCHEMA_VALIDATION
    }
}

type ValidationResult<T> = std::result::Result<T, SchemaValidationError>;

fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn mismatch(path: String, expected: &'static str, value: Option<&Value>) -> SchemaValidationError {
    SchemaValidationError {
        path,
        expected,
        found: kind_of(value).to_string(),
    }
}

fn child(path: &str, key: &str) -> String {
    if path == ROOT_PATH {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn indexed(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

fn as_object<'v>(value: Option<&'v Value>, path: &str) -> ValidationResult<&'v Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        other => Err(mismatch(path.to_string(), "object", other)),
    }
}

fn required_array<'v>(map: &'v Map<String, Value>, key: &str, path: &str) -> ValidationResult<&'v [Value]> {
    match map.get(key) {
        Some(Value::Array(items)) => Ok(items),
        other => Err(mismatch(child(path, key), "array", other)),
    }
}

fn optional_array<'v>(map: &'v Map<String, Value>, key: &str, path: &str) -> ValidationResult<&'v [Value]> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        other => Err(mismatch(child(path, key), "array", other)),
    }
}

fn required_string(map: &Map<String, Value>, key: &str, path: &str) -> ValidationResult<String> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(mismatch(child(path, key), "string", other)),
    }
}

fn optional_string(map: &Map<String, Value>, key: &str, path: &str) -> ValidationResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        other => Err(mismatch(child(path, key), "string", other)),
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str, path: &str, default: bool) -> ValidationResult<bool> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        other => Err(mismatch(child(path, key), "boolean", other)),
    }
}

/// Checks the payload shape and builds the typed model.
pub fn validate_schema(root: &Value) -> ValidationResult<ModelSchema> {
    let root_map = as_object(Some(root), ROOT_PATH)?;
    let model_path = child(ROOT_PATH, "model");
    let model = as_object(root_map.get("model"), &model_path)?;

    let compatibility_level = match root_map.get("compatibilityLevel") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_u64(),
        other => {
            return Err(mismatch(
                child(ROOT_PATH, "compatibilityLevel"),
                "number",
                other,
            ))
        }
    };

    let tables_path = child(&model_path, "tables");
    let tables = required_array(model, "tables", &model_path)?
        .iter()
        .enumerate()
        .map(|(i, value)| parse_table(value, &indexed(&tables_path, i)))
        .collect::<ValidationResult<Vec<_>>>()?;

    let relationships_path = child(&model_path, "relationships");
    let relationships = required_array(model, "relationships", &model_path)?
        .iter()
        .enumerate()
        .map(|(i, value)| parse_relationship(value, &indexed(&relationships_path, i)))
        .collect::<ValidationResult<Vec<_>>>()?;

    Ok(ModelSchema {
        compatibility_level,
        tables,
        relationships,
    })
}

fn parse_table(value: &Value, path: &str) -> ValidationResult<Table> {
    let map = as_object(Some(value), path)?;
    let name = required_string(map, "name", path)?;
    let is_hidden = optional_bool(map, "isHidden", path, false)?;

    let columns_path = child(path, "columns");
    let columns = optional_array(map, "columns", path)?
        .iter()
        .enumerate()
        .map(|(i, v)| parse_column(v, &indexed(&columns_path, i)))
        .collect::<ValidationResult<Vec<_>>>()?;

    let measures_path = child(path, "measures");
    let measures = optional_array(map, "measures", path)?
        .iter()
        .enumerate()
        .map(|(i, v)| parse_measure(v, &indexed(&measures_path, i)))
        .collect::<ValidationResult<Vec<_>>>()?;

    let partition_count = optional_array(map, "partitions", path)?.len();

    Ok(Table {
        name,
        is_hidden,
        columns,
        measures,
        partition_count,
    })
}

fn parse_column(value: &Value, path: &str) -> ValidationResult<Column> {
    let map = as_object(Some(value), path)?;
    Ok(Column {
        name: required_string(map, "name", path)?,
        data_type: optional_string(map, "dataType", path)?.unwrap_or_else(|| "unknown".to_string()),
        is_hidden: optional_bool(map, "isHidden", path, false)?,
        source_column: optional_string(map, "sourceColumn", path)?,
        format_string: optional_string(map, "formatString", path)?,
    })
}

fn parse_measure(value: &Value, path: &str) -> ValidationResult<Measure> {
    let map = as_object(Some(value), path)?;
    let name = required_string(map, "name", path)?;

    // Multi-line expressions are stored as an array of lines.
    let expression = match map.get("expression") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => {
            let expr_path = child(path, "expression");
            let mut parts = Vec::with_capacity(lines.len());
            for (i, line) in lines.iter().enumerate() {
                match line {
                    Value::String(s) => parts.push(s.as_str()),
                    other => {
                        return Err(mismatch(indexed(&expr_path, i), "string", Some(other)))
                    }
                }
            }
            parts.join("\n")
        }
        other => {
            return Err(mismatch(
                child(path, "expression"),
                "string or array of strings",
                other,
            ))
        }
    };

    let mut measure = Measure::new(name, expression);
    measure.format_string = optional_string(map, "formatString", path)?;
    measure.display_folder = optional_string(map, "displayFolder", path)?;
    measure.is_hidden = optional_bool(map, "isHidden", path, false)?;
    Ok(measure)
}

fn parse_multiplicity(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    default: Multiplicity,
) -> ValidationResult<Multiplicity> {
    match optional_string(map, key, path)? {
        None => Ok(default),
        Some(raw) => Multiplicity::parse(&raw).ok_or_else(|| SchemaValidationError {
            path: child(path, key),
            expected: "\"one\" or \"many\"",
            found: format!("{:?}", raw),
        }),
    }
}

fn parse_relationship(value: &Value, path: &str) -> ValidationResult<Relationship> {
    let map = as_object(Some(value), path)?;
    let from_table = required_string(map, "fromTable", path)?;
    let from_column = required_string(map, "fromColumn", path)?;
    let to_table = required_string(map, "toTable", path)?;
    let to_column = required_string(map, "toColumn", path)?;

    let from = parse_multiplicity(map, "fromCardinality", path, Multiplicity::Many)?;
    let to = parse_multiplicity(map, "toCardinality", path, Multiplicity::One)?;

    let cross_filter = match optional_string(map, "crossFilteringBehavior", path)? {
        None => FilterDirection::OneDirection,
        Some(raw) => FilterDirection::parse(&raw).ok_or_else(|| SchemaValidationError {
            path: child(path, "crossFilteringBehavior"),
            expected: "oneDirection, bothDirections or automatic",
            found: format!("{:?}", raw),
        })?,
    };

    Ok(Relationship {
        name: optional_string(map, "name", path)?,
        from_table,
        from_column,
        to_table,
        to_column,
        cardinality: Cardinality::from_sides(from, to),
        cross_filter,
        is_active: optional_bool(map, "isActive", path, true)?,
    })
}
