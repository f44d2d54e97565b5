//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use pbi_docs::{ExtractConfig, Extraction, Extractor, VecDiagnostics, ZipContainer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A schema payload with comments and trailing commas, as Power BI writes it.
pub const SALES_SCHEMA: &str = r##"{
  "name": "SemanticModel",
  "compatibilityLevel": 1567,
  "model": {
    // tables
    "tables": [
      {
        "name": "Sales",
        "columns": [
          { "name": "OrderDate", "dataType": "dateTime" },
          { "name": "Amount", "dataType": "decimal", "formatString": "#,0.00" },
          { "name": "CustomerKey", "dataType": "int64", "isHidden": true },
        ],
        "measures": [
          {
            "name": "Total Revenue",
            "expression": "SUM(Sales[Amount])",
            "formatString": "#,0",
            "displayFolder": "KPIs"
          },
          {
            "name": "YTD Gross Margin LY",
            "expression": [
              "CALCULATE([YTD Gross Margin],",
              "SAMEPERIODLASTYEAR(DATESYTD('Date'[Date])))"
            ]
          },
          { "name": "Broken", "expression": "CALCULATE([X],FILTER(T,T[c]=1)" },
        ],
        "partitions": [ { "name": "p0" } ]
      },
      {
        "name": "Customer",
        "columns": [
          { "name": "CustomerKey", "dataType": "int64" },
          { "name": "Name", "dataType": "string" }
        ]
      },
      /* auto-generated */
      {
        "name": "LocalDateTable_0a1b",
        "isHidden": true,
        "columns": [ { "name": "Date", "dataType": "dateTime" } ]
      }
    ],
    "relationships": [
      {
        "name": "5f1c",
        "fromTable": "Sales",
        "fromColumn": "CustomerKey",
        "toTable": "Customer",
        "toColumn": "CustomerKey",
      }
    ]
  }
}"##;

pub fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(contents).expect("write zip entry contents");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Writes a package under `dir` and returns its path.
pub fn write_package(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, make_zip(entries)).expect("write package");
    path
}

pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

pub fn extract_bytes(
    config: &ExtractConfig,
    entries: &[(&str, &[u8])],
    diagnostics: &mut VecDiagnostics,
) -> Result<Extraction, pbi_docs::ExtractError> {
    let mut container =
        ZipContainer::open_from_reader_with_limits(Cursor::new(make_zip(entries)), config.limits)
            .expect("open in-memory package");
    Extractor::new(config).extract_container("test.pbit", &mut container, diagnostics)
}
