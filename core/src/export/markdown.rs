//! Markdown documentation for humans and retrieval pipelines.

use std::fmt::{self, Write};

use crate::categorize::MeasureCategory;
use crate::export::{MeasureExport, MetadataExport, TableExport};
use crate::i18n::{Catalog, Language};

const KEY_MEASURES_PER_CATEGORY: usize = 5;
const USAGE_GUIDE_ITEMS: usize = 4;

struct Document<'a> {
    export: &'a MetadataExport,
    catalog: &'a Catalog,
    lang: Language,
}

impl<'a> Document<'a> {
    fn t(&self, key: &'a str) -> &'a str {
        self.catalog.text(key, self.lang)
    }

    fn write(&self, out: &mut impl Write) -> fmt::Result {
        self.write_header(out)?;
        self.write_tables(out)?;
        self.write_relationships(out)?;
        self.write_usage_guide(out)?;
        self.write_key_measures(out)
    }

    fn write_header(&self, out: &mut impl Write) -> fmt::Result {
        let summary = &self.export.summary;
        writeln!(
            out,
            "# {} - {}\n",
            self.export.file_name,
            self.t("power_bi_data_model")
        )?;
        writeln!(out, "## {}\n", self.t("model_summary"))?;
        writeln!(out, "- **{}:** {}", self.t("business_tables"), summary.business_tables)?;
        writeln!(out, "- **{}:** {}", self.t("total_columns"), summary.total_columns)?;
        writeln!(out, "- **{}:** {}", self.t("total_measures"), summary.total_measures)?;
        writeln!(
            out,
            "- **{}:** {}\n",
            self.t("relationships"),
            summary.total_relationships
        )?;
        writeln!(out, "---\n")?;
        writeln!(out, "## {}\n", self.t("tables_and_measures"))
    }

    fn write_tables(&self, out: &mut impl Write) -> fmt::Result {
        for table in self.export.business_tables().filter(|t| t.is_documented()) {
            if table.is_hidden {
                writeln!(
                    out,
                    "### {} *({})*\n",
                    table.name,
                    self.t("hidden_table_measures_only")
                )?;
            } else {
                writeln!(out, "### {}\n", table.name)?;
            }
            self.write_columns(out, table)?;
            self.write_measures(out, table)?;
        }
        Ok(())
    }

    fn write_columns(&self, out: &mut impl Write, table: &TableExport) -> fmt::Result {
        let mut columns = table.visible_columns().peekable();
        if columns.peek().is_none() {
            return Ok(());
        }
        writeln!(out, "**{}:**\n", self.t("columns"))?;
        writeln!(
            out,
            "| {} | {} | {} |",
            self.t("column"),
            self.t("type"),
            self.t("category")
        )?;
        writeln!(out, "|--------|------|----------|")?;
        for column in columns {
            writeln!(
                out,
                "| `{}` | {} | {} |",
                column.name,
                column.data_type,
                column.category.as_str()
            )?;
        }
        writeln!(out)
    }

    fn write_measures(&self, out: &mut impl Write, table: &TableExport) -> fmt::Result {
        let visible: Vec<&MeasureExport> = table.visible_measures().collect();
        if visible.is_empty() {
            return Ok(());
        }
        writeln!(out, "**{}:**\n", self.t("measures"))?;
        for category in MeasureCategory::ALL {
            let mut group = visible.iter().filter(|m| m.category == category).peekable();
            if group.peek().is_none() {
                continue;
            }
            writeln!(out, "##### {}\n", self.catalog.category_name(category, self.lang))?;
            for measure in group {
                self.write_measure(out, measure)?;
            }
            writeln!(out)?;
        }
        writeln!(out)
    }

    fn write_measure(&self, out: &mut impl Write, measure: &MeasureExport) -> fmt::Result {
        write!(out, "**{}**", measure.name)?;
        match measure.complexity {
            Some(label) => writeln!(out, " *({})*\n", self.catalog.complexity_label(label, self.lang))?,
            None => writeln!(out, "\n")?,
        }
        if let Some(folder) = &measure.display_folder {
            writeln!(out, "*{}:* `{}`\n", self.t("folder"), folder)?;
        }
        if let Some(warning) = &measure.warning {
            writeln!(out, "> {}: {}\n", self.t("formatting_warning"), warning)?;
        }
        if !measure.displayed_expression.is_empty() {
            writeln!(out, "```dax\n{}\n```\n", measure.displayed_expression)?;
        }
        if let Some(format) = &measure.format_string {
            writeln!(out, "*{}:* `{}`\n", self.t("format"), format)?;
        }
        writeln!(out, "---\n")
    }

    fn write_relationships(&self, out: &mut impl Write) -> fmt::Result {
        if self.export.relationships.is_empty() {
            return Ok(());
        }
        writeln!(out, "## {}\n", self.t("relationships"))?;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            self.t("from"),
            self.t("to"),
            self.t("cardinality"),
            self.t("direction"),
            self.t("active")
        )?;
        writeln!(out, "|------|----|-------------|-----------|--------|")?;
        for rel in &self.export.relationships {
            let active = if rel.is_active { self.t("yes") } else { self.t("no") };
            writeln!(
                out,
                "| {}.{} | {}.{} | {} | {} | {} |",
                rel.from_table,
                rel.from_column,
                rel.to_table,
                rel.to_column,
                rel.cardinality,
                rel.cross_filter.as_str(),
                active
            )?;
        }
        writeln!(out)
    }

    fn write_usage_guide(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "---\n")?;
        writeln!(out, "## {}\n", self.t("ai_agent_usage_guide"))?;
        writeln!(out, "{}\n", self.t("usage_guide_description"))?;
        for (i, item) in self
            .catalog
            .numbered("usage_guide", USAGE_GUIDE_ITEMS, self.lang)
            .iter()
            .enumerate()
        {
            writeln!(out, "{}. {}", i + 1, item)?;
        }
        writeln!(out)
    }

    fn write_key_measures(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "### {}", self.t("key_measures_available"))?;
        let from = self.t("from").to_lowercase();
        for category in MeasureCategory::ALL {
            let mut picks = self
                .export
                .business_measures()
                .filter(|(_, m)| m.category == category)
                .take(KEY_MEASURES_PER_CATEGORY)
                .peekable();
            if picks.peek().is_none() {
                continue;
            }
            writeln!(out, "\n#### {}:\n", self.catalog.category_name(category, self.lang))?;
            for (table, measure) in picks {
                writeln!(out, "- **{}** ({} {})", measure.name, from, table.name)?;
                if let Some(format) = &measure.format_string {
                    writeln!(out, "  - {}: `{}`", self.t("format"), format)?;
                }
            }
        }
        Ok(())
    }
}

/// Renders the full document. Output depends only on the inputs.
pub fn render(export: &MetadataExport, catalog: &Catalog, lang: Language) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = Document {
        export,
        catalog,
        lang,
    }
    .write(&mut out);
    out
}
