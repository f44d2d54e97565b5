//! Localized strings for generated documents.
//!
//! The library emits canonical identifiers only; document assembly looks up
//! human text here. The catalog is built once and passed by reference.

use rustc_hash::FxHashMap;

use crate::categorize::MeasureCategory;
use crate::dax::ComplexityLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(format!("unsupported language '{}' (expected en or es)", other)),
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("power_bi_data_model", "Power BI Data Model"),
    ("model_summary", "Model Summary"),
    ("business_tables", "Business Tables"),
    ("technical_tables", "Technical Tables"),
    ("total_columns", "Total Columns"),
    ("total_measures", "Total Measures"),
    ("relationships", "Relationships"),
    ("tables_and_measures", "Tables and Measures"),
    ("hidden_table_measures_only", "Hidden Table - Measures Only"),
    ("columns", "Columns"),
    ("column", "Column"),
    ("type", "Type"),
    ("category", "Category"),
    ("measures", "Measures"),
    ("from", "From"),
    ("to", "To"),
    ("cardinality", "Cardinality"),
    ("direction", "Direction"),
    ("active", "Active"),
    ("yes", "Yes"),
    ("no", "No"),
    ("ai_agent_usage_guide", "AI Agent Usage Guide"),
    (
        "usage_guide_description",
        "This document describes a Power BI data model. You can use this information to:",
    ),
    ("usage_guide_1", "Answer business questions about available data"),
    ("usage_guide_2", "Suggest which measures to use for specific analyses"),
    ("usage_guide_3", "Explain relationships between tables"),
    ("usage_guide_4", "Help users understand the data structure"),
    ("key_measures_available", "Key Measures Available:"),
    ("folder", "Folder"),
    ("format", "Format"),
    ("formatting_warning", "Expression could not be formatted"),
    ("complexity_simple", "simple"),
    ("complexity_medium", "medium"),
    ("complexity_complex", "complex"),
    ("category_revenue", "Revenue Measures"),
    ("category_cost", "Cost Measures"),
    ("category_margin", "Margin Measures"),
    ("category_percentage", "Percentage Measures"),
    ("category_ratio", "Ratio Measures"),
    ("category_temporal", "Time-based Measures"),
    ("category_calendar", "Calendar Intelligence"),
    ("category_aggregation", "Aggregation Measures"),
    ("category_filtering", "Filtering Measures"),
    ("category_other", "Other Measures"),
    (
        "agent_usage_note_1",
        "This context contains Power BI model metadata for AI analysis",
    ),
    ("agent_usage_note_2", "Measures are ordered by business importance"),
    (
        "agent_usage_note_3",
        "DAX expressions are formatted for better readability",
    ),
    (
        "agent_usage_note_4",
        "The 'complexity' field indicates the complexity of each measure",
    ),
    ("agent_usage_note_5", "Temporal columns are useful for trend analysis"),
    (
        "agent_usage_note_6",
        "Use relationships to understand the model structure",
    ),
    ("sample_question_1", "What are the main measures in this model?"),
    ("sample_question_2", "What tables are related to sales?"),
    ("sample_question_3", "How is profit margin calculated?"),
    ("sample_question_4", "What temporal columns are available?"),
    ("sample_question_5", "What are the relationships between tables?"),
    ("sample_question_6", "Which measures are more complex to understand?"),
    (
        "sample_question_7",
        "How can I use revenue measures in my analysis?",
    ),
];

const ES: &[(&str, &str)] = &[
    ("power_bi_data_model", "Modelo de Datos de Power BI"),
    ("model_summary", "Resumen del Modelo"),
    ("business_tables", "Tablas de Negocio"),
    ("technical_tables", "Tablas Técnicas"),
    ("total_columns", "Total de Columnas"),
    ("total_measures", "Total de Medidas"),
    ("relationships", "Relaciones"),
    ("tables_and_measures", "Tablas y Medidas"),
    ("hidden_table_measures_only", "Tabla Oculta - Solo Medidas"),
    ("columns", "Columnas"),
    ("column", "Columna"),
    ("type", "Tipo"),
    ("category", "Categoría"),
    ("measures", "Medidas"),
    ("from", "Desde"),
    ("to", "Hacia"),
    ("cardinality", "Cardinalidad"),
    ("direction", "Dirección"),
    ("active", "Activa"),
    ("yes", "Sí"),
    ("no", "No"),
    ("ai_agent_usage_guide", "Guía de Uso para Agentes de IA"),
    (
        "usage_guide_description",
        "Este documento describe un modelo de datos de Power BI. Puedes usar esta información para:",
    ),
    (
        "usage_guide_1",
        "Responder preguntas de negocio sobre los datos disponibles",
    ),
    ("usage_guide_2", "Sugerir qué medidas usar para análisis específicos"),
    ("usage_guide_3", "Explicar las relaciones entre tablas"),
    (
        "usage_guide_4",
        "Ayudar a los usuarios a entender la estructura de datos",
    ),
    ("key_measures_available", "Medidas Clave Disponibles:"),
    ("folder", "Carpeta"),
    ("format", "Formato"),
    ("formatting_warning", "No se pudo formatear la expresión"),
    ("complexity_simple", "simple"),
    ("complexity_medium", "medio"),
    ("complexity_complex", "complejo"),
    ("category_revenue", "Medidas de Ingresos"),
    ("category_cost", "Medidas de Costos"),
    ("category_margin", "Medidas de Margen"),
    ("category_percentage", "Medidas de Porcentaje"),
    ("category_ratio", "Medidas de Razón"),
    ("category_temporal", "Medidas Temporales"),
    ("category_calendar", "Inteligencia de Calendario"),
    ("category_aggregation", "Medidas de Agregación"),
    ("category_filtering", "Medidas de Filtrado"),
    ("category_other", "Otras Medidas"),
    (
        "agent_usage_note_1",
        "Este contexto contiene metadatos del modelo de Power BI para análisis con IA",
    ),
    (
        "agent_usage_note_2",
        "Las medidas están ordenadas por importancia de negocio",
    ),
    (
        "agent_usage_note_3",
        "Las expresiones DAX están formateadas para mejor legibilidad",
    ),
    (
        "agent_usage_note_4",
        "El campo 'complexity' indica la complejidad de cada medida",
    ),
    (
        "agent_usage_note_5",
        "Las columnas temporales son útiles para análisis de tendencias",
    ),
    (
        "agent_usage_note_6",
        "Usa las relaciones para entender la estructura del modelo",
    ),
    (
        "sample_question_1",
        "¿Cuáles son las principales medidas en este modelo?",
    ),
    ("sample_question_2", "¿Qué tablas están relacionadas con ventas?"),
    ("sample_question_3", "¿Cómo se calcula el margen de ganancia?"),
    ("sample_question_4", "¿Qué columnas temporales están disponibles?"),
    ("sample_question_5", "¿Cuáles son las relaciones entre tablas?"),
    ("sample_question_6", "¿Qué medidas son más complejas de entender?"),
    (
        "sample_question_7",
        "¿Cómo puedo usar las medidas de ingresos en mi análisis?",
    ),
];

pub const SAMPLE_QUESTION_COUNT: usize = 7;
pub const USAGE_NOTE_COUNT: usize = 6;

#[derive(Debug, Clone)]
pub struct Catalog {
    en: FxHashMap<&'static str, &'static str>,
    es: FxHashMap<&'static str, &'static str>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            en: EN.iter().copied().collect(),
            es: ES.iter().copied().collect(),
        }
    }

    /// Falls back to English, then to the key itself.
    pub fn text<'a>(&'a self, key: &'a str, lang: Language) -> &'a str {
        let table = match lang {
            Language::En => &self.en,
            Language::Es => &self.es,
        };
        table
            .get(key)
            .or_else(|| self.en.get(key))
            .copied()
            .unwrap_or(key)
    }

    pub fn category_name(&self, category: MeasureCategory, lang: Language) -> &str {
        let key = format!("category_{}", category.as_str());
        let found = match lang {
            Language::En => self.en.get(key.as_str()),
            Language::Es => self.es.get(key.as_str()),
        };
        found.copied().unwrap_or_else(|| category.as_str())
    }

    pub fn complexity_label(&self, label: ComplexityLabel, lang: Language) -> &str {
        let key = format!("complexity_{}", label.as_str());
        let found = match lang {
            Language::En => self.en.get(key.as_str()),
            Language::Es => self.es.get(key.as_str()),
        };
        found.copied().unwrap_or_else(|| label.as_str())
    }

    pub fn numbered(&self, prefix: &str, count: usize, lang: Language) -> Vec<String> {
        (1..=count)
            .map(|i| self.text(&format!("{}_{}", prefix, i), lang).to_string())
            .collect()
    }
}
