//! DAX expression layout and scoring.

pub mod complexity;
pub mod format;
pub mod lexer;

use serde::Serialize;

pub use complexity::{ComplexityLabel, ComplexityScore, ComplexityScorer};
pub use format::{FormattingWarning, format_expression, format_tokens};
pub use lexer::{Token, TokenKind, significant_tokens, tokenize};

use crate::config::{ComplexityPolicy, FormatOptions};

/// Derived presentation of one measure expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureRendering {
    /// `None` when the expression is unbalanced.
    pub formatted: Option<String>,
    pub complexity: ComplexityLabel,
    pub max_depth: usize,
    pub complex_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<FormattingWarning>,
}

impl MeasureRendering {
    pub fn displayed<'a>(&'a self, raw: &'a str) -> &'a str {
        self.formatted.as_deref().unwrap_or(raw)
    }
}

/// Formats and scores expressions with one set of options and one registry.
#[derive(Debug, Clone)]
pub struct MeasureRenderer {
    options: FormatOptions,
    scorer: ComplexityScorer,
}

impl MeasureRenderer {
    pub fn new(options: &FormatOptions, policy: &ComplexityPolicy) -> Self {
        Self {
            options: options.clone(),
            scorer: ComplexityScorer::new(policy),
        }
    }

    pub fn render(&self, raw: &str) -> MeasureRendering {
        let tokens = significant_tokens(raw);
        let score = self.scorer.score(&tokens);
        let (formatted, warning) = match format_tokens(&tokens, &self.options) {
            Ok(text) => (Some(text), None),
            Err(warning) => (None, Some(warning)),
        };
        MeasureRendering {
            formatted,
            complexity: score.label,
            max_depth: score.max_depth,
            complex_matches: score.complex_matches,
            warning,
        }
    }
}

pub fn render(raw: &str, options: &FormatOptions, policy: &ComplexityPolicy) -> MeasureRendering {
    MeasureRenderer::new(options, policy).render(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_expression_renders_with_label() {
        let r = render(
            "SUM([Revenue])",
            &FormatOptions::default(),
            &ComplexityPolicy::default(),
        );
        assert_eq!(r.formatted.as_deref(), Some("SUM(\n    [Revenue]\n)"));
        assert_eq!(r.complexity, ComplexityLabel::Simple);
        assert!(r.warning.is_none());
    }

    #[test]
    fn unbalanced_expression_keeps_raw_for_display() {
        let raw = "CALCULATE([X],FILTER(T,T[c]=1)";
        let r = render(raw, &FormatOptions::default(), &ComplexityPolicy::default());
        assert!(r.formatted.is_none());
        assert!(matches!(r.warning, Some(FormattingWarning::Unclosed { .. })));
        assert_eq!(r.displayed(raw), raw);
        assert_eq!(r.complexity, ComplexityLabel::Medium);
    }
}
