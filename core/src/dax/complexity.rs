//! Coarse complexity labels for measures.

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::lexer::{Token, TokenKind};
use crate::config::ComplexityPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLabel {
    Simple,
    Medium,
    Complex,
}

impl ComplexityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityLabel::Simple => "simple",
            ComplexityLabel::Medium => "medium",
            ComplexityLabel::Complex => "complex",
        }
    }
}

impl std::fmt::Display for ComplexityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexityScore {
    pub label: ComplexityLabel,
    /// Deepest function-call nesting.
    pub max_depth: usize,
    /// Calls to registered functions.
    pub complex_matches: usize,
}

/// Policy with the function registry pre-hashed for lookups.
#[derive(Debug, Clone)]
pub struct ComplexityScorer {
    registry: FxHashSet<String>,
    simple_max_depth: usize,
    medium_max_depth: usize,
    medium_match_count: usize,
}

impl ComplexityScorer {
    pub fn new(policy: &ComplexityPolicy) -> Self {
        Self {
            registry: policy
                .complex_functions
                .iter()
                .map(|name| name.to_ascii_uppercase())
                .collect(),
            simple_max_depth: policy.simple_max_depth,
            medium_max_depth: policy.medium_max_depth,
            medium_match_count: policy.medium_match_count,
        }
    }

    pub fn is_registered(&self, function: &str) -> bool {
        self.registry.contains(&function.to_ascii_uppercase())
    }

    pub fn classify(&self, max_depth: usize, complex_matches: usize) -> ComplexityLabel {
        if max_depth <= self.simple_max_depth && complex_matches == 0 {
            ComplexityLabel::Simple
        } else if max_depth <= self.medium_max_depth || complex_matches == self.medium_match_count {
            ComplexityLabel::Medium
        } else {
            ComplexityLabel::Complex
        }
    }

    /// Scores a token stream; unbalanced input is scored as far as it goes.
    pub fn score(&self, tokens: &[Token]) -> ComplexityScore {
        let mut open: Vec<bool> = Vec::new();
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        let mut complex_matches = 0usize;

        for token in tokens {
            match token.kind {
                TokenKind::FunctionOpen => {
                    open.push(true);
                    depth += 1;
                    max_depth = max_depth.max(depth);
                    if token.function_name().is_some_and(|name| self.is_registered(name)) {
                        complex_matches += 1;
                    }
                }
                TokenKind::GroupOpen => open.push(false),
                TokenKind::Close => {
                    if open.pop() == Some(true) {
                        depth -= 1;
                    }
                }
                _ => {}
            }
        }

        ComplexityScore {
            label: self.classify(max_depth, complex_matches),
            max_depth,
            complex_matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dax::lexer::tokenize;

    fn score(raw: &str) -> ComplexityScore {
        ComplexityScorer::new(&ComplexityPolicy::default()).score(&tokenize(raw))
    }

    #[test]
    fn single_aggregate_is_simple() {
        let s = score("SUM([Revenue])");
        assert_eq!(s.max_depth, 1);
        assert_eq!(s.complex_matches, 0);
        assert_eq!(s.label, ComplexityLabel::Simple);
    }

    #[test]
    fn one_registered_call_is_medium() {
        let s = score("CALCULATE([X],FILTER(T,T[c]=1))");
        assert_eq!(s.max_depth, 2);
        assert_eq!(s.complex_matches, 1);
        assert_eq!(s.label, ComplexityLabel::Medium);
    }

    #[test]
    fn deep_nesting_with_several_matches_is_complex() {
        let s = score("SUMX(FILTER(ALL(T),IF(ISBLANK(T[a]),0,1)=1),DIVIDE(T[x],T[y]))");
        assert_eq!(s.max_depth, 4);
        assert_eq!(s.complex_matches, 4);
        assert_eq!(s.label, ComplexityLabel::Complex);
    }

    #[test]
    fn registry_lookup_ignores_case() {
        let s = score("sumx(T, T[a])");
        assert_eq!(s.complex_matches, 1);
    }

    #[test]
    fn grouping_parens_do_not_add_depth() {
        let s = score("((1 + 2)) * ABS(-3)");
        assert_eq!(s.max_depth, 1);
        assert_eq!(s.label, ComplexityLabel::Simple);
    }

    #[test]
    fn custom_policy_thresholds_apply() {
        let policy = ComplexityPolicy {
            simple_max_depth: 2,
            complex_functions: vec!["custom".to_string()],
            ..ComplexityPolicy::default()
        };
        let scorer = ComplexityScorer::new(&policy);
        assert_eq!(
            scorer.score(&tokenize("A(B(1))")).label,
            ComplexityLabel::Simple
        );
        assert_eq!(scorer.score(&tokenize("CUSTOM(1)")).complex_matches, 1);
    }
}
