use pbi_docs::dax::{ComplexityScorer, TokenKind, format_expression, significant_tokens};
use pbi_docs::{ComplexityLabel, ComplexityPolicy, FormatOptions, FormattingWarning};

const CORPUS: &[&str] = &[
    "SUM(Sales[Amount])",
    "CALCULATE([YTD Gross Margin],SAMEPERIODLASTYEAR(DATESYTD('Date'[Date])))",
    "IF(ISBLANK([Sales]), 0, [Sales] / [Units])",
    "VAR x = SUM(T[a]) RETURN IF(x > 0, x * -1, BLANK())",
    "SWITCH(TRUE(), [m] >= 100, \"High\", [m] >= 10, \"Mid\", \"Low\")",
    "CALCULATE ( [Sales] , FILTER ( ALL ( 'Product' ) , 'Product'[Color] IN { \"Red\", \"Blue\" } ) )",
    "DIVIDE([A] - [B], ([A] + [B]) / 2)",
    "SUMX(Sales, Sales[Qty] * Sales[Price]) // line total",
    "CALCULATE(\n  [Sales], // base\n  ALL(T)\n)",
    "1.5e-3 * [Rate] + -[Offset]",
    "{1, 2, 3}",
    "RANKX(ALL('Customer'[Name]), [Revenue],, DESC)",
    "\"a \"\"quoted\"\" (text)\" & 'It''s'[Col]",
    "/* header */ COUNTROWS(VALUES(T[k]))",
];

fn options() -> FormatOptions {
    FormatOptions::default()
}

fn sequence(text: &str) -> Vec<(TokenKind, String)> {
    significant_tokens(text)
        .into_iter()
        .map(|t| (t.kind, t.text))
        .collect()
}

fn line_indent(chars: &[char], offset: usize) -> (usize, bool) {
    let line_start = chars[..offset]
        .iter()
        .rposition(|c| *c == '\n')
        .map_or(0, |i| i + 1);
    let indent = chars[line_start..]
        .iter()
        .take_while(|c| **c == ' ')
        .count();
    (indent, line_start + indent == offset)
}

#[test]
fn formatting_preserves_significant_tokens() {
    for raw in CORPUS {
        let formatted = format_expression(raw, &options()).expect("corpus is balanced");
        assert_eq!(sequence(&formatted), sequence(raw), "token drift for {raw:?}");
    }
}

#[test]
fn formatting_is_idempotent() {
    for raw in CORPUS {
        let once = format_expression(raw, &options()).expect("corpus is balanced");
        let twice = format_expression(&once, &options()).expect("formatted text is balanced");
        assert_eq!(once, twice, "not idempotent for {raw:?}");
    }
}

#[test]
fn function_closes_align_with_their_opening_line() {
    for raw in CORPUS {
        let formatted = format_expression(raw, &options()).expect("corpus is balanced");
        let chars: Vec<char> = formatted.chars().collect();
        let mut stack: Vec<(bool, usize)> = Vec::new();
        let (mut opens, mut closes) = (0, 0);

        for token in significant_tokens(&formatted) {
            match token.kind {
                TokenKind::FunctionOpen | TokenKind::GroupOpen => {
                    opens += 1;
                    let (indent, _) = line_indent(&chars, token.start);
                    stack.push((token.kind == TokenKind::FunctionOpen, indent));
                }
                TokenKind::Close => {
                    closes += 1;
                    let (is_function, opener_indent) =
                        stack.pop().expect("close has an opener");
                    let (indent, leads_line) = line_indent(&chars, token.start);
                    if is_function && leads_line {
                        assert_eq!(indent, opener_indent, "misaligned close in {formatted:?}");
                    }
                }
                _ => {}
            }
        }
        assert_eq!(opens, closes, "unbalanced output for {raw:?}");
        assert!(stack.is_empty());
    }
}

#[test]
fn nested_time_intelligence_literal() {
    let formatted = format_expression(
        "CALCULATE([YTD Gross Margin],SAMEPERIODLASTYEAR(DATESYTD('Date'[Date])))",
        &options(),
    )
    .expect("balanced");
    let expected = "CALCULATE(
    [YTD Gross Margin],
    SAMEPERIODLASTYEAR(
        DATESYTD(
            'Date'[Date]
        )
    )
)";
    assert_eq!(formatted, expected);
}

#[test]
fn missing_close_is_a_warning_not_a_panic() {
    let err = format_expression("CALCULATE([X],FILTER(T,T[c]=1)", &options())
        .expect_err("unbalanced");
    assert!(matches!(err, FormattingWarning::Unclosed { ref open, .. } if open == "CALCULATE("));
    assert_eq!(err.code(), "PBIDOCS_FORMAT_003");

    let err = format_expression("SUM(x))", &options()).expect_err("extra close");
    assert!(matches!(err, FormattingWarning::UnmatchedClose { position: 6, .. }));
}

#[test]
fn wider_indent_is_honoured() {
    let options = FormatOptions { indent_width: 2 };
    let formatted = format_expression("IF(a,SUM(x),0)", &options).expect("balanced");
    assert_eq!(formatted, "IF(\n  a,\n  SUM(\n    x\n  ),\n  0\n)");
}

#[test]
fn complexity_follows_depth_and_registry() {
    let scorer = ComplexityScorer::new(&ComplexityPolicy::default());

    let simple = scorer.score(&significant_tokens("SUM([Revenue])"));
    assert_eq!(simple.label, ComplexityLabel::Simple);

    let filtered = scorer.score(&significant_tokens("CALCULATE([X],FILTER(T,T[c]=1))"));
    assert_eq!(filtered.max_depth, 2);
    assert_eq!(filtered.complex_matches, 1);
    assert!(filtered.label >= ComplexityLabel::Medium);

    let deep = scorer.score(&significant_tokens(
        "SUMX(FILTER(ALL(T), CALCULATE(SUM(T[a])) > 0), DIVIDE(T[b], T[c]))",
    ));
    assert_eq!(deep.label, ComplexityLabel::Complex);
}

#[test]
fn complexity_policy_is_configurable() {
    let policy = ComplexityPolicy {
        complex_functions: vec!["calculate".to_string()],
        ..ComplexityPolicy::default()
    };
    let scorer = ComplexityScorer::new(&policy);
    assert!(scorer.is_registered("CALCULATE"));
    assert!(!scorer.is_registered("FILTER"));
    let score = scorer.score(&significant_tokens("CALCULATE([X],FILTER(T,T[c]=1))"));
    assert_eq!(score.complex_matches, 1);
}
