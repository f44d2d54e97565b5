//! Lenient-to-strict JSON repair.
//!
//! Power BI writes the schema payload in a relaxed JSON dialect that tolerates
//! comments and trailing commas. `repair_json` removes both in one left to
//! right scan, never touching the contents of string literals.

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Default,
    InString { escaped: bool },
    InLineComment,
    InBlockComment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub text: String,
    pub comments_removed: usize,
    pub trailing_commas_removed: usize,
}

impl RepairOutcome {
    pub fn changed(&self) -> bool {
        self.comments_removed > 0 || self.trailing_commas_removed > 0
    }
}

pub fn repair_json(input: &str) -> RepairOutcome {
    let body = input.strip_prefix(BOM).unwrap_or(input);
    let mut out = String::with_capacity(body.len());
    let mut state = ScanState::Default;
    let mut comments_removed = 0;
    let mut trailing_commas_removed = 0;
    // Byte offset in `out` of a comma not yet followed by a significant character.
    let mut pending_comma: Option<usize> = None;

    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\0' {
            continue;
        }
        match state {
            ScanState::Default => match ch {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    comments_removed += 1;
                    state = ScanState::InLineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    comments_removed += 1;
                    state = ScanState::InBlockComment;
                }
                c if c.is_whitespace() => out.push(c),
                c => {
                    if let Some(at) = pending_comma.take() {
                        if c == '}' || c == ']' {
                            out.remove(at);
                            trailing_commas_removed += 1;
                        }
                    }
                    match c {
                        ',' => pending_comma = Some(out.len()),
                        '"' => state = ScanState::InString { escaped: false },
                        _ => {}
                    }
                    out.push(c);
                }
            },
            ScanState::InString { escaped } => {
                out.push(ch);
                state = if escaped {
                    ScanState::InString { escaped: false }
                } else if ch == '\\' {
                    ScanState::InString { escaped: true }
                } else if ch == '"' {
                    ScanState::Default
                } else {
                    state
                };
            }
            ScanState::InLineComment => {
                if ch == '\n' {
                    out.push(ch);
                    state = ScanState::Default;
                }
            }
            ScanState::InBlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push(' ');
                    state = ScanState::Default;
                }
            }
        }
    }

    RepairOutcome {
        text: out,
        comments_removed,
        trailing_commas_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn repaired_value(input: &str) -> Value {
        serde_json::from_str(&repair_json(input).text).expect("repaired text should parse")
    }

    #[test]
    fn removes_block_comment_and_trailing_comma() {
        let outcome = repair_json(r#"{"a":1, /*x*/ "b":2,}"#);
        assert_eq!(outcome.comments_removed, 1);
        assert_eq!(outcome.trailing_commas_removed, 1);
        let value: Value = serde_json::from_str(&outcome.text).expect("parse");
        assert_eq!(value, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn string_contents_are_untouched() {
        let input = r#"{"url":"http://host/a,]","note":"x /* y */ z,}"}"#;
        let outcome = repair_json(input);
        assert_eq!(outcome.text, input);
        assert!(!outcome.changed());
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let input = r#"{"q":"say \"hi\", // not a comment","n":1}"#;
        assert_eq!(repair_json(input).text, input);
    }

    #[test]
    fn line_comment_keeps_newline() {
        let input = "{\n  \"a\": 1, // first\n  \"b\": [1, 2,],\n}";
        let outcome = repair_json(input);
        assert_eq!(outcome.trailing_commas_removed, 2);
        assert!(!outcome.text.contains("// first"));
        assert_eq!(outcome.text.lines().count(), 4);
        assert_eq!(repaired_value(input), json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn trailing_comma_before_comment_then_brace_is_removed() {
        let input = "[1, 2, /* tail */\n]";
        assert_eq!(repaired_value(input), json!([1, 2]));
    }

    #[test]
    fn bom_and_nul_are_dropped() {
        let input = "\u{feff}{\"a\":\0 true}";
        assert_eq!(repaired_value(input), json!({"a": true}));
    }

    #[test]
    fn strict_json_is_returned_unchanged() {
        let input = r#"{"model":{"tables":[],"relationships":[]}}"#;
        let outcome = repair_json(input);
        assert_eq!(outcome.text, input);
        assert!(!outcome.changed());
    }
}
