//! Stack-driven layout of DAX token streams.
//!
//! Each function call opens a frame that remembers the indentation of the line
//! it was opened on. Arguments start on their own line one level deeper, and
//! the closing parenthesis returns to the opener's indentation. Grouping
//! parentheses and table constructors stay inline.

use serde::Serialize;
use thiserror::Error;

use super::lexer::{Token, TokenKind, is_keyword, significant_tokens};
use crate::config::FormatOptions;
use crate::error_codes;

/// Unbalanced expression; positions are character offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FormattingWarning {
    #[error("[PBIDOCS_FORMAT_001] unmatched '{close}' at offset {position}")]
    UnmatchedClose { close: String, position: usize },
    #[error("[PBIDOCS_FORMAT_002] '{close}' at offset {position} closes '{open}'")]
    MismatchedClose {
        open: String,
        close: String,
        position: usize,
    },
    #[error("[PBIDOCS_FORMAT_003] '{open}' opened at offset {position} is never closed")]
    Unclosed { open: String, position: usize },
}

impl FormattingWarning {
    pub fn code(&self) -> &'static str {
        match self {
            FormattingWarning::UnmatchedClose { .. } => error_codes::FORMAT_UNMATCHED_CLOSE,
            FormattingWarning::MismatchedClose { .. } => error_codes::FORMAT_MISMATCHED_CLOSE,
            FormattingWarning::Unclosed { .. } => error_codes::FORMAT_UNCLOSED,
        }
    }
}

#[derive(Debug)]
struct Frame<'t> {
    opener: &'t Token,
    /// Indent level of the line holding the opener.
    line_indent: usize,
}

impl Frame<'_> {
    fn is_function(&self) -> bool {
        self.opener.kind == TokenKind::FunctionOpen
    }

    fn expected_close(&self) -> &'static str {
        if self.opener.text == "{" {
            "}"
        } else {
            ")"
        }
    }
}

struct Layout<'t> {
    indent_width: usize,
    out: String,
    stack: Vec<Frame<'t>>,
    line_indent: usize,
    pending_break: Option<usize>,
    prev: Option<&'t Token>,
    prev_unary: bool,
}

impl<'t> Layout<'t> {
    fn new(options: &FormatOptions) -> Self {
        Self {
            indent_width: options.indent_width,
            out: String::new(),
            stack: Vec::new(),
            line_indent: 0,
            pending_break: None,
            prev: None,
            prev_unary: false,
        }
    }

    fn break_to(&mut self, level: usize) {
        self.pending_break = Some(level);
    }

    fn needs_space(&self, next: &Token) -> bool {
        let Some(prev) = self.prev else {
            return false;
        };
        if matches!(prev.kind, TokenKind::FunctionOpen | TokenKind::GroupOpen) {
            return false;
        }
        if next.kind == TokenKind::Close || next.text == "," {
            return false;
        }
        if self.prev_unary {
            return matches!(next.kind, TokenKind::OperatorRun | TokenKind::Comment);
        }
        true
    }

    fn is_unary(&self, token: &Token) -> bool {
        if token.text != "+" && token.text != "-" {
            return false;
        }
        match self.prev {
            None => true,
            Some(prev) => match prev.kind {
                TokenKind::FunctionOpen
                | TokenKind::GroupOpen
                | TokenKind::Separator
                | TokenKind::OperatorRun
                | TokenKind::Comment => true,
                TokenKind::Literal => is_keyword(&prev.text),
                _ => false,
            },
        }
    }

    fn emit(&mut self, token: &'t Token) {
        if let Some(level) = self.pending_break.take() {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            self.out
                .extend(std::iter::repeat(' ').take(level * self.indent_width));
            self.line_indent = level;
        } else if self.needs_space(token) {
            self.out.push(' ');
        }
        self.out.push_str(&token.text);
        self.prev_unary = self.is_unary(token);
        self.prev = Some(token);
    }

    fn close(&mut self, token: &'t Token) -> Result<(), FormattingWarning> {
        let Some(frame) = self.stack.pop() else {
            return Err(FormattingWarning::UnmatchedClose {
                close: token.text.clone(),
                position: token.start,
            });
        };
        if frame.expected_close() != token.text {
            return Err(FormattingWarning::MismatchedClose {
                open: frame.opener.text.clone(),
                close: token.text.clone(),
                position: token.start,
            });
        }
        if frame.is_function() {
            self.break_to(frame.line_indent);
        }
        self.emit(token);
        Ok(())
    }

    fn run(mut self, tokens: &'t [Token]) -> Result<String, FormattingWarning> {
        let mut iter = tokens.iter().filter(|t| !t.is_trivia()).peekable();
        while let Some(token) = iter.next() {
            match token.kind {
                TokenKind::FunctionOpen => {
                    self.emit(token);
                    if let Some(close) =
                        iter.next_if(|next| next.kind == TokenKind::Close && next.text == ")")
                    {
                        self.emit(close);
                        continue;
                    }
                    self.stack.push(Frame {
                        opener: token,
                        line_indent: self.line_indent,
                    });
                    self.break_to(self.line_indent + 1);
                }
                TokenKind::GroupOpen => {
                    self.emit(token);
                    self.stack.push(Frame {
                        opener: token,
                        line_indent: self.line_indent,
                    });
                }
                TokenKind::Close => self.close(token)?,
                TokenKind::Separator => {
                    self.emit(token);
                    let level = match self.stack.last() {
                        Some(frame) if frame.is_function() => frame.line_indent + 1,
                        _ => self.line_indent,
                    };
                    self.break_to(level);
                }
                TokenKind::Comment => {
                    self.emit(token);
                    if token.is_line_comment() && self.pending_break.is_none() {
                        self.break_to(self.line_indent);
                    }
                }
                TokenKind::Whitespace => {}
                TokenKind::Reference | TokenKind::Literal | TokenKind::OperatorRun => {
                    self.emit(token)
                }
            }
        }

        if let Some(frame) = self.stack.last() {
            return Err(FormattingWarning::Unclosed {
                open: frame.opener.text.clone(),
                position: frame.opener.start,
            });
        }
        Ok(self.out)
    }
}

/// Lays out an already tokenized expression.
pub fn format_tokens(tokens: &[Token], options: &FormatOptions) -> Result<String, FormattingWarning> {
    Layout::new(options).run(tokens)
}

/// Formats `raw`; the result depends only on its non-whitespace tokens.
pub fn format_expression(raw: &str, options: &FormatOptions) -> Result<String, FormattingWarning> {
    let tokens = significant_tokens(raw);
    format_tokens(&tokens, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(raw: &str) -> String {
        format_expression(raw, &FormatOptions::default()).expect("balanced expression")
    }

    #[test]
    fn closing_paren_aligns_with_opening_line() {
        let out = fmt("IF(a,SUM(x),0)");
        assert_eq!(out, "IF(\n    a,\n    SUM(\n        x\n    ),\n    0\n)");
    }

    #[test]
    fn zero_argument_call_stays_inline() {
        assert_eq!(fmt("TODAY( ) - 1"), "TODAY() - 1");
    }

    #[test]
    fn grouping_parens_and_braces_stay_inline() {
        assert_eq!(fmt("( a + b ) * 2"), "(a + b) * 2");
        assert_eq!(fmt("x IN {1,2}"), "x IN {1, 2}");
    }

    #[test]
    fn unary_minus_hugs_operand() {
        assert_eq!(fmt("a = -1"), "a = -1");
        assert_eq!(fmt("- - 1"), "- -1");
        assert_eq!(fmt("RETURN -x"), "RETURN -x");
    }

    #[test]
    fn line_comment_forces_break() {
        let out = fmt("F(a, // first\nb)");
        assert_eq!(out, "F(\n    a,\n    // first\n    b\n)");
        assert_eq!(fmt(&out), out);
    }

    #[test]
    fn indent_width_is_configurable() {
        let options = FormatOptions { indent_width: 2 };
        let out = format_expression("SUM(x)", &options).expect("balanced");
        assert_eq!(out, "SUM(\n  x\n)");
    }

    #[test]
    fn unmatched_close_is_reported() {
        let err = format_expression("a)", &FormatOptions::default()).expect_err("unbalanced");
        assert_eq!(
            err,
            FormattingWarning::UnmatchedClose {
                close: ")".to_string(),
                position: 1
            }
        );
        assert_eq!(err.code(), "PBIDOCS_FORMAT_001");
    }

    #[test]
    fn mismatched_close_is_reported() {
        let err = format_expression("{1, 2)", &FormatOptions::default()).expect_err("mismatch");
        assert!(matches!(err, FormattingWarning::MismatchedClose { position: 5, .. }));
    }

    #[test]
    fn missing_close_names_opener() {
        let err = format_expression("CALCULATE([X],FILTER(T,T[c]=1)", &FormatOptions::default())
            .expect_err("unclosed");
        assert_eq!(
            err,
            FormattingWarning::Unclosed {
                open: "CALCULATE(".to_string(),
                position: 0
            }
        );
    }
}
