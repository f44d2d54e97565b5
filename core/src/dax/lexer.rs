//! Layout-preserving DAX tokenizer.
//!
//! Unlike a parser front end this lexer never fails and never drops input:
//! concatenating the text of every token except whitespace (plus the
//! whitespace that separated a function name from its `(`) yields the source.
//! Unterminated strings, references and block comments run to end of input.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Function name and its opening parenthesis, e.g. `CALCULATE(`.
    FunctionOpen,
    /// `(` not preceded by a function name, or `{`.
    GroupOpen,
    /// `)` or `}`.
    Close,
    /// `,` directly inside a function call.
    Separator,
    Reference,
    Literal,
    OperatorRun,
    Comment,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Character offsets into the source, end exclusive.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_line_comment(&self) -> bool {
        self.kind == TokenKind::Comment && !self.text.starts_with("/*")
    }

    /// Function name without the trailing `(`.
    pub fn function_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::FunctionOpen => self.text.strip_suffix('('),
            _ => None,
        }
    }
}

const KEYWORDS: &[&str] = &[
    "VAR", "RETURN", "IN", "DEFINE", "EVALUATE", "MEASURE", "ORDER", "BY", "ASC", "DESC",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

fn is_structural(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '{' | '}' | '[' | ']' | '\'' | '"' | ',' | '+' | '-'
    )
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    /// One entry per open context; `true` for function calls.
    contexts: Vec<bool>,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            contexts: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_comment_start(&self) -> bool {
        matches!(
            (self.peek(), self.peek_at(1)),
            (Some('/'), Some('/')) | (Some('/'), Some('*')) | (Some('-'), Some('-'))
        )
    }

    fn push(&mut self, kind: TokenKind, start: usize, text: String) {
        self.tokens.push(Token {
            kind,
            text,
            start,
            end: self.pos,
        });
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            if ch.is_whitespace() {
                self.read_whitespace(start);
            } else if self.at_comment_start() {
                self.read_comment(start);
            } else {
                match ch {
                    '(' => {
                        self.pos += 1;
                        self.contexts.push(false);
                        self.push(TokenKind::GroupOpen, start, "(".to_string());
                    }
                    '{' => {
                        self.pos += 1;
                        self.contexts.push(false);
                        self.push(TokenKind::GroupOpen, start, "{".to_string());
                    }
                    ')' | '}' => {
                        self.pos += 1;
                        self.contexts.pop();
                        self.push(TokenKind::Close, start, ch.to_string());
                    }
                    ',' => {
                        self.pos += 1;
                        let kind = if self.contexts.last() == Some(&true) {
                            TokenKind::Separator
                        } else {
                            TokenKind::OperatorRun
                        };
                        self.push(kind, start, ",".to_string());
                    }
                    '[' => {
                        self.skip_delimited(']');
                        let text = self.slice(start, self.pos);
                        self.push(TokenKind::Reference, start, text);
                    }
                    '\'' => {
                        self.skip_delimited('\'');
                        if self.peek() == Some('[') {
                            self.skip_delimited(']');
                        }
                        let text = self.slice(start, self.pos);
                        self.push(TokenKind::Reference, start, text);
                    }
                    '"' => {
                        self.skip_delimited('"');
                        let text = self.slice(start, self.pos);
                        self.push(TokenKind::Literal, start, text);
                    }
                    '+' | '-' => {
                        self.pos += 1;
                        self.push(TokenKind::OperatorRun, start, ch.to_string());
                    }
                    c if is_ident_char(c) => self.read_word(start),
                    _ => self.read_operator_run(start),
                }
            }
        }
        self.tokens
    }

    fn read_whitespace(&mut self, start: usize) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        let text = self.slice(start, self.pos);
        self.push(TokenKind::Whitespace, start, text);
    }

    fn read_comment(&mut self, start: usize) {
        if self.peek_at(1) == Some('*') {
            self.pos += 2;
            while self.pos < self.chars.len() {
                if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                    self.pos += 2;
                    break;
                }
                self.pos += 1;
            }
            let text = self.slice(start, self.pos);
            self.push(TokenKind::Comment, start, text);
            return;
        }

        while matches!(self.peek(), Some(c) if c != '\n') {
            self.pos += 1;
        }
        let text = self.slice(start, self.pos);
        let trimmed = text.trim_end();
        // trailing blanks belong to the following whitespace token
        self.pos = start + trimmed.chars().count();
        self.push(TokenKind::Comment, start, trimmed.to_string());
    }

    /// Consumes a quoted run starting at the current opener, honouring the
    /// doubled-closer escape (`""`, `''`, `]]`).
    fn skip_delimited(&mut self, close: char) {
        self.pos += 1;
        while let Some(ch) = self.peek() {
            self.pos += 1;
            if ch == close {
                if self.peek() == Some(close) {
                    self.pos += 1;
                    continue;
                }
                return;
            }
        }
    }

    fn read_word(&mut self, start: usize) {
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.pos += 1;
        }
        // scientific notation: 1.5e-3
        let first = self.chars[start];
        if first.is_ascii_digit()
            && matches!(self.chars[self.pos - 1], 'e' | 'E')
            && matches!(self.peek(), Some('+') | Some('-'))
            && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit())
        {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let word = self.slice(start, self.pos);

        if self.peek() == Some('[') {
            self.skip_delimited(']');
            let text = self.slice(start, self.pos);
            self.push(TokenKind::Reference, start, text);
            return;
        }

        let starts_like_name = first.is_alphabetic() || first == '_';
        if starts_like_name && !is_keyword(&word) {
            let mut look = self.pos;
            while matches!(self.chars.get(look), Some(c) if c.is_whitespace()) {
                look += 1;
            }
            if self.chars.get(look) == Some(&'(') {
                self.pos = look + 1;
                self.contexts.push(true);
                self.push(TokenKind::FunctionOpen, start, format!("{}(", word));
                return;
            }
        }

        self.push(TokenKind::Literal, start, word);
    }

    fn read_operator_run(&mut self, start: usize) {
        self.pos += 1;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || is_ident_char(ch) || is_structural(ch) || self.at_comment_start() {
                break;
            }
            self.pos += 1;
        }
        let text = self.slice(start, self.pos);
        self.push(TokenKind::OperatorRun, start, text);
    }
}

/// Splits `input` into tokens, whitespace included.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).run()
}

/// Tokens without whitespace; the sequence formatting must preserve.
pub fn significant_tokens(input: &str) -> Vec<Token> {
    tokenize(input).into_iter().filter(|t| !t.is_trivia()).collect()
}
