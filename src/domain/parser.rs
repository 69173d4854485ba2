//! Expression parser.
//!
//! A tokenizer splits the input into parentheses, quoted strings and bare
//! words; a recursive descent parser then builds the [`Expr`] tree. Errors
//! carry the byte offset of the offending token.
//!
//! Atom classification, in order of precedence:
//! - `$name` is a variable (the `$` is kept)
//! - `"text"` is a string literal
//! - text that parses as a number is a number (a `.` makes it a float)
//! - anything else is a symbol

use crate::domain::error::ParseError;
use crate::domain::expr::{Atom, Expr, Number};

/// Deepest list nesting accepted. Deeper input is rejected as a parse error
/// so neither parsing nor evaluation can exhaust the stack.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Open,
    Close,
    Str(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.advance();
        let body_start = self.pos;
        while let Some(ch) = self.advance() {
            if ch == '"' {
                let body = &self.input[body_start..self.pos - 1];
                return Ok(Token {
                    kind: TokenKind::Str(body.to_string()),
                    position: start,
                });
            }
        }
        Err(ParseError::new("unterminated string literal", start))
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            self.advance();
        }
        Token {
            kind: TokenKind::Word(self.input[start..self.pos].to_string()),
            position: start,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let position = self.pos;
            let token = match self.peek() {
                None => break,
                Some('(') => {
                    self.advance();
                    Token {
                        kind: TokenKind::Open,
                        position,
                    }
                }
                Some(')') => {
                    self.advance();
                    Token {
                        kind: TokenKind::Close,
                        position,
                    }
                }
                Some('"') => self.read_string()?,
                Some(_) => self.read_word(),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, end: usize) -> Self {
        Self {
            tokens,
            index: 0,
            end,
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn parse_expr(&mut self, depth: usize) -> Result<Expr, ParseError> {
        match self.next() {
            None => Err(ParseError::new("unexpected end of input", self.end)),
            Some(Token {
                kind: TokenKind::Open,
                position,
            }) => self.parse_list(position, depth + 1),
            Some(Token {
                kind: TokenKind::Close,
                position,
            }) => Err(ParseError::new("unexpected ')'", position)),
            Some(Token {
                kind: TokenKind::Str(s),
                ..
            }) => Ok(Expr::Atom(Atom::Str(s))),
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Ok(Expr::Atom(classify_word(&w))),
        }
    }

    fn parse_list(&mut self, open_position: usize, depth: usize) -> Result<Expr, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new(
                format!("nesting deeper than {} levels", MAX_DEPTH),
                open_position,
            ));
        }
        let mut items = Vec::new();
        loop {
            match self.tokens.get(self.index) {
                None => {
                    return Err(ParseError::new(
                        "unbalanced parentheses: missing ')'",
                        open_position,
                    ));
                }
                Some(Token {
                    kind: TokenKind::Close,
                    ..
                }) => {
                    self.index += 1;
                    return Ok(Expr::List(items));
                }
                Some(_) => items.push(self.parse_expr(depth)?),
            }
        }
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new("empty input", 0));
        }
        let expr = self.parse_expr(0)?;
        if let Some(token) = self.tokens.get(self.index) {
            let message = match token.kind {
                TokenKind::Close => "unbalanced parentheses: unexpected ')'",
                _ => "unexpected input after expression",
            };
            return Err(ParseError::new(message, token.position));
        }
        Ok(expr)
    }
}

fn classify_word(word: &str) -> Atom {
    if word.starts_with('$') {
        return Atom::Variable(word.to_string());
    }
    if word.contains('.') {
        if let Ok(f) = word.parse::<f64>() {
            return Atom::Number(Number::Float(f));
        }
    } else if let Ok(i) = word.parse::<i64>() {
        return Atom::Number(Number::Int(i));
    }
    Atom::Symbol(word.to_string())
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens, input.len());
    parser.parse()
}
