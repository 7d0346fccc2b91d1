//! Well-known text (WKT) tree parser.
//!
//! Accepts both WKT1 (`PROJCS[...]`, OGC 01-009) and WKT2 (`PROJCRS[...]`,
//! ISO 19162) syntax. The parser only builds a generic tree of keyword
//! nodes; interpretation happens in [`crate::crs`].
//!
//! Grammar handled:
//! - `KEYWORD[value, value, ...]` or `KEYWORD(value, ...)`
//! - values are nested nodes, quoted text (`""` escapes a quote),
//!   numbers, or bare identifiers such as `north` or `Cartesian`

use crate::error::{CrsError, CrsResult};

/// Deepest node nesting accepted. Real CRS definitions stay below ten.
pub const MAX_NESTING: usize = 64;

/// A keyword node with its bracketed values.
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    /// Keyword as written (case preserved)
    pub keyword: String,
    /// Values in source order
    pub values: Vec<WktValue>,
}

/// A single value inside a node.
#[derive(Debug, Clone, PartialEq)]
pub enum WktValue {
    Node(WktNode),
    Text(String),
    Number(f64),
    Identifier(String),
}

impl WktNode {
    /// Whether this node's keyword matches any of `keywords` (case-insensitive).
    pub fn is(&self, keywords: &[&str]) -> bool {
        keywords
            .iter()
            .any(|k| self.keyword.eq_ignore_ascii_case(k))
    }

    /// The first quoted text value, which WKT uses as the object name.
    pub fn name(&self) -> Option<&str> {
        self.values.iter().find_map(|v| match v {
            WktValue::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The `index`-th numeric value (ignoring text and nodes).
    pub fn number(&self, index: usize) -> Option<f64> {
        self.values
            .iter()
            .filter_map(|v| match v {
                WktValue::Number(n) => Some(*n),
                _ => None,
            })
            .nth(index)
    }

    /// All numeric values in order.
    pub fn numbers(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|v| match v {
                WktValue::Number(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// The first bare identifier value.
    pub fn identifier(&self) -> Option<&str> {
        self.values.iter().find_map(|v| match v {
            WktValue::Identifier(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Direct child nodes.
    pub fn children(&self) -> impl Iterator<Item = &WktNode> {
        self.values.iter().filter_map(|v| match v {
            WktValue::Node(n) => Some(n),
            _ => None,
        })
    }

    /// First direct child whose keyword matches any of `keywords`.
    pub fn child(&self, keywords: &[&str]) -> Option<&WktNode> {
        self.children().find(|c| c.is(keywords))
    }

    /// All direct children whose keyword matches any of `keywords`.
    pub fn children_matching<'a>(
        &'a self,
        keywords: &'a [&'a str],
    ) -> impl Iterator<Item = &'a WktNode> + 'a {
        self.children().filter(move |c| c.is(keywords))
    }
}

/// Parse a WKT string into its root node.
pub fn parse(input: &str) -> CrsResult<WktNode> {
    if input.trim().is_empty() {
        return Err(CrsError::Empty);
    }

    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let root = parser.node(0)?;

    if let Some((offset, _)) = parser.tokens.get(parser.pos) {
        return Err(CrsError::syntax(*offset, "trailing content after root node"));
    }

    Ok(root)
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Text(String),
    Number(f64),
    Open,
    Close,
    Comma,
}

fn tokenize(input: &str) -> CrsResult<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' | '(' => {
                chars.next();
                tokens.push((offset, Token::Open));
            }
            ']' | ')' => {
                chars.next();
                tokens.push((offset, Token::Close));
            }
            ',' => {
                chars.next();
                tokens.push((offset, Token::Comma));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '"' {
                        // A doubled quote is an escaped literal quote
                        if matches!(chars.peek(), Some((_, '"'))) {
                            chars.next();
                            text.push('"');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        text.push(c);
                    }
                }
                if !closed {
                    return Err(CrsError::syntax(offset, "unterminated quoted text"));
                }
                tokens.push((offset, Token::Text(text)));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut literal = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal.parse::<f64>().map_err(|_| {
                    CrsError::syntax(offset, format!("invalid number '{}'", literal))
                })?;
                tokens.push((offset, Token::Number(value)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((offset, Token::Word(word)));
            }
            other => {
                return Err(CrsError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(o, _)| *o)
            .unwrap_or(0)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn node(&mut self, depth: usize) -> CrsResult<WktNode> {
        let offset = self.offset();
        if depth >= MAX_NESTING {
            return Err(CrsError::syntax(offset, "nesting too deep"));
        }
        let keyword = match self.next() {
            Some(Token::Word(word)) => word,
            _ => return Err(CrsError::syntax(offset, "expected keyword")),
        };
        match self.next() {
            Some(Token::Open) => {}
            _ => {
                return Err(CrsError::syntax(
                    self.offset(),
                    format!("expected '[' after {}", keyword),
                ))
            }
        }

        let mut values = Vec::new();
        if self.peek() == Some(&Token::Close) {
            self.pos += 1;
            return Ok(WktNode { keyword, values });
        }

        loop {
            values.push(self.value(depth)?);
            let offset = self.offset();
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::Close) => break,
                _ => {
                    return Err(CrsError::syntax(
                        offset,
                        format!("expected ',' or ']' in {}", keyword),
                    ))
                }
            }
        }

        Ok(WktNode { keyword, values })
    }

    fn value(&mut self, depth: usize) -> CrsResult<WktValue> {
        let offset = self.offset();
        match self.peek().cloned() {
            Some(Token::Word(word)) => {
                if matches!(self.tokens.get(self.pos + 1), Some((_, Token::Open))) {
                    Ok(WktValue::Node(self.node(depth + 1)?))
                } else {
                    self.pos += 1;
                    Ok(WktValue::Identifier(word))
                }
            }
            Some(Token::Text(text)) => {
                self.pos += 1;
                Ok(WktValue::Text(text))
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(WktValue::Number(n))
            }
            _ => Err(CrsError::syntax(offset, "expected value")),
        }
    }
}
