use std::fmt;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::truth::{Truth, UNKNOWN};

/// Errors raised while parsing a formula.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// The formula contains no tokens at all.
    #[error("empty formula")]
    Empty,
    /// A character outside the formula alphabet.
    #[error("unexpected character `{ch}` at byte {pos}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Byte offset into the formula text.
        pos: usize,
    },
    /// A token that cannot start or continue an expression here.
    #[error("unexpected token `{token}` at byte {pos}")]
    UnexpectedToken {
        /// Offending token text.
        token: String,
        /// Byte offset into the formula text.
        pos: usize,
    },
    /// An opening parenthesis without a matching close.
    #[error("unbalanced parenthesis opened at byte {pos}")]
    UnbalancedParen {
        /// Byte offset of the opening parenthesis.
        pos: usize,
    },
    /// The formula ends before an operand was supplied.
    #[error("formula ends unexpectedly (missing operand)")]
    UnexpectedEnd,
}

/// Parsed expression tree over named truth variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Reference to a primitive feature or another criterion.
    Var(String),
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Material implication.
    Implies(Box<Expr>, Box<Expr>),
    /// Bi-implication.
    Iff(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, env: &IndexMap<String, Truth>) -> Truth {
        match self {
            Self::Var(name) => env.get(name).copied().unwrap_or(UNKNOWN),
            Self::Not(inner) => inner.eval(env).negate(),
            Self::And(lhs, rhs) => lhs.eval(env).and(rhs.eval(env)),
            Self::Or(lhs, rhs) => lhs.eval(env).or(rhs.eval(env)),
            Self::Implies(lhs, rhs) => lhs.eval(env).implies(rhs.eval(env)),
            Self::Iff(lhs, rhs) => lhs.eval(env).iff(rhs.eval(env)),
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut IndexSet<&'a str>) {
        match self {
            Self::Var(name) => {
                out.insert(name.as_str());
            }
            Self::Not(inner) => inner.collect_variables(out),
            Self::And(lhs, rhs)
            | Self::Or(lhs, rhs)
            | Self::Implies(lhs, rhs)
            | Self::Iff(lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}

/// A validated formula: original text plus its parsed expression tree.
///
/// Parsing happens once; evaluation is pure, deterministic and total —
/// variables absent from the environment evaluate to [`UNKNOWN`] so missing
/// candidate data degrades gracefully instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    text: String,
    root: Expr,
}

impl Formula {
    /// Parses formula text into a reusable evaluation tree.
    ///
    /// Grammar, lowest precedence first: `<->` (iff), `->` (implies,
    /// right-associative), `|`, `&`, unary `~`/`!`, parentheses and
    /// identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] describing the first malformed token or
    /// structural problem, with its byte offset.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_iff()?;
        if let Some((token, pos)) = parser.peek() {
            return Err(FormulaError::UnexpectedToken {
                token: token.text(),
                pos,
            });
        }
        Ok(Self {
            text: text.to_owned(),
            root,
        })
    }

    /// Evaluates the formula against a variable environment.
    #[must_use]
    pub fn eval(&self, env: &IndexMap<String, Truth>) -> Truth {
        self.root.eval(env)
    }

    /// The original formula text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Variable names referenced by the formula, in first-use order.
    #[must_use]
    pub fn variables(&self) -> IndexSet<&str> {
        let mut out = IndexSet::new();
        self.root.collect_variables(&mut out);
        out
    }

    /// The parsed expression tree.
    #[must_use]
    pub const fn root(&self) -> &Expr {
        &self.root
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    Implies,
    Iff,
    LParen,
    RParen,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Not => "~".into(),
            Self::And => "&".into(),
            Self::Or => "|".into(),
            Self::Implies => "->".into(),
            Self::Iff => "<->".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let ch = char::from(bytes[i]);
        match ch {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            '~' | '!' => {
                tokens.push((Token::Not, i));
                i += 1;
            }
            '&' => {
                tokens.push((Token::And, i));
                i += 1;
            }
            '|' => {
                tokens.push((Token::Or, i));
                i += 1;
            }
            '-' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    tokens.push((Token::Implies, i));
                    i += 2;
                } else {
                    return Err(FormulaError::UnexpectedChar { ch, pos: i });
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'-') && bytes.get(i + 2) == Some(&b'>') {
                    tokens.push((Token::Iff, i));
                    i += 3;
                } else {
                    return Err(FormulaError::UnexpectedChar { ch, pos: i });
                }
            }
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = char::from(bytes[i]);
                    if c.is_ascii_alphanumeric() || c == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(text[start..i].to_owned()), start));
            }
            _ => return Err(FormulaError::UnexpectedChar { ch, pos: i }),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<(&Token, usize)> {
        self.tokens.get(self.pos).map(|(token, pos)| (token, *pos))
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().is_some_and(|(token, _)| token == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_iff(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_implies()?;
        while self.eat(&Token::Iff) {
            let rhs = self.parse_implies()?;
            lhs = Expr::Iff(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> Result<Expr, FormulaError> {
        let lhs = self.parse_or()?;
        if self.eat(&Token::Implies) {
            // Right-associative: a -> b -> c parses as a -> (b -> c).
            let rhs = self.parse_implies()?;
            return Ok(Expr::Implies(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&Token::Not) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some((Token::Ident(name), _)) => Ok(Expr::Var(name)),
            Some((Token::LParen, open_pos)) => {
                let inner = self.parse_iff()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(FormulaError::UnbalancedParen { pos: open_pos })
                }
            }
            Some((token, pos)) => Err(FormulaError::UnexpectedToken {
                token: token.text(),
                pos,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
