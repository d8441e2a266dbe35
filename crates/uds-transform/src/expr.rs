//! Arithmetic formulas over source columns.
//!
//! Formulas such as `PDYR – BIRTHYR` are parsed once into an [`Expression`]
//! tree of column references and numeric literals, then evaluated per row
//! against a caller-supplied column resolver. Nothing is ever executed as
//! code.

use std::fmt;

use crate::error::{Result, TransformError};

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let value = match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div if rhs == 0.0 => return None,
            Self::Div => lhs / rhs,
        };
        value.is_finite().then_some(value)
    }
}

/// Node of a parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Column(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn evaluate(&self, resolve: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Column(name) => resolve(name),
            Self::Neg(inner) => inner.evaluate(resolve).map(|v| -v),
            Self::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(resolve)?;
                let rhs = rhs.evaluate(resolve)?;
                op.apply(lhs, rhs)
            }
        }
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Neg(inner) => inner.collect_columns(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_columns(out);
                rhs.collect_columns(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Column(name) => f.write_str(name),
            Self::Neg(inner) => write!(f, "-({inner})"),
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// A parsed arithmetic formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    root: Expr,
}

impl Expression {
    /// Parse a formula. En dashes read as minus and names are lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use uds_transform::Expression;
    ///
    /// let expr = Expression::parse("PDYR – BIRTHYR").unwrap();
    /// assert_eq!(expr.columns(), vec!["pdyr", "birthyr"]);
    /// let value = expr.evaluate(|name| if name == "pdyr" { Some(2010.0) } else { Some(1950.0) });
    /// assert_eq!(value, Some(60.0));
    /// ```
    pub fn parse(formula: &str) -> Result<Self> {
        let text = formula.replace('–', "-").trim().to_lowercase();
        let tokens = Lexer::new(&text).tokenize().map_err(|message| malformed(formula, message))?;
        let mut parser = Parser::new(tokens);
        let root = parser
            .parse_expression()
            .map_err(|message| malformed(formula, message))?;
        if let Some(token) = parser.peek() {
            return Err(malformed(formula, format!("unexpected trailing {token:?}")));
        }
        Ok(Self { text, root })
    }

    /// Normalized formula text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Referenced column names, first occurrence order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_columns(&mut out);
        out
    }

    /// Evaluate with the given column resolver.
    ///
    /// Returns `None` when a column resolves to `None`, on division by zero,
    /// or when the result is not finite.
    pub fn evaluate(&self, resolve: impl Fn(&str) -> Option<f64>) -> Option<f64> {
        self.root.evaluate(&resolve)
    }
}

fn malformed(formula: &str, message: String) -> TransformError {
    TransformError::Expression {
        expression: formula.to_string(),
        message,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    fn tokenize(&mut self) -> std::result::Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(&ch) = self.chars.get(self.index) {
            let token = match ch {
                c if c.is_whitespace() => {
                    self.index += 1;
                    continue;
                }
                '+' => Token::Op(BinaryOp::Add),
                '-' => Token::Op(BinaryOp::Sub),
                '*' => Token::Op(BinaryOp::Mul),
                '/' => Token::Op(BinaryOp::Div),
                '(' => Token::LParen,
                ')' => Token::RParen,
                c if c.is_alphanumeric() || c == '_' || c == '.' => {
                    tokens.push(self.read_word()?);
                    continue;
                }
                other => return Err(format!("unexpected character '{other}'")),
            };
            self.index += 1;
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn read_word(&mut self) -> std::result::Result<Token, String> {
        let start = self.index;
        while self
            .chars
            .get(self.index)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
        {
            self.index += 1;
        }
        let word: String = self.chars[start..self.index].iter().collect();
        let numeric_start = word.starts_with(|c: char| c.is_ascii_digit() || c == '.');
        if numeric_start && let Ok(value) = word.parse::<f64>() {
            return Ok(Token::Number(value));
        }
        if word.contains('.') {
            return Err(format!("invalid operand '{word}'"));
        }
        Ok(Token::Ident(word))
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn match_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn parse_expression(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.match_op(&[BinaryOp::Add, BinaryOp::Sub]) {
            let rhs = self.parse_term()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.parse_unary()?;
        while let Some(op) = self.match_op(&[BinaryOp::Mul, BinaryOp::Div]) {
            let rhs = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> std::result::Result<Expr, String> {
        if self.match_op(&[BinaryOp::Sub]).is_some() {
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> std::result::Result<Expr, String> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err("expected ')' after expression".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected {other:?}")),
            None => Err("unexpected end of formula".to_string()),
        }
    }
}
