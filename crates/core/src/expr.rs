//! Expression builder and evaluator
//!
//! The board and its placements are serialized into a typed token stream,
//! never into source text that gets evaluated. Cells are walked left to
//! right: open parentheses, the value, close parentheses, then the gap
//! operator (`+` when unset).
//!
//! Operator mapping:
//!
//! | Tile | Tokens |
//! |------|--------|
//! | `+` `-` | `+` `-` |
//! | `X` | `*` |
//! | `%` | `/` |
//! | `^` | `**` (right-associative) |
//! | `½` | the literal `0.5` |
//!
//! `½` is not an operator: it is the digits `0.5` written into the gap. Between
//! two bare cells it joins them into one decimal literal (`3 ½ 4` is `30.54`).
//! Next to a parenthesis, or after an earlier join already placed a decimal
//! point, it stands alone as `0.5` and the expression does not parse.
//!
//! Precedence is the usual one: `**` binds tighter than `*` `/`, which bind
//! tighter than `+` `-`; parentheses override. Arithmetic is `f64`.

use thiserror::Error;

use crate::board::Board;
use crate::placement::Placements;
use crate::types::{Operator, ParenKind};

/// Why an expression was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EvalError {
    #[error("unbalanced parentheses ({open} open, {close} close)")]
    UnbalancedParentheses { open: usize, close: usize },
    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("result {0} is out of range")]
    OutOfRange(f64),
    #[error("result is zero")]
    Zero,
}

impl EvalError {
    /// snake_case code for logs and the AI protocol.
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::UnbalancedParentheses { .. } => "unbalanced_parentheses",
            EvalError::UnexpectedToken(_) | EvalError::UnexpectedEnd => "malformed",
            EvalError::DivisionByZero => "division_by_zero",
            EvalError::NonFinite => "non_finite",
            EvalError::OutOfRange(_) => "out_of_range",
            EvalError::Zero => "zero",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Op(BinaryOp),
    LParen,
    RParen,
}

/// A serialized board, ready to be checked and evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    tokens: Vec<Token>,
    equation_score: u32,
}

impl Expression {
    /// Serialize `board` with `placements`.
    ///
    /// Also accumulates the equation score: the weight of every gap's
    /// effective operator, so unset gaps count as `+`.
    pub fn build(board: &Board, placements: &Placements) -> Self {
        let cells = board.cells();
        let mut tokens = Vec::with_capacity(cells.len() * 4);
        let mut equation_score = 0;
        // Digits of a numeric literal still being joined by `½`.
        let mut literal = String::new();

        for (i, &value) in cells.iter().enumerate() {
            let opens = placements.paren_count(i, ParenKind::Open);
            let closes = placements.paren_count(i, ParenKind::Close);

            for _ in 0..opens {
                tokens.push(Token::LParen);
            }
            literal.push_str(&value.to_string());
            if closes > 0 {
                flush_literal(&mut tokens, &mut literal);
                for _ in 0..closes {
                    tokens.push(Token::RParen);
                }
            }

            if i + 1 == cells.len() {
                break;
            }

            let op = placements.effective_operator(i);
            equation_score += op.weight();
            match op {
                Operator::Half => {
                    let next_opens = placements.paren_count(i + 1, ParenKind::Open);
                    if literal.is_empty() || literal.contains('.') || next_opens > 0 {
                        flush_literal(&mut tokens, &mut literal);
                        tokens.push(Token::Number(0.5));
                    } else {
                        literal.push_str("0.5");
                    }
                }
                Operator::Add => push_binary(&mut tokens, &mut literal, BinaryOp::Add),
                Operator::Sub => push_binary(&mut tokens, &mut literal, BinaryOp::Sub),
                Operator::Mul => push_binary(&mut tokens, &mut literal, BinaryOp::Mul),
                Operator::Div => push_binary(&mut tokens, &mut literal, BinaryOp::Div),
                Operator::Pow => push_binary(&mut tokens, &mut literal, BinaryOp::Pow),
            }
        }
        flush_literal(&mut tokens, &mut literal);

        Self {
            tokens,
            equation_score,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn equation_score(&self) -> u32 {
        self.equation_score
    }

    /// `(open, close)` parenthesis counts.
    pub fn paren_counts(&self) -> (usize, usize) {
        self.tokens.iter().fold((0, 0), |(o, c), t| match t {
            Token::LParen => (o + 1, c),
            Token::RParen => (o, c + 1),
            _ => (o, c),
        })
    }

    pub fn is_balanced(&self) -> bool {
        let (open, close) = self.paren_counts();
        open == close
    }

    /// Arithmetic text form, e.g. `(3+7)*20.55`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.tokens.len() * 2);
        for t in &self.tokens {
            match t {
                Token::Number(v) => out.push_str(&v.to_string()),
                Token::Op(op) => out.push_str(op.as_str()),
                Token::LParen => out.push('('),
                Token::RParen => out.push(')'),
            }
        }
        out
    }

    /// Check parenthesis balance, then parse and evaluate.
    pub fn evaluate(&self) -> Result<f64, EvalError> {
        let (open, close) = self.paren_counts();
        if open != close {
            return Err(EvalError::UnbalancedParentheses { open, close });
        }
        let tree = Parser::new(&self.tokens).parse()?;
        tree.eval()
    }
}

fn flush_literal(tokens: &mut Vec<Token>, literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    // Digits with at most one decimal point always parse.
    tokens.push(Token::Number(literal.parse().unwrap_or(f64::NAN)));
    literal.clear();
}

fn push_binary(tokens: &mut Vec<Token>, literal: &mut String, op: BinaryOp) {
    flush_literal(tokens, literal);
    tokens.push(Token::Op(op));
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn eval(&self) -> Result<f64, EvalError> {
        match self {
            Expr::Number(v) => Ok(*v),
            Expr::Binary { op, left, right } => {
                let l = left.eval()?;
                let r = right.eval()?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div => {
                        if r == 0.0 {
                            Err(EvalError::DivisionByZero)
                        } else {
                            Ok(l / r)
                        }
                    }
                    BinaryOp::Pow => Ok(l.powf(r)),
                }
            }
        }
    }
}

/// Recursive-descent parser over the token stream.
struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, index: 0 }
    }

    fn parse(mut self) -> Result<Expr, EvalError> {
        let expr = self.parse_add_sub()?;
        if self.index != self.tokens.len() {
            return Err(EvalError::UnexpectedToken(self.index));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.index).copied()
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn parse_add_sub(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_mul_div()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) => op,
                _ => break,
            };
            self.index += 1;
            let rhs = self.parse_mul_div()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_pow()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) => op,
                _ => break,
            };
            self.index += 1;
            let rhs = self.parse_pow()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    // Right-associative: 2 ** 3 ** 2 == 2 ** 9.
    fn parse_pow(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::Op(BinaryOp::Pow))) {
            self.index += 1;
            let exponent = self.parse_pow()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let at = self.index;
        match self.consume() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::LParen) => {
                let expr = self.parse_add_sub()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(expr),
                    Some(_) => Err(EvalError::UnexpectedToken(self.index - 1)),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(_) => Err(EvalError::UnexpectedToken(at)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}
