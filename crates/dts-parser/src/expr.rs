//! Evaluation of inline arithmetic in cell and byte arrays.
//!
//! Only integer literals, parentheses and a fixed operator set are accepted: `|`, `^`, `<<`,
//! `+`, `-`, `*`, `/`, `**` and unary `-`. Anything else, including names, is rejected by the
//! lexer.

use logos::Logos;
use tracing::trace;

use crate::{value::parse_integer, ExprError};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum TokenKind {
    #[regex("[0-9][0-9a-zA-Z]*")]
    Number,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("**")]
    DoubleAsterisk,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("|")]
    Pipe,
    #[token("<<")]
    LShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    BitOr,
    BitXor,
    LShift,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Pipe => Self::BitOr,
            TokenKind::Caret => Self::BitXor,
            TokenKind::LShift => Self::LShift,
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Asterisk => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::DoubleAsterisk => Self::Pow,
            _ => return None,
        })
    }

    /// Left and right binding power. `**` binds tighter than unary minus and is right
    /// associative.
    fn binding_power(self) -> (u8, u8) {
        match self {
            Self::BitOr => (1, 2),
            Self::BitXor => (3, 4),
            Self::LShift => (5, 6),
            Self::Add | Self::Sub => (7, 8),
            Self::Mul | Self::Div => (9, 10),
            Self::Pow => (14, 13),
        }
    }

    /// Applies the operator with overflow checks.
    ///
    /// # Errors
    ///
    /// Fails on overflow, division by zero, negative exponents and negative shifts.
    pub fn eval(self, l: i64, r: i64) -> Result<i64, ExprError> {
        match self {
            Self::BitOr => Ok(l | r),
            Self::BitXor => Ok(l ^ r),
            Self::LShift => {
                let shift = u32::try_from(r).map_err(|_| ExprError::InvalidShift(r))?;
                2i64.checked_pow(shift)
                    .and_then(|factor| l.checked_mul(factor))
                    .ok_or(ExprError::Overflow)
            }
            Self::Add => l.checked_add(r).ok_or(ExprError::Overflow),
            Self::Sub => l.checked_sub(r).ok_or(ExprError::Overflow),
            Self::Mul => l.checked_mul(r).ok_or(ExprError::Overflow),
            Self::Div if r == 0 => Err(ExprError::DivisionByZero),
            Self::Div => l.checked_div(r).ok_or(ExprError::Overflow),
            Self::Pow => {
                let exp = u32::try_from(r).map_err(|_| {
                    if r < 0 {
                        ExprError::NegativeExponent
                    } else {
                        ExprError::Overflow
                    }
                })?;
                l.checked_pow(exp).ok_or(ExprError::Overflow)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Lit(i64),
    Neg(Box<Expression>),
    Binary(Box<Expression>, BinaryOp, Box<Expression>),
}

impl Expression {
    /// # Errors
    ///
    /// See [`BinaryOp::eval`].
    pub fn eval(&self) -> Result<i64, ExprError> {
        match self {
            Self::Lit(n) => Ok(*n),
            Self::Neg(e) => e.eval()?.checked_neg().ok_or(ExprError::Overflow),
            Self::Binary(l, op, r) => op.eval(l.eval()?, r.eval()?),
        }
    }
}

/// Binding power of unary minus.
const PREFIX_BP: u8 = 11;

/// Bound for parenthesis and unary minus nesting plus operator chain length, which keeps both
/// parsing and evaluation recursion bounded.
pub const MAX_EXPR_DEPTH: usize = 256;

struct Parser<'input> {
    tokens: Vec<(TokenKind, &'input str)>,
    cursor: usize,
}

impl<'input> Parser<'input> {
    fn new(text: &'input str) -> Result<Self, ExprError> {
        let mut lexer = TokenKind::lexer(text);
        let mut tokens = Vec::new();
        while let Some(kind) = lexer.next() {
            let kind = kind.map_err(|()| ExprError::UnexpectedToken(lexer.slice().to_owned()))?;
            tokens.push((kind, lexer.slice()));
        }
        Ok(Self { tokens, cursor: 0 })
    }

    fn peek(&self) -> Option<(TokenKind, &'input str)> {
        self.tokens.get(self.cursor).copied()
    }

    fn bump(&mut self) -> Option<(TokenKind, &'input str)> {
        let token = self.peek()?;
        self.cursor += 1;
        Some(token)
    }

    /// Pratt parser, see <https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html>
    ///
    /// `depth` bounds the height of the returned tree.
    fn expr_bp(&mut self, min_bp: u8, depth: usize) -> Result<Expression, ExprError> {
        if depth > MAX_EXPR_DEPTH {
            return Err(ExprError::TooDeep(MAX_EXPR_DEPTH));
        }

        let mut lhs = match self.bump() {
            Some((TokenKind::Number, text)) => Expression::Lit(
                parse_integer(text).map_err(|_| ExprError::InvalidLiteral(text.to_owned()))?,
            ),
            Some((TokenKind::Minus, _)) => {
                Expression::Neg(Box::new(self.expr_bp(PREFIX_BP, depth + 1)?))
            }
            Some((TokenKind::LParen, _)) => {
                let inner = self.expr_bp(0, depth + 1)?;
                match self.bump() {
                    Some((TokenKind::RParen, _)) => inner,
                    Some((_, text)) => return Err(ExprError::UnexpectedToken(text.to_owned())),
                    None => return Err(ExprError::UnbalancedParens),
                }
            }
            Some((_, text)) => return Err(ExprError::UnexpectedToken(text.to_owned())),
            None => return Err(ExprError::UnexpectedEnd),
        };

        // each operator in a chain adds a level to the left operand
        let mut depth = depth;
        loop {
            let op = match self.peek() {
                None | Some((TokenKind::RParen, _)) => break,
                Some((kind, text)) => BinaryOp::from_token(kind)
                    .ok_or_else(|| ExprError::UnexpectedToken(text.to_owned()))?,
            };

            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.bump();

            depth += 1;
            let rhs = self.expr_bp(r_bp, depth)?;
            lhs = Expression::Binary(Box::new(lhs), op, Box::new(rhs));
        }

        Ok(lhs)
    }
}

/// Parses an arithmetic expression without evaluating it.
///
/// # Errors
///
/// Fails on any token outside the accepted grammar, on unbalanced parentheses and on nesting
/// deeper than [`MAX_EXPR_DEPTH`].
pub fn parse_expr(text: &str) -> Result<Expression, ExprError> {
    let mut parser = Parser::new(text)?;
    let expr = parser.expr_bp(0, 0)?;
    match parser.bump() {
        None => Ok(expr),
        Some((TokenKind::RParen, _)) => Err(ExprError::UnbalancedParens),
        Some((_, text)) => Err(ExprError::UnexpectedToken(text.to_owned())),
    }
}

/// Parses and evaluates an arithmetic expression.
///
/// # Errors
///
/// See [`parse_expr`] and [`BinaryOp::eval`].
pub fn eval_expr(text: &str) -> Result<i64, ExprError> {
    parse_expr(text)?.eval()
}

/// Returns whether `c` may border a substituted group, i.e. separates cells.
///
/// A stray `)` passes here and is reported as unbalanced afterwards.
fn is_cell_boundary(c: Option<char>) -> bool {
    c.map_or(true, |c| {
        c.is_whitespace() || matches!(c, '<' | '>' | '[' | ']' | ',' | ')')
    })
}

/// Replaces every top-level parenthesized group in `text` with its decimal value.
///
/// Each group must stand alone as a cell: `<(1)(2)>` and `<1(2)>` are rejected instead of being
/// joined into one literal.
pub(crate) fn substitute_expressions(text: &str) -> Result<String, ExprError> {
    if !text.contains(['(', ')']) {
        return Ok(text.to_owned());
    }

    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut start = 0;
    let mut copied = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    out.push_str(&text[copied..idx]);
                    start = idx;
                }
                depth += 1;
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or(ExprError::UnbalancedParens)?;
                if depth == 0 {
                    let expr = &text[start..=idx];
                    if !is_cell_boundary(text[..start].chars().next_back())
                        || !is_cell_boundary(text[idx + 1..].chars().next())
                    {
                        return Err(ExprError::Unseparated(expr.to_owned()));
                    }
                    let value = eval_expr(expr)?;
                    trace!(expr, value, "Evaluated expression");
                    out.push_str(&value.to_string());
                    copied = idx + 1;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ExprError::UnbalancedParens);
    }
    out.push_str(&text[copied..]);

    Ok(out)
}
