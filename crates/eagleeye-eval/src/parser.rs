//! Parser: recursive descent over the lexer's tokens.
//!
//! Precedence, loosest first: conditional, `or`, `and`, `not`,
//! comparisons and membership, `+ -`, `* / %`, unary `+ -`, `**`, then
//! atoms and calls. `**` is right-associative and binds tighter than a
//! unary minus on its left (`-2 ** 2 == -4`).
//!
//! Anything outside the grammar is rejected here: unknown functions, floor
//! division, list comprehensions, comprehensions that are not the sole
//! argument of a call, and chained membership tests.

use crate::ast::{BinaryOp, BoolOp, Builtin, CmpOp, Expr, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Maximum syntactic nesting (parentheses, brackets, calls, unary chains).
pub const MAX_DEPTH: usize = 64;

/// Parse a bound expression into a tree.
pub fn parse(input: &str) -> ExprResult<Expr> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    if !parser.check(&TokenKind::Eof) {
        let tok = parser.peek();
        return Err(ExprError::syntax(
            tok.offset,
            format!("unexpected {} after complete expression", tok.kind),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    // ─── Expressions ─────────────────────────────────────────────────

    fn parse_expression(&mut self) -> ExprResult<Expr> {
        self.enter()?;
        let result = self.parse_conditional();
        self.depth -= 1;
        result
    }

    fn parse_conditional(&mut self) -> ExprResult<Expr> {
        let body = self.parse_or()?;
        if !self.eat(&TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or()?;
        self.expect(&TokenKind::Else)?;
        let orelse = self.parse_expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let first = self.parse_and()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(&TokenKind::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            operands,
        })
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let first = self.parse_not()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(&TokenKind::And) {
            operands.push(self.parse_not()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            operands,
        })
    }

    fn parse_not(&mut self) -> ExprResult<Expr> {
        if !self.eat(&TokenKind::Not) {
            return self.parse_comparison();
        }
        self.enter()?;
        let operand = self.parse_not();
        self.depth -= 1;
        Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand?),
        })
    }

    fn parse_comparison(&mut self) -> ExprResult<Expr> {
        let first = self.parse_sum()?;
        let mut rest: Vec<(CmpOp, Expr)> = Vec::new();
        let mut membership: Option<(bool, Expr)> = None;

        loop {
            let offset = self.peek().offset;
            let op = match self.peek_kind() {
                TokenKind::Gt => Some(CmpOp::Gt),
                TokenKind::Lt => Some(CmpOp::Lt),
                TokenKind::Ge => Some(CmpOp::Ge),
                TokenKind::Le => Some(CmpOp::Le),
                TokenKind::EqEq => Some(CmpOp::Eq),
                TokenKind::NotEq => Some(CmpOp::NotEq),
                TokenKind::Is => Some(CmpOp::Is),
                TokenKind::In => None,
                TokenKind::Not if self.peek_kind_at(1) == &TokenKind::In => None,
                _ => break,
            };

            if rest.len() + usize::from(membership.is_some()) >= 1
                && (op.is_none() || membership.is_some())
            {
                return Err(ExprError::Unsupported(format!(
                    "chained membership test at offset {offset}"
                )));
            }

            match op {
                Some(CmpOp::Is) => {
                    self.advance();
                    let op = if self.eat(&TokenKind::Not) {
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    };
                    rest.push((op, self.parse_sum()?));
                }
                Some(op) => {
                    self.advance();
                    rest.push((op, self.parse_sum()?));
                }
                None => {
                    let negated = self.eat(&TokenKind::Not);
                    self.expect(&TokenKind::In)?;
                    membership = Some((negated, self.parse_sum()?));
                }
            }
        }

        if let Some((negated, haystack)) = membership {
            return Ok(Expr::Membership {
                needle: Box::new(first),
                haystack: Box::new(haystack),
                negated,
            });
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Compare {
            first: Box::new(first),
            rest,
        })
    }

    fn parse_sum(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                TokenKind::SlashSlash => {
                    return Err(ExprError::Unsupported(
                        "floor division '//' is not allowed".to_string(),
                    ))
                }
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> ExprResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_factor();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_power(&mut self) -> ExprResult<Expr> {
        let base = self.parse_primary()?;
        if !self.eat(&TokenKind::StarStar) {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.parse_factor();
        self.depth -= 1;
        Ok(binary(BinaryOp::Pow, base, exponent?))
    }

    // ─── Atoms ───────────────────────────────────────────────────────

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        let tok = self.advance().clone();
        match tok.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::None => Ok(Expr::None),
            TokenKind::Ident(name) => {
                if self.check(&TokenKind::LParen) {
                    self.parse_call(&name)
                } else {
                    Ok(Expr::Name(name))
                }
            }
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::Eof => Err(ExprError::syntax(tok.offset, "unexpected end of expression")),
            other => Err(ExprError::syntax(tok.offset, format!("unexpected {other}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> ExprResult<Expr> {
        let func = Builtin::from_name(name).ok_or_else(|| {
            ExprError::Unsupported(format!("function '{name}' is not allowed"))
        })?;
        self.expect(&TokenKind::LParen)?;

        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Call { func, args });
        }
        let first = self.parse_expression()?;
        if self.check(&TokenKind::For) {
            let comprehension = self.parse_comprehension(first)?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::Call {
                func,
                args: vec![comprehension],
            });
        }
        args.push(first);
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            args.push(self.parse_expression()?);
        }
        if self.check(&TokenKind::For) {
            return Err(ExprError::Unsupported(
                "a comprehension must be the only argument of a call".to_string(),
            ));
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Call { func, args })
    }

    fn parse_comprehension(&mut self, element: Expr) -> ExprResult<Expr> {
        self.expect(&TokenKind::For)?;
        let var = match self.advance().clone() {
            Token {
                kind: TokenKind::Ident(name),
                ..
            } => name,
            tok => {
                return Err(ExprError::syntax(
                    tok.offset,
                    format!("expected loop variable, found {}", tok.kind),
                ))
            }
        };
        self.expect(&TokenKind::In)?;
        let iter = self.parse_or()?;
        let filter = if self.eat(&TokenKind::If) {
            Some(Box::new(self.parse_or()?))
        } else {
            None
        };
        if self.check(&TokenKind::For) {
            return Err(ExprError::Unsupported(
                "nested comprehension loops are not allowed".to_string(),
            ));
        }
        Ok(Expr::Comprehension {
            element: Box::new(element),
            var,
            iter: Box::new(iter),
            filter,
        })
    }

    /// After `(`: empty tuple, grouping, or tuple display.
    fn parse_parenthesized(&mut self) -> ExprResult<Expr> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.check(&TokenKind::For) {
            return Err(ExprError::Unsupported(
                "a comprehension is only allowed as a function argument".to_string(),
            ));
        }
        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }
        self.expect(&TokenKind::Comma)?;
        let mut items = vec![first];
        while !self.check(&TokenKind::RParen) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Tuple(items))
    }

    /// After `[`: list display.
    fn parse_list(&mut self) -> ExprResult<Expr> {
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            if items.len() == 1 && self.check(&TokenKind::For) {
                return Err(ExprError::Unsupported(
                    "list comprehensions are not allowed".to_string(),
                ));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::List(items))
    }

    // ─── Token cursor ────────────────────────────────────────────────

    fn enter(&mut self) -> ExprResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_kind_at(&self, ahead: usize) -> &TokenKind {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ExprResult<()> {
        if self.eat(kind) {
            return Ok(());
        }
        let tok = self.peek();
        Err(ExprError::syntax(
            tok.offset,
            format!("expected {kind}, found {}", tok.kind),
        ))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
