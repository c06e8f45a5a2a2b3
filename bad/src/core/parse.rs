//! Recursive descent parser for B.
//!
//! Operator precedence, tightest first:
//!
//! | level | operators                     | associativity |
//! |-------|-------------------------------|---------------|
//! | 1     | `[]` `()` postfix `++` `--`   | left          |
//! | 2     | prefix `*` `&` `-` `!` `++` `--` | right      |
//! | 3     | `*` `/` `%`                   | left          |
//! | 4     | `+` `-`                       | left          |
//! | 5     | `<<` `>>`                     | left          |
//! | 6     | `<` `<=` `>` `>=`             | left          |
//! | 7     | `==` `!=`                     | left          |
//! | 8     | `&`                           | left          |
//! | 9     | `\|`                          | left          |
//! | 10    | `?:`                          | right         |
//! | 11    | `=` and `=op`                 | right         |
//!
//! A syntax error abandons the current definition: the parser records a
//! diagnostic, skips to the end of the definition and carries on with the
//! next one. Statements and expressions may nest at most [`MAX_NESTING`]
//! levels deep, which keeps every later tree walk within the stack.

use crate::core::ast::{
    ArraySize, BinaryOp, Char, Const, Def, Expr, ExprKind, Func, Global, Id, InitVal, Int,
    Program, Stmt, StmtKind, Str, UnaryOp,
};
use crate::core::context::{Context, Span};
use crate::core::diagnostic::{Diagnostic, ErrorCode};
use crate::core::lex::{Lexeme, Literal, Token, TokenList};
use crate::core::state::{CompilationConfiguration, VerbosityLevel};

/// The result of [`parse`]: the definitions that parsed, plus every syntax
/// error found along the way.
#[derive(Debug)]
pub struct Parsed<'ctx> {
    pub program: Program<'ctx>,
    pub diagnostics: Vec<Diagnostic>,
}

type PResult<T> = std::result::Result<T, Diagnostic>;

/// How deep statements and expressions may nest inside one definition.
pub const MAX_NESTING: usize = 64;

/// Parses a token list into a [`Program`] allocated in `ctx`.
pub fn parse<'ctx>(
    tokens: &TokenList<'ctx>, ctx: &'ctx Context, config: &CompilationConfiguration,
) -> Parsed<'ctx> {
    let verbosity = config.verbosity_levels.parse_verbosity_level;
    if verbosity >= VerbosityLevel::Trace {
        log::info!("parse: start, {} lexemes", tokens.len());
    }

    ctx.advance_to(ctx.source().len());
    let eof = ctx.next_span(0);

    let mut parser = Parser {
        ctx,
        lexemes: &tokens.lexemes,
        pos: 0,
        depth: 0,
        eof,
    };

    let mut defs = Vec::new();
    let mut diagnostics = Vec::new();
    while !parser.at_end() {
        let start = parser.pos;
        parser.depth = 0;
        match parser.definition() {
            Ok(def) => {
                if verbosity >= VerbosityLevel::Debug {
                    log::debug!(
                        "parse: {} definition `{}`",
                        def.span().display(ctx),
                        def.name().name
                    );
                }
                defs.push(def);
            }
            Err(diag) => {
                diagnostics.push(diag);
                parser.recover(start);
            }
        }
    }

    if verbosity >= VerbosityLevel::Trace {
        log::info!(
            "parse: {} definitions, {} diagnostics",
            defs.len(),
            diagnostics.len()
        );
    }

    Parsed {
        program: Program {
            defs: ctx.arena.alloc_slice_copy(&defs),
        },
        diagnostics,
    }
}

struct Parser<'a, 'ctx> {
    ctx: &'ctx Context,
    lexemes: &'a [Lexeme<'ctx>],
    pos: usize,
    /// Current nesting, reset for every definition.
    depth: usize,
    eof: Span,
}

impl<'ctx> Parser<'_, 'ctx> {
    // Cursor helpers

    fn at_end(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    fn peek(&self) -> Option<Token> {
        self.lexemes.get(self.pos).map(|l| l.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<Token> {
        self.lexemes.get(self.pos + ahead).map(|l| l.token)
    }

    fn bump(&mut self) -> Option<Lexeme<'ctx>> {
        let lexeme = self.lexemes.get(self.pos).copied();
        if lexeme.is_some() {
            self.pos += 1;
        }
        lexeme
    }

    fn eat(&mut self, token: Token) -> Option<Lexeme<'ctx>> {
        if self.peek() == Some(token) {
            self.bump()
        } else {
            None
        }
    }

    fn expect(&mut self, token: Token) -> PResult<Lexeme<'ctx>> {
        match self.eat(token) {
            Some(lexeme) => Ok(lexeme),
            None => Err(self.unexpected(token.describe())),
        }
    }

    /// Span of the last consumed lexeme.
    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.lexemes.get(i)) {
            Some(lexeme) => lexeme.span,
            None => self.eof,
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        match self.lexemes.get(self.pos) {
            Some(found) => Diagnostic::error(
                ErrorCode::UnexpectedToken,
                found.span,
                format!("expected {}, found {}", expected, found.token.describe()),
            ),
            None => Diagnostic::error(
                ErrorCode::UnexpectedEof,
                self.eof,
                format!("expected {}", expected),
            ),
        }
    }

    /// Goes one level deeper; callers step back out with `self.depth -= 1`
    /// on success. After an error the count is reset with the definition.
    fn descend(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth <= MAX_NESTING {
            return Ok(());
        }
        let span = match self.lexemes.get(self.pos) {
            Some(lexeme) => lexeme.span,
            None => self.eof,
        };
        Err(Diagnostic::error(
            ErrorCode::NestingTooDeep,
            span,
            format!("nesting is deeper than {} levels", MAX_NESTING),
        ))
    }

    fn alloc<T>(&self, value: T) -> &'ctx T {
        let ctx: &'ctx Context = self.ctx;
        ctx.arena.alloc(value)
    }

    fn alloc_slice<T: Copy>(&self, values: &[T]) -> &'ctx [T] {
        let ctx: &'ctx Context = self.ctx;
        ctx.arena.alloc_slice_copy(values)
    }

    fn join(&self, start: Span, end: Span) -> Span {
        start.to(end, self.ctx)
    }

    /// Skips the rest of a broken definition that started at `start`.
    fn recover(&mut self, start: usize) {
        self.pos = start;
        let mut depth = 0usize;
        while let Some(lexeme) = self.bump() {
            match lexeme.token {
                Token::LeftBrace => depth += 1,
                Token::RightBrace if depth <= 1 => break,
                Token::RightBrace => depth -= 1,
                Token::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
    }

    // Definitions

    fn definition(&mut self) -> PResult<Def<'ctx>> {
        let name = self.ident("a definition")?;
        if self.eat(Token::LeftParen).is_some() {
            self.function(name).map(Def::Func)
        } else {
            self.global(name).map(Def::Global)
        }
    }

    fn function(&mut self, name: Id<'ctx>) -> PResult<Func<'ctx>> {
        let mut params = Vec::new();
        if self.eat(Token::RightParen).is_none() {
            loop {
                params.push(self.ident("a parameter name")?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
            self.expect(Token::RightParen)?;
        }

        let stmt = self.statement()?;
        let body = match stmt.kind {
            StmtKind::Block(stmts) => stmts,
            _ => self.alloc_slice(&[stmt]),
        };

        Ok(Func {
            name,
            params: self.alloc_slice(&params),
            body,
            span: self.join(name.span, stmt.span),
        })
    }

    fn global(&mut self, name: Id<'ctx>) -> PResult<Global<'ctx>> {
        let size = match self.eat(Token::LeftBracket) {
            Some(open) => {
                let size = if self.peek() == Some(Token::RightBracket) {
                    ArraySize::Implicit
                } else if self.at_constant() {
                    ArraySize::Explicit(self.constant("a vector size")?)
                } else {
                    return Err(match self.lexemes.get(self.pos) {
                        Some(found) => Diagnostic::error(
                            ErrorCode::InvalidArraySize,
                            found.span,
                            format!("vector size must be a constant, found {}", found.token.describe()),
                        ),
                        None => self.unexpected("a vector size"),
                    });
                };
                let close = self.expect(Token::RightBracket)?;
                Some((size, self.join(open.span, close.span)))
            }
            None => None,
        };

        let mut inits = Vec::new();
        if self.peek() != Some(Token::Semicolon) {
            loop {
                inits.push(self.init_val()?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
        }
        let semi = self.expect(Token::Semicolon)?;

        Ok(Global {
            name,
            size,
            inits: self.alloc_slice(&inits),
            span: self.join(name.span, semi.span),
        })
    }

    fn init_val(&mut self) -> PResult<InitVal<'ctx>> {
        if self.peek() == Some(Token::Identifier) {
            return Ok(InitVal::Id(self.ident("a name")?));
        }
        if self.at_constant() {
            return Ok(InitVal::Const(self.constant("an initializer")?));
        }
        Err(self.unexpected("a name or constant"))
    }

    fn ident(&mut self, expected: &str) -> PResult<Id<'ctx>> {
        match self.eat(Token::Identifier) {
            Some(lexeme) => Ok(Id {
                name: lexeme.span.text(self.ctx),
                span: lexeme.span,
            }),
            None => Err(self.unexpected(expected)),
        }
    }

    fn at_constant(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Number | Token::Char | Token::String)
        )
    }

    fn constant(&mut self, expected: &str) -> PResult<Const<'ctx>> {
        if !self.at_constant() {
            return Err(self.unexpected(expected));
        }
        let Some(lexeme) = self.bump() else {
            return Err(self.unexpected(expected));
        };
        let span = lexeme.span;
        Ok(match lexeme.literal {
            Some(Literal::Char(value)) => Const::Char(Char { value, span }),
            Some(Literal::Str(value)) => Const::Str(Str { value, span }),
            Some(Literal::Int(value)) => Const::Int(Int { value, span }),
            None => Const::Int(Int { value: 0, span }),
        })
    }

    // Statements

    fn statement(&mut self) -> PResult<Stmt<'ctx>> {
        self.descend()?;
        let Some(first) = self.lexemes.get(self.pos).copied() else {
            return Err(self.unexpected("a statement"));
        };
        let start = first.span;

        let kind = match first.token {
            Token::Auto => {
                self.bump();
                let mut decls = Vec::new();
                loop {
                    let name = self.ident("a variable name")?;
                    let init = if self.at_constant() {
                        Some(self.constant("an initializer")?)
                    } else {
                        None
                    };
                    decls.push((name, init));
                    if self.eat(Token::Comma).is_none() {
                        break;
                    }
                }
                self.expect(Token::Semicolon)?;
                StmtKind::Auto {
                    decls: self.alloc_slice(&decls),
                }
            }
            Token::Extrn => {
                self.bump();
                let mut decls = Vec::new();
                loop {
                    decls.push(self.ident("an external name")?);
                    if self.eat(Token::Comma).is_none() {
                        break;
                    }
                }
                self.expect(Token::Semicolon)?;
                StmtKind::Extrn {
                    decls: self.alloc_slice(&decls),
                }
            }
            Token::Identifier if self.peek_at(1) == Some(Token::Colon) => {
                let label = self.ident("a label")?;
                self.bump();
                StmtKind::Label(label)
            }
            Token::Case => {
                self.bump();
                let value = self.constant("a case constant")?;
                self.expect(Token::Colon)?;
                StmtKind::Case(value)
            }
            Token::LeftBrace => {
                self.bump();
                let mut stmts = Vec::new();
                while self.eat(Token::RightBrace).is_none() {
                    if self.at_end() {
                        return Err(self.unexpected(Token::RightBrace.describe()));
                    }
                    stmts.push(self.statement()?);
                }
                StmtKind::Block(self.alloc_slice(&stmts))
            }
            Token::If => {
                self.bump();
                self.expect(Token::LeftParen)?;
                let cond = self.expr()?;
                self.expect(Token::RightParen)?;
                let body = self.statement()?;
                let elze = match self.eat(Token::Else) {
                    Some(_) => {
                        let elze = self.statement()?;
                        Some(self.alloc(elze))
                    }
                    None => None,
                };
                StmtKind::If {
                    cond,
                    body: self.alloc(body),
                    elze,
                }
            }
            Token::While => {
                self.bump();
                self.expect(Token::LeftParen)?;
                let cond = self.expr()?;
                self.expect(Token::RightParen)?;
                let body = self.statement()?;
                StmtKind::While {
                    cond,
                    body: self.alloc(body),
                }
            }
            Token::Switch => {
                self.bump();
                let switchee = self.expr()?;
                let body = self.statement()?;
                StmtKind::Switch {
                    switchee,
                    body: self.alloc(body),
                }
            }
            Token::Goto => {
                self.bump();
                let target = self.expr()?;
                self.expect(Token::Semicolon)?;
                StmtKind::Goto(target)
            }
            Token::Return => {
                self.bump();
                let value = if self.eat(Token::Semicolon).is_some() {
                    None
                } else {
                    let value = self.expr()?;
                    self.expect(Token::Semicolon)?;
                    Some(value)
                };
                StmtKind::Return(value)
            }
            Token::Semicolon => {
                self.bump();
                StmtKind::Empty
            }
            _ => {
                let expr = self.expr()?;
                self.expect(Token::Semicolon)?;
                StmtKind::Expr(expr)
            }
        };

        self.depth -= 1;
        Ok(Stmt {
            kind,
            span: self.join(start, self.prev_span()),
        })
    }

    // Expressions

    fn expr(&mut self) -> PResult<Expr<'ctx>> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr<'ctx>> {
        let lhs = self.ternary()?;
        let Some(op) = self.peek().and_then(assign_op) else {
            return Ok(lhs);
        };
        self.bump();
        self.descend()?;
        let rhs = self.assignment()?;
        self.depth -= 1;

        let span = self.join(lhs.span, rhs.span);
        let (lhs, rhs) = (self.alloc(lhs), self.alloc(rhs));
        let kind = match op {
            None => ExprKind::Assign { lhs, rhs },
            Some(kind) => ExprKind::Binary {
                lhs,
                rhs,
                kind,
                is_assign: true,
            },
        };
        Ok(Expr { kind, span })
    }

    fn ternary(&mut self) -> PResult<Expr<'ctx>> {
        let cond = self.binary(0)?;
        if self.eat(Token::Question).is_none() {
            return Ok(cond);
        }
        self.descend()?;
        let yes = self.assignment()?;
        self.expect(Token::Colon)?;
        let no = self.ternary()?;
        self.depth -= 1;

        Ok(Expr {
            span: self.join(cond.span, no.span),
            kind: ExprKind::Ternary {
                cond: self.alloc(cond),
                yes: self.alloc(yes),
                no: self.alloc(no),
            },
        })
    }

    fn binary(&mut self, min_prec: u8) -> PResult<Expr<'ctx>> {
        let mut lhs = self.unary()?;
        // Each operator in a left-leaning chain adds a level to the tree.
        let mut chain = 0;
        while let Some((kind, prec)) = self.peek().and_then(binary_op) {
            if prec < min_prec {
                break;
            }
            self.descend()?;
            chain += 1;
            self.bump();
            let rhs = self.binary(prec + 1)?;
            lhs = Expr {
                span: self.join(lhs.span, rhs.span),
                kind: ExprKind::Binary {
                    lhs: self.alloc(lhs),
                    rhs: self.alloc(rhs),
                    kind,
                    is_assign: false,
                },
            };
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<Expr<'ctx>> {
        self.descend()?;
        let expr = self.prefix()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn prefix(&mut self) -> PResult<Expr<'ctx>> {
        let Some(first) = self.lexemes.get(self.pos).copied() else {
            return Err(self.unexpected("an expression"));
        };

        let op = match first.token {
            Token::Asterisk => None,
            Token::Ampersand => None,
            Token::Minus => Some(UnaryOp::Minus),
            Token::Exclamation => Some(UnaryOp::Not),
            Token::PlusPlus => Some(UnaryOp::PreInc),
            Token::MinusMinus => Some(UnaryOp::PreDec),
            _ => return self.postfix(),
        };
        self.bump();
        let operand = self.unary()?;
        let span = self.join(first.span, operand.span);
        let operand = self.alloc(operand);

        let kind = match (first.token, op) {
            (_, Some(kind)) => ExprKind::Unary {
                expr: operand,
                kind,
            },
            (Token::Ampersand, None) => ExprKind::Ref { expr: operand },
            _ => ExprKind::Deref { ptr: operand },
        };
        Ok(Expr { kind, span })
    }

    fn postfix(&mut self) -> PResult<Expr<'ctx>> {
        let mut expr = self.primary()?;
        let mut chain = 0;
        loop {
            if matches!(
                self.peek(),
                Some(Token::LeftBracket | Token::LeftParen | Token::PlusPlus | Token::MinusMinus)
            ) {
                self.descend()?;
                chain += 1;
            }
            match self.peek() {
                Some(Token::LeftBracket) => {
                    self.bump();
                    let index = self.expr()?;
                    let close = self.expect(Token::RightBracket)?;
                    expr = Expr {
                        span: self.join(expr.span, close.span),
                        kind: ExprKind::Index {
                            ptr: self.alloc(expr),
                            index: self.alloc(index),
                        },
                    };
                }
                Some(Token::LeftParen) => {
                    self.bump();
                    let mut args = Vec::new();
                    if self.peek() != Some(Token::RightParen) {
                        loop {
                            let arg = self.assignment()?;
                            args.push(self.alloc(arg));
                            if self.eat(Token::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let close = self.expect(Token::RightParen)?;
                    expr = Expr {
                        span: self.join(expr.span, close.span),
                        kind: ExprKind::Call {
                            func: self.alloc(expr),
                            args: self.alloc_slice(&args),
                        },
                    };
                }
                Some(token @ (Token::PlusPlus | Token::MinusMinus)) => {
                    let op = self.bump().map(|l| l.span).unwrap_or(self.eof);
                    let kind = if token == Token::PlusPlus {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    expr = Expr {
                        span: self.join(expr.span, op),
                        kind: ExprKind::Unary {
                            expr: self.alloc(expr),
                            kind,
                        },
                    };
                }
                _ => {
                    self.depth -= chain;
                    return Ok(expr);
                }
            }
        }
    }

    fn primary(&mut self) -> PResult<Expr<'ctx>> {
        match self.peek() {
            Some(Token::Identifier) => {
                let id = self.ident("a name")?;
                Ok(Expr {
                    kind: ExprKind::InitVal(InitVal::Id(id)),
                    span: id.span,
                })
            }
            Some(Token::Number | Token::Char | Token::String) => {
                let value = self.constant("a constant")?;
                Ok(Expr {
                    kind: ExprKind::InitVal(InitVal::Const(value)),
                    span: value.span(),
                })
            }
            Some(Token::LeftParen) => {
                let open = self.expect(Token::LeftParen)?;
                let inner = self.expr()?;
                let close = self.expect(Token::RightParen)?;
                Ok(Expr {
                    span: self.join(open.span, close.span),
                    kind: ExprKind::Parens(self.alloc(inner)),
                })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

/// `Some(None)` is plain `=`; `Some(Some(op))` is `=op`.
fn assign_op(token: Token) -> Option<Option<BinaryOp>> {
    Some(match token {
        Token::Equals => None,
        Token::AssignVerticalBar => Some(BinaryOp::Or),
        Token::AssignAmpersand => Some(BinaryOp::And),
        Token::AssignEqualsEquals => Some(BinaryOp::Eq),
        Token::AssignExclamationEquals => Some(BinaryOp::Ne),
        Token::AssignGreaterThan => Some(BinaryOp::Gt),
        Token::AssignGreaterThanEquals => Some(BinaryOp::Ge),
        Token::AssignLessThan => Some(BinaryOp::Lt),
        Token::AssignLessThanEquals => Some(BinaryOp::Le),
        Token::AssignLessThanLessThan => Some(BinaryOp::Shl),
        Token::AssignGreaterThanGreaterThan => Some(BinaryOp::Shr),
        Token::AssignPlus => Some(BinaryOp::Add),
        Token::AssignMinus => Some(BinaryOp::Sub),
        Token::AssignPercent => Some(BinaryOp::Rem),
        Token::AssignAsterisk => Some(BinaryOp::Mul),
        Token::AssignForwardSlash => Some(BinaryOp::Div),
        _ => return None,
    })
}

/// Binary operator and its precedence; higher binds tighter.
fn binary_op(token: Token) -> Option<(BinaryOp, u8)> {
    Some(match token {
        Token::VerticalBar => (BinaryOp::Or, 0),
        Token::Ampersand => (BinaryOp::And, 1),
        Token::EqualsEquals => (BinaryOp::Eq, 2),
        Token::ExclamationEquals => (BinaryOp::Ne, 2),
        Token::LessThan => (BinaryOp::Lt, 3),
        Token::LessThanEquals => (BinaryOp::Le, 3),
        Token::GreaterThan => (BinaryOp::Gt, 3),
        Token::GreaterThanEquals => (BinaryOp::Ge, 3),
        Token::LessThanLessThan => (BinaryOp::Shl, 4),
        Token::GreaterThanGreaterThan => (BinaryOp::Shr, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Asterisk => (BinaryOp::Mul, 6),
        Token::ForwardSlash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    })
}
