//! Name resolution and other checks run on a parsed program.
//!
//! B has no types, so checking is mostly about names: every name an
//! expression uses must be declared in the enclosing function as a
//! parameter, an `auto`, an `extrn` or a label. Declarations are collected
//! for the whole function before any use is resolved, which lets labels be
//! targeted before they appear.

use std::collections::{HashMap, HashSet};

use crate::core::ast::{
    ArraySize, Const, Def, Expr, ExprKind, Func, Global, Id, InitVal, Program, Stmt, StmtKind,
};
use crate::core::context::{Context, Span};
use crate::core::diagnostic::{Diagnostic, ErrorCode};
use crate::core::state::{CompilationConfiguration, VerbosityLevel};

/// Runs every check over `program`, returning errors and warnings in source
/// order per definition.
pub fn check(
    program: &Program, ctx: &Context, config: &CompilationConfiguration,
) -> Vec<Diagnostic> {
    let verbosity = config.verbosity_levels.parse_execute_verbosity_level;
    if verbosity >= VerbosityLevel::Trace {
        log::info!("check: start, {} definitions", program.defs.len());
    }

    let mut diagnostics = Vec::new();
    let mut defined: HashMap<&str, Span> = HashMap::new();

    for def in program.defs {
        let name = def.name();
        if let Some(previous) = defined.get(name.name) {
            diagnostics.push(Diagnostic::error(
                ErrorCode::Redefinition,
                name.span,
                format!(
                    "`{}` is already defined at {}",
                    name.name,
                    previous.display_range(ctx)
                ),
            ));
        } else {
            defined.insert(name.name, name.span);
        }

        let before = diagnostics.len();
        match def {
            Def::Global(global) => check_global(global, &mut diagnostics),
            Def::Func(func) => FuncChecker::new(func, &mut diagnostics).run(),
        }

        if verbosity >= VerbosityLevel::Debug {
            log::debug!(
                "check: {} `{}`: {} diagnostics",
                def.span().display(ctx),
                name.name,
                diagnostics.len() - before
            );
        }
    }

    if verbosity >= VerbosityLevel::Trace {
        log::info!("check: {} diagnostics", diagnostics.len());
    }

    diagnostics
}

fn check_global(global: &Global, diagnostics: &mut Vec<Diagnostic>) {
    let Some((ArraySize::Explicit(size), span)) = global.size else {
        return;
    };
    match size {
        Const::Int(int) => {
            if int.value < global.inits.len() as u128 {
                diagnostics.push(Diagnostic::error(
                    ErrorCode::TooManyInitializers,
                    span,
                    format!(
                        "`{}` has {} initializers but room for {}",
                        global.name.name,
                        global.inits.len(),
                        int.value
                    ),
                ));
            }
        }
        Const::Char(_) | Const::Str(_) => diagnostics.push(Diagnostic::error(
            ErrorCode::InvalidArraySize,
            size.span(),
            format!(
                "size of `{}` must be an integer constant",
                global.name.name
            ),
        )),
    }
}

struct Local<'ctx> {
    id: Id<'ctx>,
    is_auto: bool,
    used: bool,
}

struct FuncChecker<'a, 'ctx> {
    func: &'a Func<'ctx>,
    locals: Vec<Local<'ctx>>,
    by_name: HashMap<&'ctx str, usize>,
    extrns: HashSet<&'ctx str>,
    labels: HashMap<&'ctx str, Span>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a, 'ctx> FuncChecker<'a, 'ctx> {
    fn new(func: &'a Func<'ctx>, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self {
            func,
            locals: Vec::new(),
            by_name: HashMap::new(),
            extrns: HashSet::new(),
            labels: HashMap::new(),
            diagnostics,
        }
    }

    fn run(mut self) {
        for param in self.func.params {
            self.declare_local(*param, false);
        }
        for stmt in self.func.body {
            self.declare(stmt);
        }
        for stmt in self.func.body {
            self.resolve(stmt, false);
        }

        for local in &self.locals {
            if local.is_auto && !local.used {
                self.diagnostics.push(Diagnostic::warning(
                    ErrorCode::UnusedLocal,
                    local.id.span,
                    format!("`{}` is never used", local.id.name),
                ));
            }
        }
    }

    fn declare_local(&mut self, id: Id<'ctx>, is_auto: bool) {
        if self.by_name.contains_key(id.name) || self.extrns.contains(id.name) {
            self.duplicate_local(id);
            return;
        }
        self.by_name.insert(id.name, self.locals.len());
        self.locals.push(Local {
            id,
            is_auto,
            used: false,
        });
    }

    fn duplicate_local(&mut self, id: Id<'ctx>) {
        self.diagnostics.push(Diagnostic::error(
            ErrorCode::DuplicateLocal,
            id.span,
            format!("`{}` is already declared in `{}`", id.name, self.func.name.name),
        ));
    }

    /// First pass: collects autos, extrns and labels.
    fn declare(&mut self, stmt: &Stmt<'ctx>) {
        match stmt.kind {
            StmtKind::Auto { decls } => {
                for (id, _) in decls {
                    self.declare_local(*id, true);
                }
            }
            StmtKind::Extrn { decls } => {
                for id in decls {
                    if self.by_name.contains_key(id.name) {
                        self.duplicate_local(*id);
                    } else {
                        self.extrns.insert(id.name);
                    }
                }
            }
            StmtKind::Label(id) => {
                if self.labels.contains_key(id.name) {
                    self.diagnostics.push(Diagnostic::error(
                        ErrorCode::DuplicateLabel,
                        id.span,
                        format!(
                            "label `{}` is already defined in `{}`",
                            id.name, self.func.name.name
                        ),
                    ));
                } else {
                    self.labels.insert(id.name, id.span);
                }
            }
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.declare(stmt);
                }
            }
            StmtKind::If { body, elze, .. } => {
                self.declare(body);
                if let Some(elze) = elze {
                    self.declare(elze);
                }
            }
            StmtKind::While { body, .. } | StmtKind::Switch { body, .. } => self.declare(body),
            StmtKind::Case(_)
            | StmtKind::Goto(_)
            | StmtKind::Return(_)
            | StmtKind::Expr(_)
            | StmtKind::Empty => {}
        }
    }

    /// Second pass: resolves names and checks `case` placement.
    fn resolve(&mut self, stmt: &Stmt<'ctx>, in_switch: bool) {
        match stmt.kind {
            StmtKind::Case(_) if !in_switch => self.diagnostics.push(Diagnostic::error(
                ErrorCode::CaseOutsideSwitch,
                stmt.span,
                "`case` is not inside a `switch`",
            )),
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.resolve(stmt, in_switch);
                }
            }
            StmtKind::If { cond, body, elze } => {
                self.expr(&cond);
                self.resolve(body, in_switch);
                if let Some(elze) = elze {
                    self.resolve(elze, in_switch);
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(&cond);
                self.resolve(body, in_switch);
            }
            StmtKind::Switch { switchee, body } => {
                self.expr(&switchee);
                self.resolve(body, true);
            }
            StmtKind::Goto(expr) | StmtKind::Expr(expr) | StmtKind::Return(Some(expr)) => {
                self.expr(&expr)
            }
            StmtKind::Auto { .. }
            | StmtKind::Extrn { .. }
            | StmtKind::Label(_)
            | StmtKind::Case(_)
            | StmtKind::Return(None)
            | StmtKind::Empty => {}
        }
    }

    fn expr(&mut self, expr: &Expr<'ctx>) {
        match expr.kind {
            ExprKind::InitVal(InitVal::Id(id)) => self.use_name(id),
            ExprKind::InitVal(InitVal::Const(_)) => {}
            ExprKind::Parens(inner)
            | ExprKind::Deref { ptr: inner }
            | ExprKind::Ref { expr: inner }
            | ExprKind::Unary { expr: inner, .. } => self.expr(inner),
            ExprKind::Index { ptr, index } => {
                self.expr(ptr);
                self.expr(index);
            }
            ExprKind::Assign { lhs, rhs } | ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::Ternary { cond, yes, no } => {
                self.expr(cond);
                self.expr(yes);
                self.expr(no);
            }
            ExprKind::Call { func, args } => {
                // A bare callee name is an implicit extrn.
                match func.kind {
                    ExprKind::InitVal(InitVal::Id(id)) if !self.by_name.contains_key(id.name) => {}
                    _ => self.expr(func),
                }
                for arg in args {
                    self.expr(arg);
                }
            }
        }
    }

    fn use_name(&mut self, id: Id<'ctx>) {
        if let Some(&index) = self.by_name.get(id.name) {
            self.locals[index].used = true;
        } else if !self.extrns.contains(id.name) && !self.labels.contains_key(id.name) {
            self.diagnostics.push(Diagnostic::error(
                ErrorCode::Undeclared,
                id.span,
                format!("`{}` is not declared in `{}`", id.name, self.func.name.name),
            ));
        }
    }
}
