//! Display utilities: the indented syntax tree dump behind `--print-ast`,
//! and text truncation for table output.

use std::fmt::{self, Write};

use crate::core::ast::{
    ArraySize, Const, Def, Expr, ExprKind, Func, Global, InitVal, Program, Stmt, StmtKind,
    UnaryOp,
};
use crate::core::context::Context;

/// Renders `program` as an indented tree, two spaces per level.
///
/// Definitions and statements carry their one-indexed `[line:col]`;
/// expressions do not, to keep the dump readable.
pub fn dump_program(program: &Program, ctx: &Context) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = TreeWriter { out: &mut out, ctx }.program(program);
    out
}

struct TreeWriter<'a> {
    out: &'a mut String,
    ctx: &'a Context,
}

impl TreeWriter<'_> {
    fn line(&mut self, depth: usize, text: fmt::Arguments) -> fmt::Result {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.write_fmt(text)?;
        self.out.push('\n');
        Ok(())
    }

    fn program(&mut self, program: &Program) -> fmt::Result {
        let ctx = self.ctx;
        self.line(0, format_args!("program {}", ctx.path().display()))?;
        for def in program.defs {
            match def {
                Def::Global(global) => self.global(1, global)?,
                Def::Func(func) => self.func(1, func)?,
            }
        }
        Ok(())
    }

    fn global(&mut self, depth: usize, global: &Global) -> fmt::Result {
        self.line(
            depth,
            format_args!(
                "global {} {}",
                global.name.name,
                global.span.display_range(self.ctx)
            ),
        )?;
        match global.size {
            Some((ArraySize::Implicit, _)) => self.line(depth + 1, format_args!("size []"))?,
            Some((ArraySize::Explicit(size), _)) => {
                let size = self.constant(&size);
                self.line(depth + 1, format_args!("size {}", size))?
            }
            None => {}
        }
        for init in global.inits {
            let init = self.init_val(init);
            self.line(depth + 1, format_args!("{}", init))?;
        }
        Ok(())
    }

    fn func(&mut self, depth: usize, func: &Func) -> fmt::Result {
        let params: Vec<_> = func.params.iter().map(|p| p.name).collect();
        self.line(
            depth,
            format_args!(
                "func {}({}) {}",
                func.name.name,
                params.join(", "),
                func.span.display_range(self.ctx)
            ),
        )?;
        for stmt in func.body {
            self.stmt(depth + 1, stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, depth: usize, stmt: &Stmt) -> fmt::Result {
        let at = stmt.span.display_range(self.ctx).to_string();
        match stmt.kind {
            StmtKind::Auto { decls } => {
                let decls: Vec<_> = decls
                    .iter()
                    .map(|(name, init)| match init {
                        Some(init) => format!("{} = {}", name.name, self.constant(init)),
                        None => name.name.to_string(),
                    })
                    .collect();
                self.line(depth, format_args!("auto {} {}", decls.join(", "), at))
            }
            StmtKind::Extrn { decls } => {
                let names: Vec<_> = decls.iter().map(|d| d.name).collect();
                self.line(depth, format_args!("extrn {} {}", names.join(", "), at))
            }
            StmtKind::Label(label) => self.line(depth, format_args!("label {} {}", label.name, at)),
            StmtKind::Case(value) => {
                let value = self.constant(&value);
                self.line(depth, format_args!("case {} {}", value, at))
            }
            StmtKind::Block(stmts) => {
                self.line(depth, format_args!("block {}", at))?;
                for stmt in stmts {
                    self.stmt(depth + 1, stmt)?;
                }
                Ok(())
            }
            StmtKind::If { cond, body, elze } => {
                self.line(depth, format_args!("if {}", at))?;
                self.expr(depth + 1, &cond)?;
                self.stmt(depth + 1, body)?;
                if let Some(elze) = elze {
                    self.line(depth + 1, format_args!("else"))?;
                    self.stmt(depth + 2, elze)?;
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.line(depth, format_args!("while {}", at))?;
                self.expr(depth + 1, &cond)?;
                self.stmt(depth + 1, body)
            }
            StmtKind::Switch { switchee, body } => {
                self.line(depth, format_args!("switch {}", at))?;
                self.expr(depth + 1, &switchee)?;
                self.stmt(depth + 1, body)
            }
            StmtKind::Goto(target) => {
                self.line(depth, format_args!("goto {}", at))?;
                self.expr(depth + 1, &target)
            }
            StmtKind::Return(value) => {
                self.line(depth, format_args!("return {}", at))?;
                match value {
                    Some(value) => self.expr(depth + 1, &value),
                    None => Ok(()),
                }
            }
            StmtKind::Expr(expr) => {
                self.line(depth, format_args!("expr {}", at))?;
                self.expr(depth + 1, &expr)
            }
            StmtKind::Empty => self.line(depth, format_args!("empty {}", at)),
        }
    }

    fn expr(&mut self, depth: usize, expr: &Expr) -> fmt::Result {
        match expr.kind {
            ExprKind::Parens(inner) => {
                self.line(depth, format_args!("parens"))?;
                self.expr(depth + 1, inner)
            }
            ExprKind::InitVal(init) => {
                let init = self.init_val(&init);
                self.line(depth, format_args!("{}", init))
            }
            ExprKind::Deref { ptr } => {
                self.line(depth, format_args!("deref"))?;
                self.expr(depth + 1, ptr)
            }
            ExprKind::Ref { expr } => {
                self.line(depth, format_args!("ref"))?;
                self.expr(depth + 1, expr)
            }
            ExprKind::Index { ptr, index } => {
                self.line(depth, format_args!("index"))?;
                self.expr(depth + 1, ptr)?;
                self.expr(depth + 1, index)
            }
            ExprKind::Assign { lhs, rhs } => {
                self.line(depth, format_args!("assign ="))?;
                self.expr(depth + 1, lhs)?;
                self.expr(depth + 1, rhs)
            }
            ExprKind::Unary { expr, kind } => {
                let fixity = match kind {
                    UnaryOp::PreInc | UnaryOp::PreDec => " (prefix)",
                    UnaryOp::PostInc | UnaryOp::PostDec => " (postfix)",
                    UnaryOp::Minus | UnaryOp::Not => "",
                };
                self.line(depth, format_args!("unary {}{}", kind.symbol(), fixity))?;
                self.expr(depth + 1, expr)
            }
            ExprKind::Binary {
                lhs,
                rhs,
                kind,
                is_assign,
            } => {
                if is_assign {
                    self.line(depth, format_args!("assign ={}", kind.symbol()))?;
                } else {
                    self.line(depth, format_args!("binary {}", kind.symbol()))?;
                }
                self.expr(depth + 1, lhs)?;
                self.expr(depth + 1, rhs)
            }
            ExprKind::Ternary { cond, yes, no } => {
                self.line(depth, format_args!("ternary"))?;
                self.expr(depth + 1, cond)?;
                self.expr(depth + 1, yes)?;
                self.expr(depth + 1, no)
            }
            ExprKind::Call { func, args } => {
                self.line(depth, format_args!("call"))?;
                self.expr(depth + 1, func)?;
                for arg in args {
                    self.expr(depth + 1, arg)?;
                }
                Ok(())
            }
        }
    }

    fn init_val(&self, init: &InitVal) -> String {
        match init {
            InitVal::Id(id) => format!("name {}", id.name),
            InitVal::Const(value) => self.constant(value),
        }
    }

    fn constant(&self, value: &Const) -> String {
        match value {
            Const::Int(int) => format!("int {}", int.value),
            Const::Char(c) => format!("char {}", c.span.text(self.ctx)),
            Const::Str(s) => format!("string {}", s.span.text(self.ctx)),
        }
    }
}

/// Width available for tables, falling back to 80 columns off a terminal.
pub fn terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        w as usize
    } else {
        80
    }
}

/// Truncates a string to fit within the specified maximum length.
///
/// When truncation is needed the result ends with "...", counted in
/// `max_len`. Lengths are counted in characters.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lex::lex;
    use crate::core::parse::parse;
    use crate::core::state::{CompilationConfiguration, ProgramSource};
    use std::path::PathBuf;

    fn dump(source: &str) -> String {
        let ctx = Context::new(PathBuf::from("d.b"), source.to_string());
        let config = CompilationConfiguration::new(ProgramSource::Text {
            name: "d.b".into(),
            text: String::new(),
        });
        let tokens = lex(&ctx, &config);
        let parsed = parse(&tokens, &ctx, &config);
        dump_program(&parsed.program, &ctx)
    }

    #[test]
    fn test_dump_globals() {
        let out = dump("v[4] 'ab', \"s*n\", 010, w;\nn;\nm[];");
        let expected = "\
program d.b
  global v [1:1]
    size int 4
    char 'ab'
    string \"s*n\"
    int 8
    name w
  global n [2:1]
  global m [3:1]
    size []
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_return_and_parens() {
        let out = dump("f() return ((x));");
        let expected = "\
program d.b
  func f() [1:1]
    return [1:5]
      parens
        parens
          name x
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_empty_program() {
        assert_eq!(dump(""), "program d.b\n");
    }

    #[test]
    fn test_truncate_string_no_truncation_needed() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("exact", 5), "exact");
        assert_eq!(truncate_string("", 10), "");
    }

    #[test]
    fn test_truncate_string_basic_truncation() {
        assert_eq!(truncate_string("this is a long string", 10), "this is...");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_string_minimal_length() {
        assert_eq!(truncate_string("hello", 3), "...");
        assert_eq!(truncate_string("toolong", 4), "t...");
        assert_eq!(truncate_string("ab", 3), "ab");
    }

    #[test]
    fn test_truncate_string_unicode() {
        assert_eq!(truncate_string("café", 4), "café");
        assert_eq!(truncate_string("hello 世界!", 8), "hello...");
    }
}
