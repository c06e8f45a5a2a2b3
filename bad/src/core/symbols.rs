//! The symbol table: what a translation unit defines, and what each of its
//! functions pulls in with `extrn`.

use std::collections::BTreeSet;

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::core::ast::{ArraySize, Const, Def, Program, Stmt, StmtKind};
use crate::core::context::Context;
use crate::core::display::{terminal_width, truncate_string};
use crate::core::state::{CompilationConfiguration, VerbosityLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Scalar,
    Vector,
    Function,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Scalar => write!(f, "scalar"),
            SymbolKind::Vector => write!(f, "vector"),
            SymbolKind::Function => write!(f, "function"),
        }
    }
}

/// One top-level definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Vector size, initializer count or arity, depending on `kind`.
    pub size: u64,
    pub line: u32,
    pub column: u32,
    /// Names declared `extrn` in a function body, sorted.
    pub externs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    pub file: String,
    pub symbols: Vec<Symbol>,
}

#[derive(Tabled)]
struct SymbolDisplay {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: SymbolKind,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Externs")]
    externs: String,
}

impl SymbolTable {
    /// Collects the definitions of `program`, in source order.
    pub fn build(program: &Program, ctx: &Context, config: &CompilationConfiguration) -> Self {
        let verbosity = config.verbosity_levels.generate_verbosity_level;
        if verbosity >= VerbosityLevel::Trace {
            log::info!("symbols: start {}", ctx.path().display());
        }

        let symbols: Vec<Symbol> = program
            .defs
            .iter()
            .map(|def| {
                let symbol = Symbol::from_def(def, ctx);
                if verbosity >= VerbosityLevel::Debug {
                    log::debug!(
                        "symbols: {} {} `{}` size {}",
                        def.span().display(ctx),
                        symbol.kind,
                        symbol.name,
                        symbol.size
                    );
                }
                symbol
            })
            .collect();

        if verbosity >= VerbosityLevel::Trace {
            log::info!("symbols: {} symbols", symbols.len());
        }

        SymbolTable {
            file: ctx.path().display().to_string(),
            symbols,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Renders the table for a terminal.
    pub fn to_table(&self) -> String {
        let rows: Vec<SymbolDisplay> = self
            .symbols
            .iter()
            .map(|symbol| SymbolDisplay {
                name: truncate_string(&symbol.name, 30),
                kind: symbol.kind,
                size: symbol.size,
                position: format!("{}:{}", symbol.line, symbol.column),
                externs: truncate_string(&symbol.externs.join(", "), 45),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(tabled::settings::Style::modern())
            .with(tabled::settings::Width::wrap(
                terminal_width().saturating_sub(4),
            ))
            .with(tabled::settings::Padding::new(1, 1, 0, 0));
        table.to_string()
    }
}

impl Symbol {
    fn from_def(def: &Def, ctx: &Context) -> Self {
        let (line, column) = def.span().coords(ctx);
        let name = def.name().name.to_string();
        match def {
            Def::Global(global) => {
                let inits = global.inits.len() as u64;
                let (kind, size) = match global.size {
                    None => (SymbolKind::Scalar, inits),
                    Some((ArraySize::Implicit, _)) => (SymbolKind::Vector, inits),
                    Some((ArraySize::Explicit(Const::Int(int)), _)) => (
                        SymbolKind::Vector,
                        u64::try_from(int.value).unwrap_or(u64::MAX).max(inits),
                    ),
                    Some((ArraySize::Explicit(_), _)) => (SymbolKind::Vector, inits),
                };
                Symbol {
                    name,
                    kind,
                    size,
                    line: line + 1,
                    column: column + 1,
                    externs: Vec::new(),
                }
            }
            Def::Func(func) => {
                let mut externs = BTreeSet::new();
                for stmt in func.body {
                    collect_externs(stmt, &mut externs);
                }
                Symbol {
                    name,
                    kind: SymbolKind::Function,
                    size: func.params.len() as u64,
                    line: line + 1,
                    column: column + 1,
                    externs: externs.into_iter().map(str::to_string).collect(),
                }
            }
        }
    }
}

fn collect_externs<'ctx>(stmt: &Stmt<'ctx>, externs: &mut BTreeSet<&'ctx str>) {
    match stmt.kind {
        StmtKind::Extrn { decls } => externs.extend(decls.iter().map(|id| id.name)),
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                collect_externs(stmt, externs);
            }
        }
        StmtKind::If { body, elze, .. } => {
            collect_externs(body, externs);
            if let Some(elze) = elze {
                collect_externs(elze, externs);
            }
        }
        StmtKind::While { body, .. } | StmtKind::Switch { body, .. } => {
            collect_externs(body, externs)
        }
        _ => {}
    }
}
