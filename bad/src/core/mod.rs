pub mod ast;
pub mod check;
pub mod commands;
pub mod compile;
pub mod context;
pub mod diagnostic;
pub mod display;
pub mod lex;
pub mod parse;
pub mod state;
pub mod symbols;
pub mod types;
