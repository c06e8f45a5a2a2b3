//! # bad
//!
//! A front end for the B programming language: lexing, parsing, name
//! checking and symbol tables, plus the command handlers the `badc` driver
//! dispatches to.

pub mod core;
pub mod utils;
