//! Compilation configuration: where a program comes from, where its outputs
//! go, and how chatty each compiler stage is.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Stdin, Stdout, Write};
use std::path::PathBuf;

use crate::core::types::OutputFormat;
use crate::utils::error::Result;

#[derive(
    ValueEnum, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    Silent = 0,
    Trace = 1,
    Debug = 2,
}

impl std::fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VerbosityLevel::Silent => "silent",
            VerbosityLevel::Trace => "trace",
            VerbosityLevel::Debug => "debug",
        })
    }
}

/// Defines various verbosity levels for individual stages of the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbosityLevels {
    /// The level of verbosity when turning input into a token list.
    pub lex_verbosity_level: VerbosityLevel,
    /// The level of verbosity when selecting, combining, and massaging tokens
    /// into a syntax tree.
    pub parse_verbosity_level: VerbosityLevel,
    /// The level of verbosity for actions executed directly on the parse tree
    /// (such as name resolution and other checks).
    pub parse_execute_verbosity_level: VerbosityLevel,
    /// The level of verbosity when turning a parse tree into a specific output.
    pub generate_verbosity_level: VerbosityLevel,
}

impl VerbosityLevels {
    pub fn uniform(level: VerbosityLevel) -> Self {
        Self {
            lex_verbosity_level: level,
            parse_verbosity_level: level,
            parse_execute_verbosity_level: level,
            generate_verbosity_level: level,
        }
    }
}

impl Default for VerbosityLevels {
    fn default() -> Self {
        Self::uniform(VerbosityLevel::Silent)
    }
}

/// Where a program's text is read from.
#[derive(Debug)]
pub enum ProgramSource {
    Path(PathBuf),
    File(File),
    Stdin(Stdin),
    /// In-memory text with a display name.
    Text { name: String, text: String },
}

/// Where an output is written to.
#[derive(Debug)]
pub enum ProgramSink {
    Path(PathBuf),
    File(File),
    Stdout(Stdout),
    /// Collects the output in memory.
    Buffer(Vec<u8>),
    Discard,
}

impl ProgramSink {
    /// Writes `bytes`. A `Path` sink creates (or truncates) its file on the
    /// first write and becomes a `File` sink, so later writes append.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            ProgramSink::Path(path) => {
                let mut file = File::create(&*path)?;
                file.write_all(bytes)?;
                *self = ProgramSink::File(file);
            }
            ProgramSink::File(file) => file.write_all(bytes)?,
            ProgramSink::Stdout(stdout) => {
                let mut lock = stdout.lock();
                lock.write_all(bytes)?;
                lock.flush()?;
            }
            ProgramSink::Buffer(buffer) => buffer.extend_from_slice(bytes),
            ProgramSink::Discard => {}
        }
        Ok(())
    }

    /// Takes the collected bytes out of a `Buffer` sink.
    pub fn take_buffer(&mut self) -> Option<Vec<u8>> {
        match self {
            ProgramSink::Buffer(buffer) => Some(std::mem::take(buffer)),
            _ => None,
        }
    }
}

/// Everything one compilation needs to know.
#[derive(Debug)]
pub struct CompilationConfiguration {
    pub input: ProgramSource,
    pub verbosity_level: VerbosityLevel,
    pub verbosity_levels: VerbosityLevels,
    pub print_tokens: bool,
    pub print_ast: bool,
    pub output: ProgramSink,
    pub output_format: OutputFormat,
    pub print_tokens_output: ProgramSink,
    pub print_ast_output: ProgramSink,
    /// Machine word size in bytes.
    pub word_size: u8,
}

impl CompilationConfiguration {
    pub fn new(input: ProgramSource) -> Self {
        Self {
            input,
            verbosity_level: VerbosityLevel::Silent,
            verbosity_levels: VerbosityLevels::default(),
            print_tokens: false,
            print_ast: false,
            output: ProgramSink::Discard,
            output_format: OutputFormat::Json,
            print_tokens_output: ProgramSink::Discard,
            print_ast_output: ProgramSink::Discard,
            word_size: 8,
        }
    }

    /// Width of a machine word in bits, clamped to what constants can hold.
    pub fn word_bits(&self) -> u32 {
        (u32::from(self.word_size) * 8).clamp(8, 128)
    }
}
