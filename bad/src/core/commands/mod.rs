//! Command handlers behind the `badc` subcommands.
//!
//! Each handler prints to stdout/stderr itself and returns an error when the
//! command should exit unsuccessfully.

mod check;
mod compile;
mod config;
mod inspect;
mod symbols;

use std::path::{Path, PathBuf};

use super::state::{CompilationConfiguration, ProgramSource, VerbosityLevel, VerbosityLevels};
use super::types::OutputFormat;

use crate::utils::error::Result;

/// Pipeline settings shared by every command that compiles something.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub verbosity_level: VerbosityLevel,
    pub verbosity_levels: VerbosityLevels,
    /// Machine word size in bytes.
    pub word_size: u8,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            verbosity_level: VerbosityLevel::Silent,
            verbosity_levels: VerbosityLevels::default(),
            word_size: 8,
        }
    }
}

impl PipelineOptions {
    /// A configuration for `input` with every output discarded.
    pub(crate) fn configure(&self, input: ProgramSource) -> CompilationConfiguration {
        let mut config = CompilationConfiguration::new(input);
        config.verbosity_level = self.verbosity_level;
        config.verbosity_levels = self.verbosity_levels.clone();
        config.word_size = self.word_size;
        config
    }
}

/// Options specific to `compile`.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Where to write the symbol table; stdout when unset.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub print_tokens: bool,
    pub print_ast: bool,
}

/// `-` reads the program from stdin.
pub(crate) fn program_source(input: &Path) -> ProgramSource {
    if input == Path::new("-") {
        ProgramSource::Stdin(std::io::stdin())
    } else {
        ProgramSource::Path(input.to_path_buf())
    }
}

/// Compile one or more programs
pub fn compile(
    inputs: &[PathBuf], options: &CompileOptions, pipeline: &PipelineOptions,
) -> Result<()> {
    compile::run(inputs, options, pipeline)
}

/// Print the token list of a program
pub fn tokens(input: &Path, pipeline: &PipelineOptions) -> Result<()> {
    inspect::tokens(input, pipeline)
}

/// Print the syntax tree of a program
pub fn ast(input: &Path, pipeline: &PipelineOptions) -> Result<()> {
    inspect::ast(input, pipeline)
}

/// Check every B source under the given paths
pub fn check(paths: &[PathBuf], format: &OutputFormat, pipeline: &PipelineOptions) -> Result<()> {
    check::run(paths, format, pipeline)
}

/// Print the symbol table of a program
pub fn symbols(input: &Path, format: &OutputFormat, pipeline: &PipelineOptions) -> Result<()> {
    symbols::run(input, format, pipeline)
}

/// Show the configuration file
pub fn config() -> Result<()> {
    config::run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ProgramSink;

    #[test]
    fn test_program_source_from_path() {
        assert!(matches!(program_source(Path::new("-")), ProgramSource::Stdin(_)));
        match program_source(Path::new("main.b")) {
            ProgramSource::Path(path) => assert_eq!(path, PathBuf::from("main.b")),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_configure_applies_pipeline_options() {
        let pipeline = PipelineOptions {
            verbosity_level: VerbosityLevel::Trace,
            verbosity_levels: VerbosityLevels::uniform(VerbosityLevel::Debug),
            word_size: 4,
        };
        let config = pipeline.configure(ProgramSource::Text {
            name: "x.b".into(),
            text: String::new(),
        });
        assert_eq!(config.verbosity_level, VerbosityLevel::Trace);
        assert_eq!(
            config.verbosity_levels.parse_verbosity_level,
            VerbosityLevel::Debug
        );
        assert_eq!(config.word_bits(), 32);
        assert!(matches!(config.output, ProgramSink::Discard));
    }
}
