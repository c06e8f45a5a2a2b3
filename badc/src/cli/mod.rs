//! # Command-Line Interface Module
//!
//! This module defines the command-line interface of `badc`. It uses the
//! `clap` crate to parse arguments and subcommands, and then dispatches to
//! the handlers in `bad::core::commands`.
//!
//! The main components are:
//! - `Cli`: the top-level arguments, including per-stage verbosity.
//! - `Commands`: the subcommands (`compile`, `check`, `tokens`, `ast`, `symbols`, `completion`, `config`).
//! - `CompletionSubcommand`: an enum for generating shell completion scripts.
//! - `cli_match()`: parses the command line, merges it into the configuration and runs the command.

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};
use std::path::PathBuf;

use bad::core::commands::{self, CompileOptions, PipelineOptions};
use bad::core::state::{VerbosityLevel, VerbosityLevels};
use bad::core::types::OutputFormat;
use bad::utils::app_config::AppConfig;
use bad::utils::error::Result;
use bad::utils::logger::setup_logging;
use bad::utils::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "badc",
    author,
    about,
    long_about = "A front end for the B programming language",
    version
)]
/// Represents the command-line interface arguments for the application.
pub struct Cli {
    /// Specifies a custom configuration file path.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enables or disables debug mode.
    #[arg(id = "debug", short, long = "debug", value_name = "DEBUG")]
    pub debug: Option<bool>,

    /// Sets the logging level for the application.
    #[arg(id = "log_level", short, long = "log-level", value_name = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Sets the verbosity of every compiler stage.
    /// Individual stages can be overridden with the flags below.
    #[arg(id = "verbosity", short = 'v', long = "verbosity", value_name = "LEVEL")]
    pub verbosity: Option<VerbosityLevel>,

    /// Verbosity while turning source text into tokens.
    #[arg(long = "lex-verbosity", value_name = "LEVEL")]
    pub lex_verbosity: Option<VerbosityLevel>,

    /// Verbosity while building the syntax tree.
    #[arg(long = "parse-verbosity", value_name = "LEVEL")]
    pub parse_verbosity: Option<VerbosityLevel>,

    /// Verbosity while checking names on the syntax tree.
    #[arg(long = "execute-verbosity", value_name = "LEVEL")]
    pub execute_verbosity: Option<VerbosityLevel>,

    /// Verbosity while producing the symbol table.
    #[arg(long = "generate-verbosity", value_name = "LEVEL")]
    pub generate_verbosity: Option<VerbosityLevel>,

    /// Machine word size in bytes; bounds integer and character constants.
    #[arg(
        id = "word_size",
        long = "word-size",
        value_name = "BYTES",
        value_parser = clap::value_parser!(u8).range(1..=16)
    )]
    pub word_size: Option<u8>,

    /// The subcommand to execute.
    #[clap(subcommand)]
    command: Commands,
}

/// Defines the main subcommands available in the CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compiles B programs into symbol tables.
    ///
    /// Several inputs are compiled in parallel; their outputs are printed in
    /// the order the inputs were given.
    #[clap(name = "compile", about = "Compile B programs")]
    Compile {
        /// The programs to compile; `-` reads from stdin.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Writes the symbol table to a file instead of stdout (single input only).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// The output format: `text` or `json`. Defaults to `json`.
        #[arg(long, value_name = "FORMAT", default_value = "json", value_parser = parse_output_format)]
        format: OutputFormat,

        /// Also prints the token list.
        #[arg(long)]
        print_tokens: bool,

        /// Also prints the syntax tree.
        #[arg(long)]
        print_ast: bool,
    },

    /// Checks every B source under the given paths and prints a summary.
    #[clap(name = "check", about = "Check B sources for errors")]
    Check {
        /// Files or directories to check. Defaults to the current directory.
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// The summary format: `text` or `json`. Defaults to `text`.
        #[arg(long, value_name = "FORMAT", default_value = "text", value_parser = parse_output_format)]
        format: OutputFormat,
    },

    /// Prints the tokens of a program, one per line.
    #[clap(name = "tokens", about = "Print the token list of a program")]
    Tokens {
        /// The program to lex; `-` reads from stdin.
        input: PathBuf,
    },

    /// Prints the syntax tree of a program.
    #[clap(name = "ast", about = "Print the syntax tree of a program")]
    Ast {
        /// The program to parse; `-` reads from stdin.
        input: PathBuf,
    },

    /// Prints the symbols a program defines.
    #[clap(name = "symbols", about = "Print the symbol table of a program")]
    Symbols {
        /// The program to compile; `-` reads from stdin.
        input: PathBuf,

        /// The output format: `text` or `json`. Defaults to `text`.
        #[arg(long, value_name = "FORMAT", default_value = "text", value_parser = parse_output_format)]
        format: OutputFormat,
    },

    /// Subcommands for generating shell completion scripts.
    #[clap(
        name = "completion",
        about = "Generate completion scripts",
        long_about = None,
        )]
    Completion {
        /// The shell to generate the script for.
        #[clap(subcommand)]
        subcommand: CompletionSubcommand,
    },

    /// Displays the current application configuration.
    ///
    /// The configuration is the result of merging the built-in defaults,
    /// `BADC_*` environment variables, the `--config` file and command-line
    /// flags.
    #[clap(
        name = "config",
        about = "Show Configuration",
        long_about = None,
    )]
    Config,
}

/// Defines subcommands for shell completion script generation.
#[derive(Subcommand, PartialEq, Debug)]
enum CompletionSubcommand {
    /// Generates the autocompletion script for Bash.
    #[clap(about = "generate the autocompletion script for bash")]
    Bash,
    /// Generates the autocompletion script for Zsh.
    #[clap(about = "generate the autocompletion script for zsh")]
    Zsh,
    /// Generates the autocompletion script for Fish.
    #[clap(about = "generate the autocompletion script for fish")]
    Fish,
}

/// Parses command-line arguments, merges configurations, and executes the appropriate command.
///
/// The steps are:
/// 1. Parse the raw command-line arguments.
/// 2. Merge the `--config` file, then the flags, into `AppConfig`.
/// 3. Install logging at the configured level.
/// 4. Resolve per-stage verbosity and dispatch the subcommand.
pub fn cli_match() -> Result<()> {
    // Parse the command line arguments
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    // Merge clap config file if the value is set
    AppConfig::merge_config(cli.config.as_deref())?;
    AppConfig::merge_args(matches)?;

    let config = AppConfig::fetch()?;
    let _guard = setup_logging(config.log_level)?;
    if config.debug {
        log::debug!("configuration: {:?}", config);
    }

    let pipeline = pipeline_options(&cli, &config);

    // Execute the subcommand
    match &cli.command {
        Commands::Compile {
            inputs,
            output,
            format,
            print_tokens,
            print_ast,
        } => commands::compile(
            inputs,
            &CompileOptions {
                output: output.clone(),
                format: *format,
                print_tokens: *print_tokens,
                print_ast: *print_ast,
            },
            &pipeline,
        )?,
        Commands::Check { paths, format } => commands::check(paths, format, &pipeline)?,
        Commands::Tokens { input } => commands::tokens(input, &pipeline)?,
        Commands::Ast { input } => commands::ast(input, &pipeline)?,
        Commands::Symbols { input, format } => commands::symbols(input, format, &pipeline)?,
        Commands::Completion { subcommand } => {
            let mut app = Cli::command();
            match subcommand {
                CompletionSubcommand::Bash => {
                    generate(Bash, &mut app, "badc", &mut std::io::stdout());
                }
                CompletionSubcommand::Zsh => {
                    generate(Zsh, &mut app, "badc", &mut std::io::stdout());
                }
                CompletionSubcommand::Fish => {
                    generate(Fish, &mut app, "badc", &mut std::io::stdout());
                }
            }
        }
        Commands::Config => commands::config()?,
    }

    Ok(())
}

/// Resolves stage verbosity: a stage flag wins, then `--verbosity`, then the
/// configured `verbosity` (which `--verbosity` has already been merged into).
fn pipeline_options(cli: &Cli, config: &AppConfig) -> PipelineOptions {
    let base = config.verbosity;
    PipelineOptions {
        verbosity_level: base,
        verbosity_levels: VerbosityLevels {
            lex_verbosity_level: cli.lex_verbosity.unwrap_or(base),
            parse_verbosity_level: cli.parse_verbosity.unwrap_or(base),
            parse_execute_verbosity_level: cli.execute_verbosity.unwrap_or(base),
            generate_verbosity_level: cli.generate_verbosity.unwrap_or(base),
        },
        word_size: config.word_size,
    }
}

/// Parses a string slice into an `OutputFormat` enum.
///
/// Used by `clap` as a value parser; accepts "text" and "json" in any case.
fn parse_output_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse()
}
