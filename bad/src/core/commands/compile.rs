use std::io::{self, Write};
use std::path::PathBuf;

use super::{program_source, CompileOptions, PipelineOptions};
use crate::core::compile::{compile_many, CompileReport};
use crate::core::state::ProgramSink;
use crate::utils::error::{Error, Result};

/// Prints a report's diagnostics to stderr.
pub(crate) fn print_diagnostics(report: &CompileReport) {
    for diagnostic in &report.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

/// Compile one or more programs
///
/// Inputs are compiled in parallel into in-memory buffers, which are then
/// flushed to stdout in input order so the output of several programs never
/// interleaves.
pub(crate) fn run(
    inputs: &[PathBuf], options: &CompileOptions, pipeline: &PipelineOptions,
) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::new("no input files"));
    }
    if options.output.is_some() && inputs.len() > 1 {
        return Err(Error::new("--output can only be used with a single input"));
    }

    let mut configs: Vec<_> = inputs
        .iter()
        .map(|input| {
            let mut config = pipeline.configure(program_source(input));
            config.output_format = options.format;
            config.output = match &options.output {
                Some(path) => ProgramSink::Path(path.clone()),
                None => ProgramSink::Buffer(Vec::new()),
            };
            config.print_tokens = options.print_tokens;
            config.print_tokens_output = ProgramSink::Buffer(Vec::new());
            config.print_ast = options.print_ast;
            config.print_ast_output = ProgramSink::Buffer(Vec::new());
            config
        })
        .collect();

    let results = compile_many(&mut configs);

    let mut stdout = io::stdout().lock();
    let mut errors = 0;
    let mut failed = Vec::new();
    let mut first_error = None;
    for (config, result) in configs.iter_mut().zip(results) {
        for sink in [
            &mut config.print_tokens_output,
            &mut config.print_ast_output,
            &mut config.output,
        ] {
            if let Some(bytes) = sink.take_buffer() {
                stdout.write_all(&bytes)?;
            }
        }
        stdout.flush()?;

        match result {
            Ok(report) => {
                print_diagnostics(&report);
                if !report.is_success() {
                    errors += report.errors;
                    failed.push(report.path.display().to_string());
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                first_error.get_or_insert(err);
            }
        }
    }

    if errors > 0 {
        let path = match failed.as_slice() {
            [single] => single.clone(),
            many => format!("{} programs", many.len()),
        };
        return Err(Error::Compilation { path, errors });
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
