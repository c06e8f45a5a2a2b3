use std::path::Path;

use super::compile::print_diagnostics;
use super::{program_source, PipelineOptions};
use crate::core::compile::compile;
use crate::core::state::ProgramSink;
use crate::core::types::OutputFormat;
use crate::utils::error::{Error, Result};

/// Print the symbol table of a program
pub(crate) fn run(input: &Path, format: &OutputFormat, pipeline: &PipelineOptions) -> Result<()> {
    let mut config = pipeline.configure(program_source(input));
    config.output_format = *format;
    config.output = ProgramSink::Stdout(std::io::stdout());

    let report = compile(&mut config)?;
    print_diagnostics(&report);
    if !report.is_success() {
        return Err(Error::Compilation {
            path: report.path.display().to_string(),
            errors: report.errors,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_symbols_of_valid_program() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("lib.b");
        fs::write(&input, "n 0;\nget() { extrn n; return (n); }")?;
        run(&input, &OutputFormat::Text, &PipelineOptions::default())?;
        run(&input, &OutputFormat::Json, &PipelineOptions::default())
    }

    #[test]
    fn test_symbols_fail_on_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("lib.b");
        fs::write(&input, "n 0;\nn 1;")?;
        assert!(matches!(
            run(&input, &OutputFormat::Json, &PipelineOptions::default()),
            Err(Error::Compilation { errors: 1, .. })
        ));
        Ok(())
    }
}
