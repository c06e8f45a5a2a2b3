//! `tokens` and `ast`: dump one stage of the pipeline for a single program.

use std::io::{self, Write};
use std::path::Path;

use super::compile::print_diagnostics;
use super::{program_source, PipelineOptions};
use crate::core::compile::compile;
use crate::core::state::{CompilationConfiguration, ProgramSink};
use crate::utils::error::Result;

pub(crate) fn tokens(input: &Path, pipeline: &PipelineOptions) -> Result<()> {
    let mut config = pipeline.configure(program_source(input));
    config.print_tokens = true;
    config.print_tokens_output = ProgramSink::Buffer(Vec::new());
    dump(config, |config| &mut config.print_tokens_output)
}

pub(crate) fn ast(input: &Path, pipeline: &PipelineOptions) -> Result<()> {
    let mut config = pipeline.configure(program_source(input));
    config.print_ast = true;
    config.print_ast_output = ProgramSink::Buffer(Vec::new());
    dump(config, |config| &mut config.print_ast_output)
}

// Diagnostics are informational here; a dump of a broken program still
// succeeds.
fn dump(
    mut config: CompilationConfiguration,
    sink: impl FnOnce(&mut CompilationConfiguration) -> &mut ProgramSink,
) -> Result<()> {
    let report = compile(&mut config)?;
    if let Some(bytes) = sink(&mut config).take_buffer() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    }
    print_diagnostics(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dumps_accept_broken_programs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("broken.b");
        fs::write(&input, "main() { x = ; }")?;
        tokens(&input, &PipelineOptions::default())?;
        ast(&input, &PipelineOptions::default())?;
        Ok(())
    }

    #[test]
    fn test_dump_missing_input_fails() {
        assert!(tokens(Path::new("/no/such/file.b"), &PipelineOptions::default()).is_err());
    }
}
