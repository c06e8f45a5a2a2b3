//! The compilation pipeline: read, lex, parse, check, build symbols.

use std::io::Read;
use std::path::{Path, PathBuf};

use ignore::Walk;
use rayon::prelude::*;
use serde::Serialize;

use crate::core::check::check;
use crate::core::context::Context;
use crate::core::diagnostic::{Diagnostic, ErrorCode};
use crate::core::display::dump_program;
use crate::core::lex::{dump_tokens, lex};
use crate::core::parse::parse;
use crate::core::state::{CompilationConfiguration, ProgramSource, VerbosityLevel};
use crate::core::symbols::SymbolTable;
use crate::core::types::OutputFormat;
use crate::utils::error::{Error, Result};

/// What one compilation produced.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub path: PathBuf,
    /// Rendered diagnostics, in source order.
    pub diagnostics: Vec<String>,
    pub errors: usize,
    pub warnings: usize,
    pub symbols: SymbolTable,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Reads the program text, returning it with the path to report it under.
pub fn get_source_text(source: &mut ProgramSource) -> Result<(PathBuf, String)> {
    match source {
        ProgramSource::Path(path) => {
            let text = std::fs::read_to_string(&*path).map_err(|err| Error::File {
                code: if err.kind() == std::io::ErrorKind::NotFound {
                    ErrorCode::MissingFile
                } else {
                    ErrorCode::UnreadableFile
                },
                path: path.clone(),
                source: err,
            })?;
            Ok((path.clone(), text))
        }
        ProgramSource::File(file) => {
            let mut text = String::new();
            file.read_to_string(&mut text).map_err(|err| Error::File {
                code: ErrorCode::UnreadableFile,
                path: PathBuf::from("<file>"),
                source: err,
            })?;
            Ok((PathBuf::from("<file>"), text))
        }
        ProgramSource::Stdin(stdin) => {
            let mut text = String::new();
            stdin.lock().read_to_string(&mut text).map_err(|err| Error::File {
                code: ErrorCode::UnreadableFile,
                path: PathBuf::from("<stdin>"),
                source: err,
            })?;
            Ok((PathBuf::from("<stdin>"), text))
        }
        ProgramSource::Text { name, text } => Ok((PathBuf::from(&*name), text.clone())),
    }
}

/// Runs the whole pipeline for one program.
///
/// Token and tree dumps go to their sinks whenever they are requested; the
/// symbol table is written to `config.output` only if no errors were found.
pub fn compile(config: &mut CompilationConfiguration) -> Result<CompileReport> {
    let (path, text) = get_source_text(&mut config.input)?;
    let ctx = Context::new(path.clone(), text);

    let tokens = lex(&ctx, config);
    if config.print_tokens {
        config
            .print_tokens_output
            .write_all(dump_tokens(&tokens, &ctx).as_bytes())?;
    }

    let parsed = parse(&tokens, &ctx, config);
    if config.print_ast {
        config
            .print_ast_output
            .write_all(dump_program(&parsed.program, &ctx).as_bytes())?;
    }

    let checked = check(&parsed.program, &ctx, config);
    let symbols = SymbolTable::build(&parsed.program, &ctx, config);

    let mut diagnostics: Vec<&Diagnostic> = tokens
        .diagnostics
        .iter()
        .chain(&parsed.diagnostics)
        .chain(&checked)
        .collect();
    diagnostics.sort_by_key(|d| d.span.coords(&ctx));

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;

    if errors == 0 {
        let rendered = match config.output_format {
            OutputFormat::Json => serde_json::to_string_pretty(&symbols)?,
            OutputFormat::Text => symbols.to_table(),
        };
        config.output.write_all(format!("{}\n", rendered).as_bytes())?;
    }

    if config.verbosity_level >= VerbosityLevel::Trace {
        log::info!(
            "compile: {} ({} errors, {} warnings)",
            path.display(),
            errors,
            warnings
        );
    }
    if config.verbosity_level >= VerbosityLevel::Debug {
        for diagnostic in &diagnostics {
            log::debug!("compile: {}", diagnostic.render(&ctx));
        }
    }

    Ok(CompileReport {
        path,
        diagnostics: diagnostics.iter().map(|d| d.render(&ctx)).collect(),
        errors,
        warnings,
        symbols,
    })
}

/// Compiles every configuration in parallel; results keep the input order.
pub fn compile_many(configs: &mut [CompilationConfiguration]) -> Vec<Result<CompileReport>> {
    configs.par_iter_mut().map(compile).collect()
}

/// Finds B sources under `path`.
///
/// A file is returned as is. A directory is walked honouring `.gitignore`
/// and friends, and the `*.b` files found are returned sorted.
pub fn find_sources<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::File {
            code: ErrorCode::MissingFile,
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = Vec::new();
    for entry in Walk::new(path) {
        let entry = entry.map_err(|e| Error::with_source("could not walk sources", Box::new(e)))?;
        let entry_path = entry.path();
        if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "b") {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{ProgramSink, VerbosityLevels};
    use std::fs;

    thread_local! {
        static RECORDS: std::cell::RefCell<Vec<(log::Level, String)>> =
            const { std::cell::RefCell::new(Vec::new()) };
    }

    /// Keeps the records logged on the current thread.
    struct CapturingLogger;

    impl log::Log for CapturingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            RECORDS.with(|records| {
                records
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger;

    /// Compiles `source` and returns what the pipeline logged on this thread.
    fn logged(
        source: &str, levels: VerbosityLevels, overall: VerbosityLevel,
    ) -> Vec<(log::Level, String)> {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Trace);
        });
        RECORDS.with(|records| records.borrow_mut().clear());

        let mut config = text_config(source);
        config.verbosity_levels = levels;
        config.verbosity_level = overall;
        compile(&mut config).unwrap();
        RECORDS.with(|records| records.borrow_mut().drain(..).collect())
    }

    fn count(records: &[(log::Level, String)], stage: &str, level: log::Level) -> usize {
        records
            .iter()
            .filter(|(l, message)| *l == level && message.starts_with(stage))
            .count()
    }

    const LOGGED_PROGRAM: &str = "a 1;\nf() return;\n";

    #[test]
    fn test_silent_pipeline_logs_nothing() {
        let records = logged(
            LOGGED_PROGRAM,
            VerbosityLevels::uniform(VerbosityLevel::Silent),
            VerbosityLevel::Silent,
        );
        assert!(records.is_empty(), "{:?}", records);
    }

    #[test]
    fn test_trace_logs_stage_summaries_only() {
        let records = logged(
            LOGGED_PROGRAM,
            VerbosityLevels::uniform(VerbosityLevel::Trace),
            VerbosityLevel::Trace,
        );
        for stage in ["lex:", "parse:", "check:", "symbols:"] {
            assert_eq!(count(&records, stage, log::Level::Info), 2, "{}", stage);
        }
        assert_eq!(count(&records, "compile:", log::Level::Info), 1);
        assert!(records.iter().all(|(level, _)| *level == log::Level::Info));
    }

    #[test]
    fn test_debug_logs_one_record_per_item() {
        let records = logged(
            LOGGED_PROGRAM,
            VerbosityLevels::uniform(VerbosityLevel::Debug),
            VerbosityLevel::Debug,
        );
        // a 1 ; f ( ) return ;
        assert_eq!(count(&records, "lex:", log::Level::Debug), 8);
        for stage in ["parse:", "check:", "symbols:"] {
            assert_eq!(count(&records, stage, log::Level::Debug), 2, "{}", stage);
            assert_eq!(count(&records, stage, log::Level::Info), 2, "{}", stage);
        }
    }

    #[test]
    fn test_stage_verbosity_is_independent() {
        let levels = VerbosityLevels {
            parse_verbosity_level: VerbosityLevel::Debug,
            ..VerbosityLevels::uniform(VerbosityLevel::Silent)
        };
        let records = logged(LOGGED_PROGRAM, levels, VerbosityLevel::Silent);
        assert_eq!(records.len(), 4, "{:?}", records);
        assert!(records.iter().all(|(_, message)| message.starts_with("parse:")));
    }

    fn text_config(source: &str) -> CompilationConfiguration {
        CompilationConfiguration::new(ProgramSource::Text {
            name: "t.b".into(),
            text: source.to_string(),
        })
    }

    #[test]
    fn test_missing_file() {
        let mut source = ProgramSource::Path(PathBuf::from("/definitely/not/here.b"));
        match get_source_text(&mut source) {
            Err(Error::File { code, path, .. }) => {
                assert_eq!(code, ErrorCode::MissingFile);
                assert_eq!(path, PathBuf::from("/definitely/not/here.b"));
            }
            other => panic!("expected a missing file error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bin.b");
        fs::write(&path, [0xff, 0xfe, 0x00])?;
        let mut source = ProgramSource::Path(path);
        assert!(matches!(
            get_source_text(&mut source),
            Err(Error::File {
                code: ErrorCode::UnreadableFile,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_read_from_open_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.b");
        fs::write(&path, "main() ;")?;
        let mut source = ProgramSource::File(fs::File::open(&path)?);
        let (name, text) = get_source_text(&mut source)?;
        assert_eq!(name, PathBuf::from("<file>"));
        assert_eq!(text, "main() ;");
        Ok(())
    }

    #[test]
    fn test_compile_success_writes_symbols() -> Result<()> {
        let mut config = text_config("v[2] 1, 2;\nmain() { extrn v; return (v[0]); }");
        config.output = ProgramSink::Buffer(Vec::new());
        let report = compile(&mut config)?;
        assert!(report.is_success());
        assert_eq!(report.warnings, 0);
        assert_eq!(report.symbols.symbols.len(), 2);

        let written = config.output.take_buffer().unwrap_or_default();
        let json: serde_json::Value = serde_json::from_slice(&written)?;
        assert_eq!(json["file"], "t.b");
        assert_eq!(json["symbols"][1]["name"], "main");
        assert_eq!(json["symbols"][1]["externs"][0], "v");
        Ok(())
    }

    #[test]
    fn test_compile_errors_skip_output() -> Result<()> {
        let mut config = text_config("main() {\n  x = 1 'abc\n  ;\n}\n");
        config.output = ProgramSink::Buffer(Vec::new());
        let report = compile(&mut config)?;
        assert!(!report.is_success());
        assert_eq!(report.errors, 2);
        assert_eq!(
            report.diagnostics,
            vec![
                "t.b[2:3]: error: B0-0301 - Undeclared name: `x` is not declared in `main`",
                "t.b[2:9]: error: B0-0103 - Unterminated character constant: missing closing `'`",
            ]
        );
        assert_eq!(config.output.take_buffer(), Some(Vec::new()));
        Ok(())
    }

    #[test]
    fn test_compile_dumps_to_sinks() -> Result<()> {
        let mut config = text_config("f() ;");
        config.print_tokens = true;
        config.print_tokens_output = ProgramSink::Buffer(Vec::new());
        config.print_ast = true;
        config.print_ast_output = ProgramSink::Buffer(Vec::new());
        config.output_format = OutputFormat::Text;
        config.output = ProgramSink::Buffer(Vec::new());
        compile(&mut config)?;

        let tokens = String::from_utf8(config.print_tokens_output.take_buffer().unwrap_or_default())
            .unwrap_or_default();
        assert_eq!(tokens.lines().count(), 4);
        assert!(tokens.starts_with("1:1\t"));

        let ast = String::from_utf8(config.print_ast_output.take_buffer().unwrap_or_default())
            .unwrap_or_default();
        assert_eq!(ast, "program t.b\n  func f() [1:1]\n    empty [1:5]\n");

        let table = String::from_utf8(config.output.take_buffer().unwrap_or_default())
            .unwrap_or_default();
        assert!(table.contains("function"));
        Ok(())
    }

    #[test]
    fn test_compile_many_keeps_order() {
        let mut configs = vec![
            text_config("a;"),
            CompilationConfiguration::new(ProgramSource::Path(PathBuf::from("/nope/b.b"))),
            text_config("c() d;"),
        ];
        let results = compile_many(&mut configs);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().is_ok_and(|r| r.is_success()));
        assert!(results[1].is_err());
        assert!(results[2].as_ref().is_ok_and(|r| !r.is_success()));
    }

    #[test]
    fn test_find_sources() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("lib"))?;
        fs::write(dir.path().join("main.b"), "main() ;")?;
        fs::write(dir.path().join("lib").join("io.b"), "putc() ;")?;
        fs::write(dir.path().join("notes.txt"), "not b")?;

        let found = find_sources(dir.path())?;
        assert_eq!(
            found,
            vec![dir.path().join("lib").join("io.b"), dir.path().join("main.b")]
        );

        let single = find_sources(dir.path().join("main.b"))?;
        assert_eq!(single, vec![dir.path().join("main.b")]);

        assert!(find_sources(dir.path().join("missing")).is_err());
        Ok(())
    }
}
