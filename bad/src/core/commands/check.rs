use std::path::PathBuf;

use tabled::{Table, Tabled};

use super::compile::print_diagnostics;
use super::PipelineOptions;
use crate::core::compile::{compile_many, find_sources, CompileReport};
use crate::core::display::{terminal_width, truncate_string};
use crate::core::state::ProgramSource;
use crate::core::types::OutputFormat;
use crate::utils::error::{Error, Result};

#[derive(Tabled)]
struct ReportDisplay {
    #[tabled(rename = "File")]
    path: String,
    #[tabled(rename = "Errors")]
    errors: usize,
    #[tabled(rename = "Warnings")]
    warnings: usize,
    #[tabled(rename = "Symbols")]
    symbols: usize,
    #[tabled(rename = "Status")]
    status: &'static str,
}

/// Check every B source under the given paths
pub(crate) fn run(
    paths: &[PathBuf], format: &OutputFormat, pipeline: &PipelineOptions,
) -> Result<()> {
    let mut sources = Vec::new();
    for path in paths {
        sources.extend(find_sources(path)?);
    }
    if sources.is_empty() {
        return Err(Error::new("no B sources found"));
    }

    let mut configs: Vec<_> = sources
        .into_iter()
        .map(|source| pipeline.configure(ProgramSource::Path(source)))
        .collect();
    let reports = compile_many(&mut configs)
        .into_iter()
        .collect::<Result<Vec<CompileReport>>>()?;

    match format {
        OutputFormat::Text => {
            for report in &reports {
                print_diagnostics(report);
            }

            let table_data: Vec<ReportDisplay> = reports
                .iter()
                .map(|report| ReportDisplay {
                    path: truncate_string(&report.path.display().to_string(), 50),
                    errors: report.errors,
                    warnings: report.warnings,
                    symbols: report.symbols.symbols.len(),
                    status: if report.is_success() { "ok" } else { "failed" },
                })
                .collect();

            let mut table = Table::new(table_data);
            table
                .with(tabled::settings::Style::modern())
                .with(tabled::settings::Width::wrap(
                    terminal_width().saturating_sub(4),
                ))
                .with(tabled::settings::Padding::new(1, 1, 0, 0));

            println!("{}", table);
            println!("Total: {} files", reports.len());
        }
        OutputFormat::Json => {
            let data: Vec<_> = reports
                .iter()
                .map(|report| {
                    serde_json::json!({
                        "path": report.path.display().to_string(),
                        "errors": report.errors,
                        "warnings": report.warnings,
                        "diagnostics": report.diagnostics,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    let failed: Vec<_> = reports.iter().filter(|r| !r.is_success()).collect();
    match failed.as_slice() {
        [] => Ok(()),
        [single] => Err(Error::Compilation {
            path: single.path.display().to_string(),
            errors: single.errors,
        }),
        many => Err(Error::Compilation {
            path: format!("{} files", many.len()),
            errors: many.iter().map(|r| r.errors).sum(),
        }),
    }
}
