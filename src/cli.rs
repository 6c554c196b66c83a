use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::config::Cli;
use crate::document::parse_document;
use crate::source::{self, Source};
use crate::subscription::{build_raw_lines, render};
use crate::util::write_string_atomic;

pub const EXIT_INPUT_ERROR: i32 = 3;
pub const EXIT_INVALID_JSON: i32 = 4;
pub const EXIT_NO_LINKS: i32 = 5;
pub const EXIT_OUTPUT_ERROR: i32 = 6;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub async fn run() -> i32 {
    let cli = Cli::parse();
    match convert(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e.message);
            e.code
        }
    }
}

/// Load, extract, render, write. Nothing is written unless at least one link
/// was extracted.
pub async fn convert(cli: Cli) -> Result<(), ExitError> {
    let input = Source::from_args(&cli.input)
        .ok_or_else(|| ExitError::new(2, "invalid_args: --url or --infile is required"))?;

    let raw = source::load(&input, Duration::from_secs(cli.timeout_secs))
        .await
        .map_err(|e| ExitError::new(EXIT_INPUT_ERROR, format!("input_error: {e:#}")))?;

    let doc = parse_document(&raw)
        .map_err(|e| ExitError::new(EXIT_INVALID_JSON, format!("invalid_json: {e}")))?;

    let lines = build_raw_lines(&doc)
        .map_err(|e| ExitError::new(EXIT_NO_LINKS, format!("no_links: {e}")))?;
    info!(links = lines.len(), output = ?cli.format, "extracted share links");

    let out = render(&lines, cli.format);
    match &cli.out {
        Some(path) => write_string_atomic(path, &out).map_err(|e| {
            ExitError::new(
                EXIT_OUTPUT_ERROR,
                format!("output_error: write {}: {e}", path.display()),
            )
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(out.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| ExitError::new(EXIT_OUTPUT_ERROR, format!("output_error: {e}")))?;
        }
    }
    Ok(())
}
