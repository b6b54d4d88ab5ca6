//! Presentation of the resolved version matrix

pub mod sort;
pub mod structured;
pub mod table;

use std::io::Write;
use thiserror::Error;

use crate::config::Config;

pub use sort::sort_config;

/// Failure to produce or write the report
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// How the report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table { color: bool },
    Json,
}

/// Sort the inventory and write it in the requested format
pub fn render<W: Write>(config: &mut Config, format: OutputFormat, out: &mut W) -> Result<(), FormatError> {
    sort_config(config);

    let rendered = match format {
        OutputFormat::Table { color } => table::build(config).render(color),
        OutputFormat::Json => {
            let mut json = structured::render(config)?;
            json.push('\n');
            json
        }
    };

    out.write_all(rendered.as_bytes())?;
    out.flush()?;

    Ok(())
}
