//! Command output: every report is printed either as a text table or as JSON.
//!
//! Handlers build a report value and pass it to [`OutputWriter::render`];
//! they never look at `--output` themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Prints command reports in the format selected by `--output`.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print `report` on stdout.
    pub fn render<T: Render + Serialize>(&self, report: &T) -> Result<(), CliError> {
        self.render_to(report, &mut std::io::stdout().lock())
    }

    /// Print `report` on `out`.
    ///
    /// JSON is pretty-printed and newline-terminated so that a scan result
    /// piped into a file is a complete document.
    pub fn render_to<T, W>(&self, report: &T, out: &mut W) -> Result<(), CliError>
    where
        T: Render + Serialize,
        W: Write,
    {
        match self.format {
            OutputFormat::Text => report.render_text(out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, report)?;
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Text form of a report.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
