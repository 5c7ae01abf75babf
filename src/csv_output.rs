//! CSV formatting shared by sinks and the CSV reporter
//!
//! Sink rows carry opaque tokens from the wire, so every field goes through
//! `escape_field` before it is written.

use crate::report::{AnalysisOutcome, Reporter};
use std::io::{self, Write};

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format one CSV row, newline included
pub fn format_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Writes the filtered delta-times as a one-column CSV (`delta`)
///
/// Outcomes without data produce only the header, so downstream tools always
/// see a well-formed file.
#[derive(Debug)]
pub struct CsvReporter<W: Write> {
    out: W,
}

impl<W: Write> CsvReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn report(&mut self, outcome: &AnalysisOutcome) -> io::Result<()> {
        self.out.write_all(b"delta\n")?;
        if let AnalysisOutcome::Summary { summary, .. } = outcome {
            for delta in &summary.filtered {
                writeln!(self.out, "{}", delta)?;
            }
        }
        self.out.flush()
    }
}
