//! JSON output format for analysis results

use crate::report::{AnalysisOutcome, Reporter};
use serde::Serialize;
use std::io::{self, Write};

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    /// Input the deltas were derived from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    #[serde(flatten)]
    pub outcome: &'a AnalysisOutcome,
}

/// Writes one pretty-printed JSON document per outcome
pub struct JsonReporter<W: Write> {
    out: W,
    source: Option<String>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, source: None }
    }

    /// Record the input path in the document
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, outcome: &AnalysisOutcome) -> io::Result<()> {
        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            source: self.source.as_deref(),
            outcome,
        };
        serde_json::to_writer_pretty(&mut self.out, &report)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
