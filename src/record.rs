//! Record parser for `kind,timestamp,value` telemetry lines
//!
//! Fields are opaque tokens at this layer: only the field count (and a
//! non-empty kind) is validated. Numeric interpretation happens downstream.

use std::fmt;

/// Header written at the top of every per-kind sink
pub const SINK_HEADER: [&str; 2] = ["Timestamp", "Amplitude"];

/// One telemetry record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: String,
    pub timestamp: String,
    pub value: String,
}

/// A line that did not have the `kind,timestamp,value` shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The offending line, verbatim
    pub line: String,
    /// Number of comma-separated fields found
    pub fields: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields == 3 {
            write!(f, "Invalid data format (empty kind): {}", self.line)
        } else {
            write!(
                f,
                "Invalid data format ({} fields, expected 3): {}",
                self.fields, self.line
            )
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one trimmed, non-empty line.
///
/// Exactly three comma-separated fields are required; they are returned
/// verbatim.
pub fn parse_record(line: &str) -> Result<Record, ParseError> {
    let mut parts = line.split(',');
    let fields: Vec<&str> = parts.by_ref().take(4).collect();

    if fields.len() != 3 {
        let count = fields.len() + parts.count();
        return Err(ParseError {
            line: line.to_string(),
            fields: count,
        });
    }

    if fields[0].is_empty() {
        return Err(ParseError {
            line: line.to_string(),
            fields: 3,
        });
    }

    Ok(Record {
        kind: fields[0].to_string(),
        timestamp: fields[1].to_string(),
        value: fields[2].to_string(),
    })
}
