//! Reader for per-kind sample files written by `telemux record`
//!
//! The first line is always the header. Every following row must have at
//! least two fields, `timestamp,amplitude`, both integers. Rows that do not
//! are skipped with a diagnostic; they never abort the analysis.

use crate::error::{Error, Result};
use crate::pulse::Sample;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Why a data row was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Fewer than two comma-separated fields
    TooFewFields { fields: usize },
    /// A field that must be an integer was not
    NotInteger { column: &'static str, token: String },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::TooFewFields { fields } => {
                write!(f, "expected at least 2 fields, found {}", fields)
            }
            RowError::NotInteger { column, token } => {
                write!(f, "{} is not an integer: {:?}", column, token)
            }
        }
    }
}

impl std::error::Error for RowError {}

/// Parsed contents of a sample file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleFile {
    /// Header line, if the file was not empty
    pub header: Option<String>,
    /// Valid samples in file order
    pub samples: Vec<Sample>,
    /// Number of rows skipped as malformed
    pub skipped: usize,
    /// Number of empty or whitespace-only rows
    pub blank: usize,
}

fn parse_int(token: &str, column: &'static str) -> std::result::Result<i64, RowError> {
    token.trim().parse::<i64>().map_err(|_| RowError::NotInteger {
        column,
        token: token.to_string(),
    })
}

/// Interpret one data row. Extra fields beyond the second are ignored.
pub fn parse_sample_row(row: &str) -> std::result::Result<Sample, RowError> {
    let fields: Vec<&str> = row.split(',').collect();
    if fields.len() < 2 {
        return Err(RowError::TooFewFields {
            fields: fields.len(),
        });
    }

    Ok(Sample {
        timestamp: parse_int(fields[0], "timestamp")?,
        value: parse_int(fields[1], "amplitude")?,
    })
}

/// Read a header line followed by sample rows
pub fn read_samples<R: BufRead>(mut reader: R) -> io::Result<SampleFile> {
    let mut file = SampleFile::default();
    let mut raw = Vec::new();
    let mut line_no = 0usize;

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&raw);
        let row = text.trim_end_matches(['\n', '\r']);

        if line_no == 1 {
            tracing::info!("CSV header: {}", row);
            file.header = Some(row.to_string());
            continue;
        }

        if row.trim().is_empty() {
            file.blank += 1;
            tracing::debug!(line = line_no, "Skipping blank line");
            continue;
        }

        match parse_sample_row(row) {
            Ok(sample) => file.samples.push(sample),
            Err(e) => {
                file.skipped += 1;
                tracing::warn!(line = line_no, "Skipping malformed line {:?}: {}", row, e);
            }
        }
    }

    Ok(file)
}

/// Open `path` and read its samples
pub fn read_samples_from_path(path: &Path) -> Result<SampleFile> {
    let to_error = |source| Error::AnalysisInput {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(to_error)?;
    tracing::info!("Opening CSV file: {}", path.display());
    read_samples(BufReader::new(file)).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(timestamp: i64, value: i64) -> Sample {
        Sample { timestamp, value }
    }

    #[test]
    fn test_reads_header_and_rows() {
        let file =
            read_samples(Cursor::new("Timestamp,Amplitude\n10,200\n20,100\n")).unwrap();
        assert_eq!(file.header.as_deref(), Some("Timestamp,Amplitude"));
        assert_eq!(file.samples, vec![sample(10, 200), sample(20, 100)]);
        assert_eq!(file.skipped, 0);
    }

    #[test]
    fn test_skips_malformed_rows() {
        let input = "Timestamp,Amplitude\n10,200\njunk\n20,abc\nx,5\n30,90\n";
        let file = read_samples(Cursor::new(input)).unwrap();
        assert_eq!(file.samples, vec![sample(10, 200), sample(30, 90)]);
        assert_eq!(file.skipped, 3);
    }

    #[test]
    fn test_blank_rows_ignored() {
        let file = read_samples(Cursor::new("h\n\n10,1\n\r\n")).unwrap();
        assert_eq!(file.samples, vec![sample(10, 1)]);
        assert_eq!(file.skipped, 0);
        assert_eq!(file.blank, 2);
    }

    #[test]
    fn test_blank_rows_counted_apart_from_malformed() {
        let input = "Timestamp,Amplitude
10,200
   
junk

20,100
";
        let file = read_samples(Cursor::new(input)).unwrap();
        assert_eq!(file.samples, vec![sample(10, 200), sample(20, 100)]);
        assert_eq!(file.skipped, 1);
        assert_eq!(file.blank, 2);
    }

    #[test]
    fn test_crlf_and_whitespace_tolerated() {
        let file = read_samples(Cursor::new("h\r\n 10 , +20 \r\n-5,7\r\n")).unwrap();
        assert_eq!(file.samples, vec![sample(10, 20), sample(-5, 7)]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        assert_eq!(parse_sample_row("1,2,3").unwrap(), sample(1, 2));
    }

    #[test]
    fn test_row_errors() {
        assert_eq!(
            parse_sample_row("12").unwrap_err(),
            RowError::TooFewFields { fields: 1 }
        );
        assert!(matches!(
            parse_sample_row("1.5,2").unwrap_err(),
            RowError::NotInteger { column: "timestamp", .. }
        ));
        assert!(matches!(
            parse_sample_row("1,").unwrap_err(),
            RowError::NotInteger { column: "amplitude", .. }
        ));
    }

    #[test]
    fn test_empty_file() {
        let file = read_samples(Cursor::new("")).unwrap();
        assert!(file.header.is_none());
        assert!(file.samples.is_empty());
    }

    #[test]
    fn test_missing_path_is_analysis_input_error() {
        let err = read_samples_from_path(Path::new("/nonexistent/2_x.csv")).unwrap_err();
        assert!(matches!(err, Error::AnalysisInput { .. }));
    }
}
