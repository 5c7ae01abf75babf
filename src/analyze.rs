//! Offline analysis of one per-kind sample file
//!
//! sample file -> pulse extraction -> outlier filter -> summary

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::pulse::PulseExtractor;
use crate::sample_reader::{read_samples_from_path, SampleFile};
use crate::stats::{summarize, AnalysisOutcome};
use std::path::Path;

/// Everything produced by analysing one file
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    /// Valid samples read
    pub samples: usize,
    /// Rows skipped as malformed
    pub skipped: usize,
    /// Samples below the threshold
    pub pulses: u64,
    /// Unfiltered delta-times, in order
    pub deltas: Vec<i64>,
    pub outcome: AnalysisOutcome,
}

/// Analyse samples that are already in memory
pub fn analyze_samples(file: &SampleFile, config: &AnalysisConfig) -> Result<AnalysisRun> {
    let mut extractor = PulseExtractor::new(config.threshold);
    let deltas = extractor.extract(&file.samples);
    tracing::info!(
        "Calculated {} hall ping delta times from {} samples",
        deltas.len(),
        file.samples.len()
    );

    let outcome = summarize(&deltas, config)?;

    Ok(AnalysisRun {
        samples: file.samples.len(),
        skipped: file.skipped,
        pulses: extractor.pulses_seen(),
        deltas,
        outcome,
    })
}

/// Read `path` and analyse it
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisRun> {
    let file = read_samples_from_path(path)?;
    analyze_samples(&file, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sample_reader::read_samples;
    use std::io::{Cursor, Write};

    const FILE: &str = "Timestamp,Amplitude\n\
        100,200\n\
        110,100\n\
        120,90\n\
        130,200\n\
        140,abc\n\
        150,100\n\
        160\n\
        170,120\n";

    #[test]
    fn test_analyze_samples_end_to_end() {
        let file = read_samples(Cursor::new(FILE)).unwrap();
        let run = analyze_samples(&file, &AnalysisConfig::default()).unwrap();

        assert_eq!(run.samples, 6);
        assert_eq!(run.skipped, 2);
        assert_eq!(run.pulses, 4);
        assert_eq!(run.deltas, vec![10, 30, 20]);
        let summary = run.outcome.summary().unwrap();
        assert_eq!(summary.filtered, vec![10, 30, 20]);
        assert_eq!(summary.median, 20.0);
    }

    #[test]
    fn test_analyze_threshold_is_configurable() {
        let file = read_samples(Cursor::new(FILE)).unwrap();
        let config = AnalysisConfig {
            threshold: 95,
            ..AnalysisConfig::default()
        };
        let run = analyze_samples(&file, &config).unwrap();
        assert_eq!(run.pulses, 1);
        assert!(run.deltas.is_empty());
        assert_eq!(run.outcome, AnalysisOutcome::NoDeltas);
    }

    #[test]
    fn test_analyze_file_reads_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(FILE.as_bytes()).unwrap();
        let run = analyze_file(tmp.path(), &AnalysisConfig::default()).unwrap();
        assert_eq!(run.deltas.len(), 3);
    }

    #[test]
    fn test_analyze_missing_file() {
        let err = analyze_file(
            Path::new("/nonexistent/telemux/2_run.csv"),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AnalysisInput { .. }));
    }
}
