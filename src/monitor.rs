//! Live per-kind pulse monitor
//!
//! Echoes the amplitude of every record whose kind is selected and prints a
//! delta line whenever that kind's own extractor closes an interval. Kinds
//! never share extractor state.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::line_decoder::LineDecoder;
use crate::pulse::{PulseExtractor, Sample};
use crate::record::{parse_record, Record};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Counters for a finished monitor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Records of a selected kind that were echoed
    pub echoed: u64,
    /// Delta lines printed
    pub deltas: u64,
    /// Selected records whose timestamp or amplitude was not an integer
    pub skipped: u64,
    pub cancelled: bool,
}

/// Per-kind extractors over a set of selected kinds
pub struct Monitor {
    extractors: HashMap<String, PulseExtractor>,
}

impl Monitor {
    pub fn new<I, S>(kinds: I, threshold: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extractors = kinds
            .into_iter()
            .map(|k| (k.into(), PulseExtractor::new(threshold)))
            .collect();
        Self { extractors }
    }

    pub fn watches(&self, kind: &str) -> bool {
        self.extractors.contains_key(kind)
    }

    /// Handle one record, writing any output lines to `out`
    pub fn observe<W: Write>(
        &mut self,
        record: &Record,
        out: &mut W,
        stats: &mut MonitorStats,
    ) -> std::io::Result<()> {
        let Some(extractor) = self.extractors.get_mut(&record.kind) else {
            return Ok(());
        };

        let parsed = (
            record.timestamp.trim().parse::<i64>(),
            record.value.trim().parse::<i64>(),
        );
        let (Ok(timestamp), Ok(value)) = parsed else {
            stats.skipped += 1;
            tracing::warn!(
                kind = %record.kind,
                "Error converting values to integers: {:?},{:?}",
                record.timestamp,
                record.value
            );
            return Ok(());
        };

        writeln!(out, "{},{}", record.kind, value)?;
        stats.echoed += 1;

        if let Some(delta) = extractor.push(Sample { timestamp, value }) {
            writeln!(out, "{} delta={}", record.kind, delta)?;
            stats.deltas += 1;
        }
        Ok(())
    }
}

/// Monitor `reader` until EOF or cancellation, writing to `out`
pub fn run_monitor<R, W>(
    reader: R,
    out: &mut W,
    monitor: &mut Monitor,
    max_line_len: usize,
    cancel: CancelToken,
) -> Result<MonitorStats>
where
    R: BufRead,
    W: Write,
{
    let mut decoder = LineDecoder::new(reader, cancel).with_max_line_len(max_line_len);
    let mut stats = MonitorStats::default();

    for line in decoder.by_ref() {
        let line = line?;
        match parse_record(&line) {
            Ok(record) => monitor
                .observe(&record, out, &mut stats)
                .map_err(|source| Error::SinkWrite {
                    kind: record.kind.clone(),
                    source,
                })?,
            Err(e) => tracing::warn!("{}", e),
        }
    }

    stats.cancelled = decoder.was_cancelled();
    out.flush().map_err(|source| Error::SinkWrite {
        kind: "stdout".to_string(),
        source,
    })?;
    Ok(stats)
}
