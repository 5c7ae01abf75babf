//! Reporters: presentation of an `AnalysisOutcome`
//!
//! The analysis core hands a finished outcome to a `Reporter` and does not
//! care how it is shown. Text goes to a terminal (with a histogram of the
//! filtered delta-times); JSON and CSV live in their own modules.

use std::io::{self, Write};

pub use crate::stats::AnalysisOutcome;
use crate::stats::{OutlierBounds, StatSummary};

/// Receives the result of one analysis
pub trait Reporter {
    fn report(&mut self, outcome: &AnalysisOutcome) -> io::Result<()>;
}

/// Equal-width histogram over integer values
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Left edge of the first bin
    pub start: f64,
    /// Width of every bin
    pub width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width buckets spanning min..=max.
    ///
    /// A constant sequence gets a unit-wide range centred on the value.
    /// Returns `None` for empty input or zero bins.
    pub fn build(values: &[i64], bins: usize) -> Option<Self> {
        let min = *values.iter().min()? as f64;
        let max = *values.iter().max()? as f64;
        if bins == 0 {
            return None;
        }

        let (start, end) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (end - start) / bins as f64;

        let mut counts = vec![0u64; bins];
        for &v in values {
            let idx = (((v as f64) - start) / width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Some(Self {
            start,
            width,
            counts,
        })
    }

    /// Render one line per bin: `[lo, hi) count |####`
    pub fn render(&self, bar_width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let mut out = String::new();

        for (i, &count) in self.counts.iter().enumerate() {
            let lo = self.start + self.width * i as f64;
            let hi = lo + self.width;
            let bar = (count as usize * bar_width).div_ceil(peak as usize);
            out.push_str(&format!(
                "{:>10.1} - {:<10.1} {:>6} |{}\n",
                lo,
                hi,
                count,
                "#".repeat(bar)
            ));
        }
        out
    }
}

/// Human-readable report
pub struct TextReporter<W: Write> {
    out: W,
    histogram_bins: usize,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, histogram_bins: usize) -> Self {
        Self {
            out,
            histogram_bins,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_bounds(&mut self, bounds: &OutlierBounds, discarded: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "IQR bounds: Q1 {:.2}, Q3 {:.2}, IQR {:.2}, accepted [{:.2}, {:.2}] ({} outliers discarded)",
            bounds.q1, bounds.q3, bounds.iqr, bounds.lower, bounds.upper, discarded
        )
    }

    fn write_summary(&mut self, summary: &StatSummary) -> io::Result<()> {
        writeln!(self.out, "Samples:                            {}", summary.filtered.len())?;
        writeln!(self.out, "Median time difference:             {:.3}", summary.median)?;
        writeln!(self.out, "Mean time difference:               {:.3}", summary.mean)?;
        match summary.stdev {
            Some(stdev) => writeln!(self.out, "Standard deviation time difference: {:.3}", stdev)?,
            None => writeln!(
                self.out,
                "Standard deviation time difference: undefined (needs at least 2 values)"
            )?,
        }
        writeln!(self.out, "Min time difference:                {}", summary.min)?;
        writeln!(self.out, "Max time difference:                {}", summary.max)?;

        if let Some(histogram) = Histogram::build(&summary.filtered, self.histogram_bins) {
            writeln!(self.out)?;
            writeln!(self.out, "Histogram of hall ping delta times:")?;
            write!(self.out, "{}", histogram.render(50))?;
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, outcome: &AnalysisOutcome) -> io::Result<()> {
        match outcome {
            AnalysisOutcome::NoDeltas => {
                writeln!(self.out, "No hall ping delta times were produced.")?;
            }
            AnalysisOutcome::EmptyAfterFilter { bounds, discarded } => {
                self.write_bounds(bounds, *discarded)?;
                writeln!(
                    self.out,
                    "No valid hall ping delta time values found after processing."
                )?;
            }
            AnalysisOutcome::Summary {
                summary,
                bounds,
                discarded,
            } => {
                self.write_bounds(bounds, *discarded)?;
                self.write_summary(summary)?;
            }
        }
        self.out.flush()
    }
}
