//! Outlier filtering and descriptive statistics for delta-times
//!
//! Quartiles use the exclusive method (R type 6): the sorted data is treated
//! as `n + 1` equal-probability positions and cut points are linearly
//! interpolated between neighbours. Interpolation indices are clamped to the
//! data, which means tiny samples extrapolate slightly past their extremes
//! (`[1, 3]` gives Q1 = 0.5, Q3 = 3.5).
//!
//! The bounds are `Q1 - k*IQR` (never below the configured floor) and
//! `Q3 + k*IQR` (unclamped). The asymmetry is intentional: intervals shorter
//! than the floor are double triggers of the same pulse, while there is no
//! physical ceiling on a slow rotation.

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

/// Quartiles and the acceptance window derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Compute bounds for `values`; `None` if there are no values
    pub fn compute(values: &[i64], config: &AnalysisConfig) -> Option<Self> {
        let (q1, q3) = quartiles(values)?;
        let iqr = q3 - q1;

        let mut lower = q1 - config.iqr_multiplier * iqr;
        if lower <= config.lower_floor {
            lower = config.lower_floor;
        }
        let upper = q3 + config.iqr_multiplier * iqr;

        Some(Self {
            q1,
            q3,
            iqr,
            lower,
            upper,
        })
    }

    /// Inclusive range check
    pub fn contains(&self, value: i64) -> bool {
        let v = value as f64;
        self.lower <= v && v <= self.upper
    }
}

/// First and third quartile by the exclusive method
///
/// A single value is its own quartiles. Returns `None` for empty input.
pub fn quartiles(values: &[i64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();

    if n == 1 {
        let only = sorted[0] as f64;
        return Some((only, only));
    }

    let m = n + 1;
    let cut = |i: usize| -> f64 {
        let j = (i * m / 4).clamp(1, n - 1);
        let delta = (i * m) as f64 - (j * 4) as f64;
        (sorted[j - 1] as f64 * (4.0 - delta) + sorted[j] as f64 * delta) / 4.0
    };

    Some((cut(1), cut(3)))
}

/// Keep the values inside `bounds`, preserving their original order
pub fn filter_outliers(values: &[i64], bounds: &OutlierBounds) -> Vec<i64> {
    values
        .iter()
        .copied()
        .filter(|&v| bounds.contains(v))
        .collect()
}

/// Descriptive statistics over the filtered delta-times
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSummary {
    pub median: f64,
    pub mean: f64,
    /// Sample standard deviation; `None` when fewer than two values remain
    pub stdev: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// The filtered delta-times, in input order
    pub filtered: Vec<i64>,
}

impl StatSummary {
    /// Compute the summary; `None` for an empty slice
    pub fn compute(filtered: &[i64]) -> Result<Option<Self>> {
        let (Some(&min), Some(&max)) = (filtered.iter().min(), filtered.iter().max()) else {
            return Ok(None);
        };

        // The f32 backends only see small numbers: offsets from `min` for the
        // location statistics, deviations from the mean for the variance.
        let offsets: Vec<f32> = filtered.iter().map(|&d| (d - min) as f32).collect();
        let v = Vector::from_slice(&offsets);

        let mean_offset = v
            .mean()
            .map_err(|e| Error::Statistics(format!("mean: {}", e)))?;
        let mean = min as f64 + mean_offset as f64;

        let median_offset = DescriptiveStats::new(&v)
            .quantile(0.5)
            .map_err(|e| Error::Statistics(format!("median: {}", e)))?;
        let median = min as f64 + median_offset as f64;

        // trueno's variance is the population variance (divide by n);
        // rescale to the sample variance (divide by n - 1).
        let stdev = if filtered.len() >= 2 {
            let deviations: Vec<f32> = filtered
                .iter()
                .map(|&d| (d as f64 - mean) as f32)
                .collect();
            let population = Vector::from_slice(&deviations)
                .variance()
                .map_err(|e| Error::Statistics(format!("variance: {}", e)))?;
            let n = filtered.len() as f64;
            Some((population as f64 * n / (n - 1.0)).max(0.0).sqrt())
        } else {
            None
        };

        Ok(Some(Self {
            median,
            mean,
            stdev,
            min: min as f64,
            max: max as f64,
            filtered: filtered.to_vec(),
        }))
    }
}

/// Result of analysing one delta-time sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// No delta-times were produced at all
    NoDeltas,

    /// Every delta-time fell outside the bounds
    EmptyAfterFilter {
        bounds: OutlierBounds,
        discarded: usize,
    },

    /// Statistics over the surviving delta-times
    Summary {
        summary: StatSummary,
        bounds: OutlierBounds,
        discarded: usize,
    },
}

impl AnalysisOutcome {
    pub fn summary(&self) -> Option<&StatSummary> {
        match self {
            AnalysisOutcome::Summary { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn bounds(&self) -> Option<&OutlierBounds> {
        match self {
            AnalysisOutcome::NoDeltas => None,
            AnalysisOutcome::EmptyAfterFilter { bounds, .. }
            | AnalysisOutcome::Summary { bounds, .. } => Some(bounds),
        }
    }
}

/// Filter outliers from `deltas` and summarize what remains
///
/// # Example
/// ```
/// use telemux::config::AnalysisConfig;
/// use telemux::stats::summarize;
///
/// let deltas = [10, 11, 9, 10, 12, 500, 10, 11];
/// let outcome = summarize(&deltas, &AnalysisConfig::default()).unwrap();
/// let summary = outcome.summary().unwrap();
/// assert_eq!(summary.filtered, vec![10, 11, 9, 10, 12, 10, 11]);
/// ```
pub fn summarize(deltas: &[i64], config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let Some(bounds) = OutlierBounds::compute(deltas, config) else {
        return Ok(AnalysisOutcome::NoDeltas);
    };

    tracing::info!(
        "IQR calculated. Q1: {}, Q3: {}, Lower bound: {}, Upper bound: {}",
        bounds.q1,
        bounds.q3,
        bounds.lower,
        bounds.upper
    );

    let filtered = filter_outliers(deltas, &bounds);
    let discarded = deltas.len() - filtered.len();
    tracing::info!(
        "Filtered delta times: {} valid entries remain ({} discarded)",
        filtered.len(),
        discarded
    );

    match StatSummary::compute(&filtered)? {
        Some(summary) => Ok(AnalysisOutcome::Summary {
            summary,
            bounds,
            discarded,
        }),
        None => Ok(AnalysisOutcome::EmptyAfterFilter { bounds, discarded }),
    }
}
