//! Pulse extraction: hall-sensor samples -> inter-pulse delta-times
//!
//! A sample whose amplitude is strictly below the threshold is a pulse (the
//! magnet passing the sensor pulls the reading down). Each pulse after the
//! first emits the time since the previous pulse.

/// One `(timestamp, amplitude)` reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: i64,
    pub value: i64,
}

/// Stateful threshold-crossing extractor for a single kind
///
/// # Timestamp zero
///
/// The recorded data uses timestamp `0` to mean "no previous pulse". A pulse
/// observed at `t = 0` therefore leaves the extractor in its initial state:
/// it emits nothing and the next pulse emits nothing either. Streams whose
/// clock legitimately starts at zero lose exactly one delta to this rule.
///
/// Deltas are not sanitized: a clock that runs backwards produces negative
/// deltas, and duplicate timestamps produce zero. Both are left for the
/// outlier filter to reject.
///
/// # Example
/// ```
/// use telemux::pulse::{PulseExtractor, Sample};
///
/// let samples = [
///     Sample { timestamp: 0, value: 200 },
///     Sample { timestamp: 10, value: 100 },
///     Sample { timestamp: 25, value: 200 },
///     Sample { timestamp: 40, value: 90 },
/// ];
/// assert_eq!(PulseExtractor::new(150).extract(&samples), vec![30]);
/// ```
#[derive(Debug, Clone)]
pub struct PulseExtractor {
    threshold: i64,
    last_timestamp: Option<i64>,
    pulses_seen: u64,
}

impl PulseExtractor {
    pub fn new(threshold: i64) -> Self {
        Self {
            threshold,
            last_timestamp: None,
            pulses_seen: 0,
        }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Number of qualifying samples observed so far
    pub fn pulses_seen(&self) -> u64 {
        self.pulses_seen
    }

    /// Feed one sample; returns the delta-time if this sample closes an interval
    pub fn push(&mut self, sample: Sample) -> Option<i64> {
        if sample.value >= self.threshold {
            return None;
        }

        self.pulses_seen += 1;
        let delta = self
            .last_timestamp
            .map(|last| sample.timestamp.saturating_sub(last));

        // Timestamp 0 is the "unset" sentinel, see type docs.
        self.last_timestamp = (sample.timestamp != 0).then_some(sample.timestamp);

        tracing::debug!(
            timestamp = sample.timestamp,
            value = sample.value,
            delta = ?delta,
            "pulse below threshold {}",
            self.threshold
        );
        delta
    }

    /// Run over a whole sequence, collecting delta-times in order
    pub fn extract(&mut self, samples: &[Sample]) -> Vec<i64> {
        samples.iter().filter_map(|&s| self.push(s)).collect()
    }
}
