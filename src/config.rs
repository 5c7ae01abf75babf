//! Configuration for ingest, analysis and monitoring
//!
//! Every tunable has a default that matches the hall-sensor rig the tool was
//! built for. Values can come from a TOML file with `[analysis]`, `[ingest]`
//! and `[monitor]` tables; command-line flags override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::demux::DEFAULT_MAX_KINDS;
use crate::line_decoder::DEFAULT_MAX_LINE_LEN;

/// Pulse extraction and outlier filtering parameters
///
/// # Example
/// ```
/// use telemux::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.threshold, 150);
/// assert_eq!(config.iqr_multiplier, 1.25);
/// assert_eq!(config.lower_floor, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Amplitudes strictly below this value count as a pulse
    pub threshold: i64,

    /// Multiplier applied to the IQR on both sides of the quartiles
    pub iqr_multiplier: f64,

    /// Minimum value of the lower bound. Deltas below it are sensor noise
    /// (double triggers). Only the lower bound is clamped.
    pub lower_floor: f64,

    /// Number of bins in the text histogram
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 150,
            iqr_multiplier: 1.25,
            lower_floor: 2.0,
            histogram_bins: 20,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            ));
        }

        if !self.lower_floor.is_finite() {
            return Err(format!(
                "lower_floor must be finite, got {}",
                self.lower_floor
            ));
        }

        if self.histogram_bins == 0 {
            return Err("histogram_bins must be >= 1".to_string());
        }

        Ok(())
    }
}

/// Stream ingest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory receiving one CSV file per kind
    pub out_dir: PathBuf,

    /// Lines longer than this many bytes are discarded
    pub max_line_len: usize,

    /// Flush every sink after each row instead of only at shutdown
    pub flush_every_row: bool,

    /// Most distinct kinds per run; records of further kinds are dropped
    pub max_kinds: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            flush_every_row: false,
            max_kinds: DEFAULT_MAX_KINDS,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_len == 0 {
            return Err("max_line_len must be >= 1".to_string());
        }
        if self.max_kinds == 0 {
            return Err("max_kinds must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Live monitor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Kinds that carry hall-sensor pulses
    pub kinds: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            kinds: vec!["2".to_string(), "3".to_string()],
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.kinds.is_empty() {
            return Err("monitor needs at least one kind".to_string());
        }
        if let Some(empty) = self.kinds.iter().position(|k| k.is_empty()) {
            return Err(format!("monitor kind #{} is empty", empty + 1));
        }
        Ok(())
    }
}

/// Contents of a `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub analysis: AnalysisConfig,
    pub ingest: IngestConfig,
    pub monitor: MonitorConfig,
}

impl FileConfig {
    /// Load and validate a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.analysis.validate()?;
        self.ingest.validate()?;
        self.monitor.validate()
    }
}
