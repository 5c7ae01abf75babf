//! telemux - Sensor telemetry demultiplexer and pulse interval analyzer
//!
//! This library provides the two halves of the tool. Ingest turns a stream of
//! `kind,timestamp,amplitude` lines into one CSV file per kind. Analysis reads
//! one of those files back, extracts hall-sensor pulse delta-times, filters
//! outliers with an IQR rule and summarizes the rest.

pub mod analyze;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod demux;
pub mod error;
pub mod ingest;
pub mod json_output;
pub mod line_decoder;
pub mod monitor;
pub mod pulse;
pub mod record;
pub mod report;
pub mod sample_reader;
pub mod sink;
pub mod stats;

pub use error::{Error, Result};
