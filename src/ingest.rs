//! Ingest pipeline: decoder -> parser -> demultiplexer, in lockstep
//!
//! One line is decoded, parsed and routed before the next is read. Parse
//! failures are logged and skipped. A transport failure ends the run, but the
//! demultiplexer is dropped on the way out and so still releases its sinks.

use crate::cancel::CancelToken;
use crate::config::IngestConfig;
use crate::demux::{DemuxSummary, Demultiplexer, Routed};
use crate::error::Result;
use crate::line_decoder::{DecoderStats, LineDecoder};
use crate::record::parse_record;
use crate::sink::SinkProvider;
use std::io::BufRead;

/// What a finished ingest run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub decoder: DecoderStats,
    /// Records routed to a sink
    pub records: u64,
    /// Lines rejected by the record parser
    pub parse_failures: u64,
    /// Records dropped because their kind would exceed `max_kinds`
    pub kinds_rejected: u64,
    /// The run stopped because of a cancel request
    pub cancelled: bool,
    pub sinks: DemuxSummary,
}

/// Run the pipeline until the source is exhausted or `cancel` is set
pub fn run_ingest<R, P>(
    reader: R,
    provider: P,
    config: &IngestConfig,
    cancel: CancelToken,
) -> Result<IngestStats>
where
    R: BufRead,
    P: SinkProvider,
{
    let mut decoder = LineDecoder::new(reader, cancel).with_max_line_len(config.max_line_len);
    let mut demux = Demultiplexer::new(provider)
        .with_flush_every_row(config.flush_every_row)
        .with_max_kinds(config.max_kinds);
    let mut records = 0u64;
    let mut parse_failures = 0u64;
    let mut kinds_rejected = 0u64;

    for line in decoder.by_ref() {
        let line = line?;
        match parse_record(&line) {
            Ok(record) => match demux.route(&record)? {
                Routed::Written => records += 1,
                Routed::KindLimitReached => kinds_rejected += 1,
            },
            Err(e) => {
                parse_failures += 1;
                tracing::warn!("{}", e);
            }
        }
    }

    let cancelled = decoder.was_cancelled();
    if cancelled {
        tracing::info!("Stream processing stopped.");
    }

    let sinks = demux.finish()?;
    tracing::info!(
        kinds = sinks.kinds.len(),
        records,
        parse_failures,
        kinds_rejected,
        "All files closed."
    );

    Ok(IngestStats {
        decoder: decoder.stats().clone(),
        records,
        parse_failures,
        kinds_rejected,
        cancelled,
        sinks,
    })
}
