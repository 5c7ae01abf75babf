//! Demultiplexer: routes records to one sink per kind
//!
//! The demultiplexer is the only owner of the `kind -> sink` map. Sinks are
//! opened lazily, at most once per kind for the lifetime of the value, and
//! released exactly once: either by `finish()` or, on any other exit path
//! (error, early return, panic unwinding), by `Drop`.
//!
//! The map is bounded. Once `max_kinds` kinds are open, records of any new
//! kind are turned away instead of opening yet another destination.

use crate::csv_output::format_row;
use crate::error::{Error, Result};
use crate::record::{Record, SINK_HEADER};
use crate::sink::SinkProvider;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Write;

/// Default cap on distinct kinds per run
pub const DEFAULT_MAX_KINDS: usize = 64;

/// What `route` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Written,
    /// The kind is new and the kind limit is already reached
    KindLimitReached,
}

struct KindSink<W> {
    writer: W,
    location: String,
    rows: u64,
    header_written: bool,
}

/// What happened to one kind during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSummary {
    pub kind: String,
    pub location: String,
    pub rows: u64,
    pub header_written: bool,
}

/// Per-kind results in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxSummary {
    pub kinds: Vec<KindSummary>,
}

impl DemuxSummary {
    pub fn total_rows(&self) -> u64 {
        self.kinds.iter().map(|k| k.rows).sum()
    }

    pub fn get(&self, kind: &str) -> Option<&KindSummary> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

/// Routes records to per-kind sinks opened through `P`
pub struct Demultiplexer<P: SinkProvider> {
    provider: P,
    sinks: HashMap<String, KindSink<P::Writer>>,
    /// First-seen order of kinds
    order: Vec<String>,
    flush_every_row: bool,
    max_kinds: usize,
    summary: DemuxSummary,
}

impl<P: SinkProvider> Demultiplexer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sinks: HashMap::new(),
            order: Vec::new(),
            flush_every_row: false,
            max_kinds: DEFAULT_MAX_KINDS,
            summary: DemuxSummary::default(),
        }
    }

    /// Flush each sink after every row (useful when tailing the files live)
    pub fn with_flush_every_row(mut self, flush_every_row: bool) -> Self {
        self.flush_every_row = flush_every_row;
        self
    }

    /// Cap the number of distinct kinds (and so open destinations)
    pub fn with_max_kinds(mut self, max_kinds: usize) -> Self {
        self.max_kinds = max_kinds;
        self
    }

    /// Number of distinct kinds seen so far
    pub fn kind_count(&self) -> usize {
        self.order.len()
    }

    fn open(provider: &mut P, kind: &str) -> Result<KindSink<P::Writer>> {
        let acquired = provider.acquire(kind).map_err(|source| Error::SinkAcquire {
            kind: kind.to_string(),
            source,
        })?;

        let mut sink = KindSink {
            writer: acquired.writer,
            location: acquired.location,
            rows: 0,
            header_written: false,
        };

        if acquired.fresh {
            sink.writer
                .write_all(format_row(&SINK_HEADER).as_bytes())
                .map_err(|source| Error::SinkWrite {
                    kind: kind.to_string(),
                    source,
                })?;
            sink.header_written = true;
        }

        tracing::info!(
            kind,
            location = %sink.location,
            header = sink.header_written,
            "opened sink"
        );
        Ok(sink)
    }

    /// Append `record` to the sink for its kind, opening the sink if needed
    pub fn route(&mut self, record: &Record) -> Result<Routed> {
        let sink = match self.sinks.entry(record.kind.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(_) if self.order.len() >= self.max_kinds => {
                tracing::warn!(
                    kind = %record.kind,
                    max_kinds = self.max_kinds,
                    "kind limit reached, dropping record"
                );
                return Ok(Routed::KindLimitReached);
            }
            Entry::Vacant(entry) => {
                let sink = Self::open(&mut self.provider, &record.kind)?;
                self.order.push(record.kind.clone());
                entry.insert(sink)
            }
        };

        let row = format_row(&[&record.timestamp, &record.value]);
        let write_result = sink.writer.write_all(row.as_bytes()).and_then(|()| {
            if self.flush_every_row {
                sink.writer.flush()
            } else {
                Ok(())
            }
        });
        write_result.map_err(|source| Error::SinkWrite {
            kind: record.kind.clone(),
            source,
        })?;
        sink.rows += 1;

        tracing::debug!(
            kind = %record.kind,
            timestamp = %record.timestamp,
            value = %record.value,
            "row written"
        );
        Ok(Routed::Written)
    }

    /// Flush and close every open sink.
    ///
    /// All sinks are flushed even if one fails; the first failure is returned.
    fn release(&mut self) -> Result<()> {
        let mut first_error = None;

        for kind in self.order.drain(..) {
            let Some(mut sink) = self.sinks.remove(&kind) else {
                continue;
            };

            if let Err(source) = sink.writer.flush() {
                tracing::warn!(kind = %kind, "flush failed: {}", source);
                if first_error.is_none() {
                    first_error = Some(Error::SinkWrite {
                        kind: kind.clone(),
                        source,
                    });
                }
            }

            self.summary.kinds.push(KindSummary {
                kind,
                location: sink.location,
                rows: sink.rows,
                header_written: sink.header_written,
            });
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Release all sinks and report what was written
    pub fn finish(mut self) -> Result<DemuxSummary> {
        self.release()?;
        Ok(std::mem::take(&mut self.summary))
    }
}

impl<P: SinkProvider> Drop for Demultiplexer<P> {
    fn drop(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        tracing::debug!(open = self.sinks.len(), "releasing sinks on drop");
        if let Err(e) = self.release() {
            tracing::warn!("error while releasing sinks: {}", e);
        }
    }
}
