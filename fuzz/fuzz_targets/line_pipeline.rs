#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use telemux::cancel::CancelToken;
use telemux::config::IngestConfig;
use telemux::ingest::run_ingest;
use telemux::sink::MemorySinks;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes through decoder, parser and demultiplexer.
    // Must not panic, and every row routed must land in some sink.
    let config = IngestConfig {
        max_line_len: 256,
        ..IngestConfig::default()
    };
    let sinks = MemorySinks::new();
    if let Ok(stats) = run_ingest(Cursor::new(data), sinks.clone(), &config, CancelToken::new()) {
        assert_eq!(stats.sinks.total_rows(), stats.records);
        assert_eq!(stats.sinks.kinds.len(), sinks.kinds().len());
    }
});
