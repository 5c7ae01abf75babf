//! Per-kind output destinations
//!
//! A `SinkProvider` opens the destination for a kind the first time the
//! demultiplexer sees it. Whether the destination is fresh (new or empty) is
//! decided exactly once, at acquisition, and drives the header write.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// An opened destination for one kind
#[derive(Debug)]
pub struct Acquired<W> {
    pub writer: W,
    /// True when the destination did not exist or was empty
    pub fresh: bool,
    /// Human-readable location, for logs and run summaries
    pub location: String,
}

/// Opens append-only destinations keyed by kind
pub trait SinkProvider {
    type Writer: Write;

    fn acquire(&mut self, kind: &str) -> io::Result<Acquired<Self::Writer>>;
}

/// Encode a kind tag for use in a file name
///
/// `[A-Za-z0-9_-]` pass through; every other byte becomes `%XX`. Distinct
/// kinds always get distinct names.
pub fn encode_kind(kind: &str) -> String {
    let mut out = String::with_capacity(kind.len());
    for &b in kind.as_bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// CSV files in a directory, one per kind: `{kind}_{run_stamp}.csv`
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    run_stamp: String,
}

impl CsvDirectory {
    /// Use `dir` (created if missing) with a run stamp taken from the local clock
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::with_run_stamp(dir, stamp)
    }

    /// Use an explicit run stamp
    pub fn with_run_stamp(dir: impl Into<PathBuf>, run_stamp: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            run_stamp: run_stamp.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_stamp(&self) -> &str {
        &self.run_stamp
    }

    /// File that `kind` maps to for this run
    pub fn path_for(&self, kind: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", encode_kind(kind), self.run_stamp))
    }
}

impl SinkProvider for CsvDirectory {
    type Writer = BufWriter<File>;

    fn acquire(&mut self, kind: &str) -> io::Result<Acquired<Self::Writer>> {
        let path = self.path_for(kind);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let fresh = file.metadata()?.len() == 0;

        Ok(Acquired {
            writer: BufWriter::new(file),
            fresh,
            location: path.display().to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    contents: HashMap<String, Vec<u8>>,
    acquisitions: HashMap<String, usize>,
}

/// In-memory destinations, shared between the provider and its writers
///
/// Cloning yields another handle to the same store, so a test can keep one
/// handle while the demultiplexer owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySinks {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pre-populate a destination, as if it survived from an earlier run
    pub fn seed(&self, kind: &str, bytes: &[u8]) {
        self.lock()
            .contents
            .entry(kind.to_string())
            .or_default()
            .extend_from_slice(bytes);
    }

    /// Everything written for `kind` so far
    pub fn contents(&self, kind: &str) -> Option<String> {
        self.lock()
            .contents
            .get(kind)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// How many times `kind` was acquired
    pub fn acquisitions(&self, kind: &str) -> usize {
        self.lock().acquisitions.get(kind).copied().unwrap_or(0)
    }

    /// Kinds with a destination, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.lock().contents.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

/// Writer handed out by `MemorySinks`
#[derive(Debug)]
pub struct MemoryWriter {
    kind: String,
    sinks: MemorySinks,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sinks
            .lock()
            .contents
            .entry(self.kind.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkProvider for MemorySinks {
    type Writer = MemoryWriter;

    fn acquire(&mut self, kind: &str) -> io::Result<Acquired<Self::Writer>> {
        let fresh = {
            let mut store = self.lock();
            *store.acquisitions.entry(kind.to_string()).or_default() += 1;
            store.contents.entry(kind.to_string()).or_default().is_empty()
        };

        Ok(Acquired {
            writer: MemoryWriter {
                kind: kind.to_string(),
                sinks: self.clone(),
            },
            fresh,
            location: format!("memory:{}", kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_kind() {
        assert_eq!(encode_kind("hall-2_a"), "hall-2_a");
        assert_eq!(encode_kind("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(encode_kind("temp sensor"), "temp%20sensor");
        assert_eq!(encode_kind("50%"), "50%25");
    }

    #[test]
    fn test_encode_kind_keeps_lookalike_kinds_apart() {
        let kinds = ["a.b", "a_b", "a b", "a%2Eb", "a/b"];
        let encoded: std::collections::HashSet<String> =
            kinds.iter().map(|k| encode_kind(k)).collect();
        assert_eq!(encoded.len(), kinds.len());
    }

    #[test]
    fn test_csv_directory_path_uses_run_stamp() {
        let dir = TempDir::new().unwrap();
        let provider = CsvDirectory::with_run_stamp(dir.path(), "20240101_120000").unwrap();
        assert_eq!(
            provider.path_for("2"),
            dir.path().join("2_20240101_120000.csv")
        );
    }

    #[test]
    fn test_csv_directory_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let provider = CsvDirectory::with_run_stamp(&nested, "stamp").unwrap();
        assert!(provider.dir().is_dir());
    }

    #[test]
    fn test_csv_directory_new_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let mut provider = CsvDirectory::with_run_stamp(dir.path(), "s").unwrap();
        let acquired = provider.acquire("3").unwrap();
        assert!(acquired.fresh);
        assert!(acquired.location.ends_with("3_s.csv"));
    }

    #[test]
    fn test_csv_directory_existing_file_not_fresh_and_not_truncated() {
        let dir = TempDir::new().unwrap();
        let mut provider = CsvDirectory::with_run_stamp(dir.path(), "s").unwrap();
        let path = provider.path_for("3");
        fs::write(&path, "Timestamp,Amplitude\n1,2\n").unwrap();

        let mut acquired = provider.acquire("3").unwrap();
        assert!(!acquired.fresh);
        acquired.writer.write_all(b"3,4\n").unwrap();
        acquired.writer.flush().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Timestamp,Amplitude\n1,2\n3,4\n");
    }

    #[test]
    fn test_csv_directory_empty_existing_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let mut provider = CsvDirectory::with_run_stamp(dir.path(), "s").unwrap();
        fs::write(provider.path_for("x"), "").unwrap();
        assert!(provider.acquire("x").unwrap().fresh);
    }

    #[test]
    fn test_memory_sinks_track_fresh_and_acquisitions() {
        let mut sinks = MemorySinks::new();
        sinks.seed("old", b"Timestamp,Amplitude\n");

        assert!(!sinks.acquire("old").unwrap().fresh);
        assert!(sinks.acquire("new").unwrap().fresh);
        assert_eq!(sinks.acquisitions("old"), 1);
        assert_eq!(sinks.acquisitions("new"), 1);
        assert_eq!(sinks.kinds(), vec!["new".to_string(), "old".to_string()]);
    }

    #[test]
    fn test_memory_writer_appends() {
        let mut sinks = MemorySinks::new();
        let mut acquired = sinks.acquire("k").unwrap();
        acquired.writer.write_all(b"a").unwrap();
        acquired.writer.write_all(b"b").unwrap();
        assert_eq!(sinks.contents("k").unwrap(), "ab");
    }
}
