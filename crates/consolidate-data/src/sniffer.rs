//! Delimiter detection for delimited text files.
//!
//! Counts each candidate separator in the first [`SAMPLE_BYTES`] of the file
//! and picks the most frequent one. Ties go to the earlier candidate in
//! [`Delimiter::CANDIDATES`], so an empty or unreadable sample yields a comma.
//!
//! The count is taken over a raw sample, not per line. A file whose header
//! uses a different separator frequency than its body (or whose first 1 KiB
//! is dominated by a quoted free-text field) can be misdetected.

use std::io::Read;
use std::path::Path;

use consolidate_core::models::Delimiter;
use tracing::{debug, error};

/// Number of bytes inspected.
pub const SAMPLE_BYTES: u64 = 1024;

/// Pick the delimiter for `sample`.
pub fn sniff_sample(sample: &[u8]) -> Delimiter {
    let mut best = Delimiter::CANDIDATES[0];
    let mut best_count = 0usize;

    for delim in Delimiter::CANDIDATES {
        let count = sample.iter().filter(|&&b| b == delim.as_byte()).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }

    best
}

/// Detect the delimiter of the file at `path`.
///
/// Read failures are logged and fall back to [`Delimiter::Comma`].
pub fn sniff_delimiter(path: &Path) -> Delimiter {
    match read_sample(path) {
        Ok(sample) => {
            let delimiter = sniff_sample(&sample);
            debug!("Detected {} delimiter in {}", delimiter, path.display());
            delimiter
        }
        Err(e) => {
            error!("Error detecting delimiter: {}", e);
            Delimiter::default()
        }
    }
}

fn read_sample(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_BYTES as usize);
    file.take(SAMPLE_BYTES).read_to_end(&mut sample)?;
    Ok(sample)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[test]
    fn test_sniff_single_delimiter() {
        assert_eq!(sniff_sample(b"a,b,c"), Delimiter::Comma);
        assert_eq!(sniff_sample(b"a;b;c"), Delimiter::Semicolon);
        assert_eq!(sniff_sample(b"a\tb\tc"), Delimiter::Tab);
    }

    #[test]
    fn test_sniff_majority_wins() {
        let sample = b"Transaction;Country;Currency;Client\n1,5;US;USD;Bob\n";
        assert_eq!(sniff_sample(sample), Delimiter::Semicolon);
    }

    #[test]
    fn test_sniff_tie_prefers_comma_then_semicolon() {
        assert_eq!(sniff_sample(b"a,b;c"), Delimiter::Comma);
        assert_eq!(sniff_sample(b"a;b\tc"), Delimiter::Semicolon);
    }

    #[test]
    fn test_sniff_empty_sample_is_comma() {
        assert_eq!(sniff_sample(b""), Delimiter::Comma);
        assert_eq!(sniff_sample(b"no separators here"), Delimiter::Comma);
    }

    #[test]
    fn test_sniff_delimiter_reads_only_first_kib() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.csv");
        // 1024 bytes of semicolon-separated text, then many tabs.
        let mut content = "a;".repeat(512);
        content.push_str(&"\t".repeat(4096));
        std::fs::write(&path, content).unwrap();

        assert_eq!(sniff_delimiter(&path), Delimiter::Semicolon);
    }

    #[test]
    fn test_sniff_delimiter_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "Transaction\tCountry\n100\tUS\n").unwrap();
        assert_eq!(sniff_delimiter(&path), Delimiter::Tab);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sniff_delimiter_unreadable_falls_back_to_comma() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let delimiter = tracing::subscriber::with_default(subscriber, || sniff_delimiter(&path));

        assert_eq!(delimiter, Delimiter::Comma);
        let captured = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(captured.contains("ERROR"), "log was: {captured}");
        assert!(captured.contains("Error detecting delimiter"));
    }
}
