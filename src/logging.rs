use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Stdout logging, plus a size-capped file when `log_file` is set.
pub fn init_logging(log_level: Level, log_file: Option<&str>) {
    let level_filter = LevelFilter::from_level(log_level);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_filter(level_filter);

    let file_layer = log_file.map(|path| {
        let writer = CappedFile::new(PathBuf::from(path), LOG_FILE_MAX_BYTES);
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .with_filter(level_filter)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

/// Append-only log file that keeps its newest half once it reaches `max_len`.
#[derive(Clone)]
pub struct CappedFile {
    path: PathBuf,
    max_len: u64,
    lock: Arc<Mutex<()>>,
}

impl CappedFile {
    pub fn new(path: PathBuf, max_len: u64) -> Self {
        Self { path, max_len, lock: Arc::new(Mutex::new(())) }
    }

    fn shrink_if_full(&self) -> io::Result<()> {
        let size = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < self.max_len {
            return Ok(());
        }

        let keep = self.max_len / 2;
        let mut tail = Vec::new();
        let mut rf = OpenOptions::new().read(true).open(&self.path)?;
        rf.seek(SeekFrom::Start(size.saturating_sub(keep)))?;
        rf.read_to_end(&mut tail)?;

        let mut wf = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        wf.write_all(&tail)
    }
}

impl Write for CappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;

        self.shrink_if_full()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_below_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        let mut file = CappedFile::new(path.clone(), 1024);

        file.write_all(b"first\n").unwrap();
        file.write_all(b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_keeps_newest_half_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        std::fs::write(&path, "a".repeat(60) + &"b".repeat(40)).unwrap();

        let mut file = CappedFile::new(path.clone(), 100);
        file.write_all(b"new").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a".repeat(10) + &"b".repeat(40) + "new");
    }
}
