//! Log capture for tests.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted events in memory.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Routes events from the current thread here until the guard is dropped.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&lock(&self.buffer)).lines().map(str::to_string).collect()
    }

    /// Indices of every line containing `needle`.
    pub(crate) fn position_all(&self, needle: &str) -> Vec<usize> {
        self.lines().iter().enumerate().filter(|(_, line)| line.contains(needle)).map(|(i, _)| i).collect()
    }

    /// Lines logged at the given level (`"ERROR"`, `"WARN"`, ...).
    pub(crate) fn at_level(&self, level: &str) -> Vec<String> {
        self.lines().into_iter().filter(|line| line.split_whitespace().next() == Some(level)).collect()
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.buffer).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter { buffer: self.buffer.clone() }
    }
}
