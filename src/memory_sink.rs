use crate::sink::LogSink;
use serde_json::Value;
use std::io;
use std::sync::{Arc, Mutex};

/// A sink that keeps every line in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// [`Logger`](crate::logger::Logger) and inspect what was written through
/// another.
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, split into lines without the trailing
    /// newline.
    pub fn lines(&self) -> Vec<String> {
        let buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines parsed as JSON; lines that are not valid JSON are skipped.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("memory sink mutex poisoned"))?
            .extend_from_slice(line);
        Ok(())
    }
}
