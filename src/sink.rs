use crate::config::Config;
use std::fs::{File, OpenOptions};
use std::io::{self, Stderr, Stdout, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

/// Destination for serialized records.
///
/// Implementations receive one complete JSON line per call. The logger
/// holds its own lock around every call, so `write_line` is never entered
/// concurrently for the same sink.
pub trait LogSink: Send {
    /// Short name used in diagnostics, e.g. `"console"`.
    fn name(&self) -> &str;

    /// Write one serialized record.
    ///
    /// **Returns**
    /// - `Ok(())` if the whole line was handed to the destination.
    /// - `Err(..)` on any I/O failure. Errors are not retried.
    fn write_line(&mut self, line: &[u8]) -> io::Result<()>;

    /// Flush any buffered bytes. Default implementation is a no-op.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes records to standard output, or to standard error for
/// [`ConsoleSink::stderr`].
pub struct ConsoleSink {
    out: ConsoleOut,
}

enum ConsoleOut {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            out: ConsoleOut::Stdout(io::stdout()),
        }
    }

    pub fn stderr() -> Self {
        Self {
            out: ConsoleOut::Stderr(io::stderr()),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        match self.out {
            ConsoleOut::Stdout(_) => "console",
            ConsoleOut::Stderr(_) => "stderr",
        }
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        match &self.out {
            ConsoleOut::Stdout(out) => out.lock().write_all(line),
            ConsoleOut::Stderr(out) => out.lock().write_all(line),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.out {
            ConsoleOut::Stdout(out) => out.flush(),
            ConsoleOut::Stderr(out) => out.flush(),
        }
    }
}

/// Appends records to a file, creating it if absent.
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let file = options.open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Streams records to a remote log collector over TCP.
///
/// Bytes go straight to the socket: no buffering, no reconnect. A failed
/// write is returned to the logger, which reports it and moves on.
pub struct RemoteSink {
    address: String,
    conn: TcpStream,
}

impl RemoteSink {
    pub fn connect(address: &str) -> io::Result<Self> {
        let conn = TcpStream::connect(address)?;
        Ok(Self {
            address: address.to_string(),
            conn,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl LogSink for RemoteSink {
    fn name(&self) -> &str {
        "log analyser"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.conn.write_all(line)
    }
}

/// Broadcasts every record to all inner sinks, in order.
///
/// Fail-fast: the first failing sink aborts the write for the sinks after
/// it, and its error is returned. Earlier sinks have already received the
/// record.
pub struct MultiSink {
    sinks: Vec<Box<dyn LogSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl LogSink for MultiSink {
    fn name(&self) -> &str {
        "multi"
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.write_line(line).map_err(|e| {
                io::Error::new(e.kind(), format!("{} sink: {}", sink.name(), e))
            })?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

/// Error opening one of the configured destinations.
#[derive(thiserror::Error, Debug)]
pub enum SinkOpenError {
    #[error("failed to open log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to log analyser at {address}: {source}")]
    Remote {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Open every destination enabled in `config`, in the order console, file,
/// remote collector.
///
/// If nothing is enabled the result falls back to stdout alone. Any open
/// failure aborts composition; sinks already opened are dropped.
pub fn compose_sinks(config: &Config) -> Result<MultiSink, SinkOpenError> {
    let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();

    if config.console() {
        sinks.push(Box::new(ConsoleSink::new()));
    }

    if let Some(path) = config.log_file_path() {
        let sink = FileSink::open(path).map_err(|source| SinkOpenError::File {
            path: path.to_string(),
            source,
        })?;
        sinks.push(Box::new(sink));
    }

    if config.log_analyser_enabled() {
        let address = config.log_analyser_address();
        let sink = RemoteSink::connect(address).map_err(|source| SinkOpenError::Remote {
            address: address.to_string(),
            source,
        })?;
        sinks.push(Box::new(sink));
    }

    if sinks.is_empty() {
        sinks.push(Box::new(ConsoleSink::new()));
    }

    Ok(MultiSink::new(sinks))
}
