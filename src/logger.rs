use crate::config::Config;
use crate::fields::attach_fields;
use crate::level::Level;
use crate::record::{AttachedError, LogRecord};
use crate::sink::{compose_sinks, ConsoleSink, LogSink, SinkOpenError};
use chrono::Utc;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::{Mutex, MutexGuard};

/// Error creating a [`Logger`] from a valid [`Config`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("logger initialization failed: {0}")]
    Sink(#[from] SinkOpenError),
}

/// A configured structured logger.
///
/// Holds the composed sink, the minimum level and the fields stamped on
/// every record (service, pod, process id). Each record is written while
/// holding the sink lock, so concurrent calls never interleave bytes.
///
/// The leveled methods take an alternating `key, value, ...` list (see
/// [`fields!`](crate::fields!)). A malformed list never fails the call: it
/// is replaced by a single `fields_error` field.
pub struct Logger {
    level: Level,
    service: String,
    pod: String,
    pid: u32,
    sink: Mutex<Box<dyn LogSink>>,
}

macro_rules! leveled {
    ($($level:ident => $name:ident, $with_error:ident;)+) => {
        $(
            #[doc = concat!("Log `message` at `", stringify!($name), "` level.")]
            #[track_caller]
            pub fn $name(&self, message: &str, fields: &[Value]) {
                self.log(Level::$level, message, fields);
            }

            #[doc = concat!("Log `err` at `", stringify!($name), "` level with its source chain and a captured stack trace.")]
            #[track_caller]
            pub fn $with_error(&self, err: &(dyn Error + 'static), fields: &[Value]) {
                self.log_error(Level::$level, err, fields);
            }
        )+
    };
}

impl Logger {
    /// Open every destination in `config` and build a logger over them.
    ///
    /// **Returns**
    /// - `Err(InitError)` if the log file cannot be opened or the log
    ///   analyser cannot be reached. Nothing is partially initialized.
    pub fn new(config: &Config) -> Result<Logger, InitError> {
        let sink = compose_sinks(config)?;
        Ok(Self::with_sink(config, sink))
    }

    /// Build a logger writing to an already constructed sink, ignoring the
    /// destinations named in `config`.
    pub fn with_sink(config: &Config, sink: impl LogSink + 'static) -> Logger {
        Logger {
            level: Level::parse(config.log_level()),
            service: config.service_name().to_string(),
            pod: config.pod().to_string(),
            pid: std::process::id(),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Stderr logger at `trace` level with no identity, used before the
    /// process-wide logger is initialized.
    pub(crate) fn stderr_fallback() -> Logger {
        Logger {
            level: Level::Trace,
            service: String::new(),
            pod: String::new(),
            pid: std::process::id(),
            sink: Mutex::new(Box::new(ConsoleSink::stderr())),
        }
    }

    /// Effective minimum level.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Log at an arbitrary level. Unlike [`Logger::fatal`] and
    /// [`Logger::panic`] this always returns, whatever the level.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Value]) {
        if !self.enabled(level) {
            return;
        }
        let caller = caller_location(Location::caller());
        self.dispatch(level, message.to_string(), attach_fields(fields), None, Some(caller));
    }

    #[track_caller]
    fn log_error(&self, level: Level, err: &(dyn Error + 'static), fields: &[Value]) {
        if !self.enabled(level) {
            return;
        }
        let caller = caller_location(Location::caller());
        self.dispatch(
            level,
            err.to_string(),
            attach_fields(fields),
            Some(attach_error(err)),
            Some(caller),
        );
    }

    leveled! {
        Trace => trace, trace_with_error;
        Debug => debug, debug_with_error;
        Info => info, info_with_error;
        Warn => warn, warn_with_error;
        Error => error, error_with_error;
    }

    /// Log at `fatal` level, flush, and exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Value]) -> ! {
        self.log(Level::Fatal, message, fields);
        self.flush();
        std::process::exit(1)
    }

    /// Like [`Logger::fatal`], logging `err` as in [`Logger::error_with_error`].
    #[track_caller]
    pub fn fatal_with_error(&self, err: &(dyn Error + 'static), fields: &[Value]) -> ! {
        self.log_error(Level::Fatal, err, fields);
        self.flush();
        std::process::exit(1)
    }

    /// Log at `panic` level, flush, and panic with `message`.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Value]) -> ! {
        self.log(Level::Panic, message, fields);
        self.flush();
        panic!("{message}")
    }

    /// Like [`Logger::panic`], logging `err` as in [`Logger::error_with_error`].
    #[track_caller]
    pub fn panic_with_error(&self, err: &(dyn Error + 'static), fields: &[Value]) -> ! {
        self.log_error(Level::Panic, err, fields);
        self.flush();
        panic!("{err}")
    }

    /// Flush every sink. Failures are reported on stderr.
    pub fn flush(&self) {
        if let Err(e) = self.lock_sink().flush() {
            eprintln!("error flushing log sinks: {}", e);
        }
    }

    /// Serialize and write one record. Level filtering is the caller's job.
    pub(crate) fn dispatch(
        &self,
        level: Level,
        message: String,
        fields: Vec<(String, Value)>,
        error: Option<AttachedError>,
        caller: Option<String>,
    ) {
        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            service: self.service.clone(),
            pod: self.pod.clone(),
            pid: self.pid,
            caller,
            message,
            fields,
            error,
        };

        let line = match record.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                eprintln!("error serializing log record: {}", e);
                return;
            }
        };

        if let Err(e) = self.lock_sink().write_line(&line) {
            eprintln!("error writing log record: {}", e);
        }
    }

    fn lock_sink(&self) -> MutexGuard<'_, Box<dyn LogSink>> {
        // A panic while writing leaves the sink usable; keep logging.
        match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("service", &self.service)
            .field("pod", &self.pod)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

fn caller_location(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}

fn attach_error(err: &(dyn Error + 'static)) -> AttachedError {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(e) = source {
        chain.push(e.to_string());
        source = e.source();
    }

    AttachedError {
        message: err.to_string(),
        chain,
        stack: Backtrace::force_capture().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::memory_sink::MemorySink;
    use std::sync::Arc;

    fn logger(level: &str) -> (Logger, MemorySink) {
        let config = Config::build("svc", "pod-1", true, "", "", false, level).unwrap();
        let sink = MemorySink::new();
        (Logger::with_sink(&config, sink.clone()), sink)
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn emits_fixed_fields_and_message() {
        let (logger, sink) = logger("debug");
        logger.debug("starting", &fields![]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["service"], "svc");
        assert_eq!(record["pod"], "pod-1");
        assert_eq!(record["pid"], std::process::id());
        assert_eq!(record["level"], "debug");
        assert_eq!(record["message"], "starting");
        assert!(record["time"].as_str().unwrap().ends_with('Z'));
        assert!(sink.lines()[0].contains(r#""service":"svc""#));
    }

    #[test]
    fn filters_below_minimum_level() {
        let (logger, sink) = logger("warn");
        logger.debug("x", &fields![]);
        logger.info("x", &fields![]);
        assert!(sink.lines().is_empty());

        logger.warn("x", &fields![]);
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn unknown_level_behaves_as_info() {
        let (logger, sink) = logger("verbose");
        assert_eq!(logger.level(), Level::Info);
        logger.debug("hidden", &fields![]);
        logger.info("shown", &fields![]);
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn caller_points_at_call_site() {
        let (logger, sink) = logger("info");
        let line = line!() + 1;
        logger.info("here", &fields![]);

        let caller = sink.records()[0]["caller"].as_str().unwrap().to_string();
        assert_eq!(caller, format!("{}:{}", file!(), line));
    }

    #[test]
    fn string_fields_are_appended_in_order() {
        let (logger, sink) = logger("info");
        logger.info("login", &fields!["user", "ann", "method", "password"]);

        let line = &sink.lines()[0];
        let user = line.find(r#""user":"ann""#).unwrap();
        let method = line.find(r#""method":"password""#).unwrap();
        assert!(user < method);
    }

    #[test]
    fn odd_field_count_degrades_to_fields_error() {
        let (logger, sink) = logger("info");
        logger.info("msg", &fields!["key"]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "msg");
        assert_eq!(records[0]["fields_error"], "uneven number of key-value pairs");
        assert!(records[0].get("key").is_none());
    }

    #[test]
    fn non_string_value_degrades_to_fields_error() {
        let (logger, sink) = logger("info");
        logger.info("msg", &fields!["key", 42]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fields_error"], "key-value pairs must be strings");
    }

    #[test]
    fn with_error_uses_error_message_and_attaches_stack() {
        let (logger, sink) = logger("info");
        let err = Boom {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        logger.error_with_error(&err, &fields!["request", "r-1"]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["level"], "error");
        assert_eq!(record["message"], "boom");
        assert_eq!(record["error"], "boom");
        assert_eq!(record["error_chain"], serde_json::json!(["disk gone"]));
        assert!(record["stack"].is_string());
        assert_eq!(record["request"], "r-1");
    }

    #[test]
    fn with_error_keeps_error_when_fields_are_malformed() {
        let (logger, sink) = logger("info");
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        logger.warn_with_error(&err, &fields!["dangling"]);

        let record = &sink.records()[0];
        assert_eq!(record["message"], "boom");
        assert_eq!(record["error"], "boom");
        assert_eq!(record["fields_error"], "uneven number of key-value pairs");
    }

    #[test]
    fn with_error_is_filtered_by_level() {
        let (logger, sink) = logger("error");
        let err = std::io::Error::new(std::io::ErrorKind::Other, "minor");
        logger.warn_with_error(&err, &fields![]);
        assert!(sink.lines().is_empty());
    }

    #[test]
    #[should_panic(expected = "invariant broken")]
    fn panic_level_unwinds_after_logging() {
        let (logger, _sink) = logger("info");
        logger.panic("invariant broken", &fields![]);
    }

    #[test]
    fn panic_record_is_written_before_unwinding() {
        let (logger, sink) = logger("info");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("invariant broken", &fields!["shard", "3"]);
        }));

        assert!(result.is_err());
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "panic");
        assert_eq!(records[0]["shard"], "3");
    }

    #[test]
    fn concurrent_records_do_not_interleave() {
        let (logger, sink) = logger("info");
        let logger = Arc::new(logger);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let n = format!("{t}-{i}");
                        logger.info("tick", &fields!["n", n.as_str()]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.lines().len(), 400);
        assert_eq!(sink.records().len(), 400);
    }
}
