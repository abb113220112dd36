use crate::config::Config;
use crate::layer::LoggerLayer;
use crate::level::Level;
use crate::logger::{InitError, Logger};
use crate::record::LogRecord;
use chrono::Utc;
use serde_json::Value;
use std::error::Error;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Holds at most one [`Logger`]; the first successful initialization wins.
///
/// Initialization is serialized by a mutex, so two threads racing to
/// initialize cannot both open sinks. Later calls leave the stored logger
/// untouched and emit a `warn` record through it.
pub struct LoggerCell {
    logger: OnceLock<Arc<Logger>>,
    init_lock: Mutex<()>,
}

impl LoggerCell {
    pub const fn new() -> Self {
        Self {
            logger: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Initialize from `config`, or return the logger already stored.
    pub fn init(&self, config: Config) -> Result<Arc<Logger>, InitError> {
        self.init_with(|| Logger::new(&config))
    }

    /// Initialize with a logger produced by `make`, which only runs if the
    /// cell is still empty.
    pub fn init_with<F>(&self, make: F) -> Result<Arc<Logger>, InitError>
    where
        F: FnOnce() -> Result<Logger, InitError>,
    {
        let _guard = match self.init_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = self.logger.get() {
            existing.warn("Logger already initialized, skipping re-initialization", &[]);
            return Ok(Arc::clone(existing));
        }

        let logger = Arc::new(make()?);
        // Still under `init_lock`, nothing else can have filled the cell.
        let _ = self.logger.set(Arc::clone(&logger));
        Ok(logger)
    }

    pub fn get(&self) -> Option<Arc<Logger>> {
        self.logger.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.logger.get().is_some()
    }
}

impl Default for LoggerCell {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LoggerCell = LoggerCell::new();
static FALLBACK: OnceLock<Arc<Logger>> = OnceLock::new();

/// Initialize the process-wide logger.
///
/// Calling this more than once has no effect beyond a warning record; the
/// first configuration stays active for the life of the process.
///
/// **Errors**
///
/// If a destination cannot be opened the process exits with status 1
/// after writing a `fatal` record to stderr. Use [`try_init`] to handle
/// the error instead.
pub fn init(config: Config) -> Arc<Logger> {
    match try_init(config) {
        Ok(logger) => logger,
        Err(e) => {
            report_init_failure(&e);
            std::process::exit(1)
        }
    }
}

/// Like [`init`], but returns the startup error to the caller.
pub fn try_init(config: Config) -> Result<Arc<Logger>, InitError> {
    GLOBAL.init(config)
}

/// The process-wide logger.
///
/// Before [`init`] succeeds this is a stderr logger at `trace` level with no
/// service or pod; it is never stored as the global one.
pub fn global() -> Arc<Logger> {
    if let Some(logger) = GLOBAL.get() {
        return logger;
    }
    Arc::clone(FALLBACK.get_or_init(|| Arc::new(Logger::stderr_fallback())))
}

pub fn is_initialized() -> bool {
    GLOBAL.is_initialized()
}

/// Install a global `tracing` subscriber that forwards every event to
/// `logger`.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`LoggerLayer`] as the global
/// default subscriber, so `tracing::info!` and friends anywhere in the
/// process end up in the same sinks as the logger's own calls.
pub fn init_tracing(logger: Arc<Logger>) -> Result<(), SetGlobalDefaultError> {
    let subscriber = Registry::default().with(LoggerLayer::new(logger));
    tracing::subscriber::set_global_default(subscriber)
}

fn report_init_failure(err: &InitError) {
    let record = LogRecord {
        timestamp: Utc::now(),
        level: Level::Fatal,
        service: String::new(),
        pod: String::new(),
        pid: std::process::id(),
        caller: None,
        message: "Failed to initialize logger".to_string(),
        fields: vec![("error".to_string(), Value::String(err.to_string()))],
        error: None,
    };
    match record.to_json_line() {
        Ok(line) => eprint!("{}", String::from_utf8_lossy(&line)),
        Err(_) => eprintln!("Failed to initialize logger: {}", err),
    }
}

macro_rules! global_leveled {
    ($($level:ident => $name:ident, $with_error:ident;)+) => {
        $(
            #[doc = concat!("Log at `", stringify!($name), "` level through the process-wide logger.")]
            #[track_caller]
            pub fn $name(message: &str, fields: &[Value]) {
                global().$name(message, fields);
            }

            #[doc = concat!("Log `err` at `", stringify!($name), "` level through the process-wide logger.")]
            #[track_caller]
            pub fn $with_error(err: &(dyn Error + 'static), fields: &[Value]) {
                global().$with_error(err, fields);
            }
        )+
    };
}

global_leveled! {
    Trace => trace, trace_with_error;
    Debug => debug, debug_with_error;
    Info => info, info_with_error;
    Warn => warn, warn_with_error;
    Error => error, error_with_error;
}

/// Log at `fatal` level through the process-wide logger, then exit(1).
#[track_caller]
pub fn fatal(message: &str, fields: &[Value]) -> ! {
    global().fatal(message, fields)
}

#[track_caller]
pub fn fatal_with_error(err: &(dyn Error + 'static), fields: &[Value]) -> ! {
    global().fatal_with_error(err, fields)
}

/// Log at `panic` level through the process-wide logger, then panic.
#[track_caller]
pub fn panic(message: &str, fields: &[Value]) -> ! {
    global().panic(message, fields)
}

#[track_caller]
pub fn panic_with_error(err: &(dyn Error + 'static), fields: &[Value]) -> ! {
    global().panic_with_error(err, fields)
}
