//! Structured JSON logging for services.
//!
//! Build a validated [`Config`], initialize a [`Logger`] from it once at
//! startup, then log through the logger (or the process-wide free
//! functions). Every record is one JSON line broadcast to all configured
//! destinations: stdout, an append-only file, and a TCP log collector.
//!
//! ```no_run
//! use svc_logger::{fields, Config};
//!
//! let config = Config::builder()
//!     .service_name("billing")
//!     .console(true)
//!     .log_level("debug")
//!     .build()
//!     .expect("valid logger config");
//! svc_logger::init(config);
//!
//! svc_logger::debug("starting", &fields!["port", "8080"]);
//! ```

pub mod config;
pub mod fields;
pub mod level;
pub mod record;
pub mod sink;
pub mod memory_sink;
pub mod logger;
pub mod layer;

pub mod init;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use fields::FieldsError;
pub use init::{
    debug, debug_with_error, error, error_with_error, fatal, fatal_with_error, global, info,
    info_with_error, init, init_tracing, is_initialized, panic, panic_with_error, trace,
    trace_with_error, try_init, warn, warn_with_error, LoggerCell,
};
pub use level::Level;
pub use logger::{InitError, Logger};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}
