use crate::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Error attached to a record by the `*_with_error` calls.
#[derive(Debug, Clone)]
pub struct AttachedError {
    pub message: String,
    /// Messages of the `source()` chain, outermost first.
    pub chain: Vec<String>,
    pub stack: String,
}

/// One log call, serialized as a single JSON line and then dropped.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub service: String,
    pub pod: String,
    pub pid: u32,
    pub caller: Option<String>,
    pub message: String,
    pub fields: Vec<(String, Value)>,
    pub error: Option<AttachedError>,
}

impl LogRecord {
    /// Serialize to compact JSON terminated by `\n`.
    pub fn to_json_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

// Hand-written so keys come out in a fixed order and caller fields keep the
// order they were passed in.
impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("time", &self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("service", &self.service)?;
        map.serialize_entry("pod", &self.pod)?;
        map.serialize_entry("pid", &self.pid)?;
        if let Some(caller) = &self.caller {
            map.serialize_entry("caller", caller)?;
        }
        map.serialize_entry("message", &self.message)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(error) = &self.error {
            map.serialize_entry("error", &error.message)?;
            if !error.chain.is_empty() {
                map.serialize_entry("error_chain", &error.chain)?;
            }
            map.serialize_entry("stack", &error.stack)?;
        }
        map.end()
    }
}
