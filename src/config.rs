use serde::{Deserialize, Serialize};

/// Validated logger configuration.
///
/// Describes where records go (stdout, an append-only file, a TCP log
/// collector) and the minimum severity to emit. A `Config` can only be
/// obtained through [`Config::build`] or [`ConfigBuilder::build`], so every
/// instance satisfies two rules:
///
/// - at least one destination is enabled (`console`, a non-empty
///   `log_file_path`, or `log_analyser_enabled`);
/// - at least one of `service_name` / `pod` is non-empty.
///
/// `log_level` is kept verbatim; unknown names are normalized to `info`
/// when the logger is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigBuilder")]
pub struct Config {
    service_name: String,
    pod: String,
    log_level: String,
    console: bool,
    log_file_path: String,
    log_analyser_address: String,
    log_analyser_enabled: bool,
}

/// Error returned when a configuration violates one of the rules above.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one logging option (console, log file, log analyser) must be selected")]
    NoDestination,

    #[error("service name or pod name must be provided")]
    NoIdentity,
}

impl Config {
    /// Validate and construct a configuration.
    ///
    /// Destinations are checked before identity, so a config missing both
    /// reports [`ConfigError::NoDestination`].
    pub fn build(
        service_name: impl Into<String>,
        pod: impl Into<String>,
        console: bool,
        log_file_path: impl Into<String>,
        log_analyser_address: impl Into<String>,
        log_analyser_enabled: bool,
        log_level: impl Into<String>,
    ) -> Result<Config, ConfigError> {
        let config = Config {
            service_name: service_name.into(),
            pod: pod.into(),
            log_level: log_level.into(),
            console,
            log_file_path: log_file_path.into(),
            log_analyser_address: log_analyser_address.into(),
            log_analyser_enabled,
        };

        if !config.console && config.log_file_path.is_empty() && !config.log_analyser_enabled {
            return Err(ConfigError::NoDestination);
        }
        if config.service_name.is_empty() && config.pod.is_empty() {
            return Err(ConfigError::NoIdentity);
        }

        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn pod(&self) -> &str {
        &self.pod
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn console(&self) -> bool {
        self.console
    }

    /// Target file, if file output is enabled.
    pub fn log_file_path(&self) -> Option<&str> {
        if self.log_file_path.is_empty() {
            None
        } else {
            Some(&self.log_file_path)
        }
    }

    pub fn log_analyser_address(&self) -> &str {
        &self.log_analyser_address
    }

    pub fn log_analyser_enabled(&self) -> bool {
        self.log_analyser_enabled
    }
}

/// Fluent, unvalidated form of [`Config`].
///
/// Also the serde representation of `Config`, so configuration loaded from
/// a file goes through the same validation as code-built configuration.
///
/// ```
/// use svc_logger::config::Config;
///
/// let config = Config::builder()
///     .service_name("billing")
///     .console(true)
///     .log_level("debug")
///     .build()
///     .unwrap();
/// assert_eq!(config.service_name(), "billing");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigBuilder {
    pub service_name: String,
    pub pod: String,
    pub log_level: String,
    pub console: bool,
    pub log_file_path: String,
    pub log_analyser_address: String,
    pub log_analyser_enabled: bool,
}

impl ConfigBuilder {
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn pod(mut self, pod: impl Into<String>) -> Self {
        self.pod = pod.into();
        self
    }

    pub fn log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    pub fn console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn log_file_path(mut self, path: impl Into<String>) -> Self {
        self.log_file_path = path.into();
        self
    }

    /// Enable the remote collector sink at `address` (`host:port`).
    pub fn log_analyser(mut self, address: impl Into<String>) -> Self {
        self.log_analyser_address = address.into();
        self.log_analyser_enabled = true;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        Config::build(
            self.service_name,
            self.pod,
            self.console,
            self.log_file_path,
            self.log_analyser_address,
            self.log_analyser_enabled,
            self.log_level,
        )
    }
}

impl TryFrom<ConfigBuilder> for Config {
    type Error = ConfigError;

    fn try_from(builder: ConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_config_without_destination() {
        for (service, pod) in [("svc", ""), ("", "pod-1"), ("svc", "pod-1")] {
            let err = Config::build(service, pod, false, "", "127.0.0.1:5000", false, "info").unwrap_err();
            assert_eq!(err, ConfigError::NoDestination);
        }
    }

    #[test]
    fn rejects_config_without_identity() {
        let destinations = [
            (true, "", false),
            (false, "/tmp/svc.log", false),
            (false, "", true),
            (true, "/tmp/svc.log", true),
        ];
        for (console, file, remote) in destinations {
            let err = Config::build("", "", console, file, "127.0.0.1:5000", remote, "info").unwrap_err();
            assert_eq!(err, ConfigError::NoIdentity);
        }
    }

    #[test]
    fn destination_is_checked_before_identity() {
        let err = Config::build("", "", false, "", "", false, "info").unwrap_err();
        assert_eq!(err, ConfigError::NoDestination);
    }

    #[test]
    fn accepts_pod_without_service_name() {
        let config = Config::build("", "pod-7", true, "", "", false, "warn").unwrap();
        assert_eq!(config.pod(), "pod-7");
        assert_eq!(config.service_name(), "");
        assert!(config.console());
    }

    #[test]
    fn keeps_log_level_verbatim() {
        let config = Config::build("svc", "", true, "", "", false, "Verbose").unwrap();
        assert_eq!(config.log_level(), "Verbose");
    }

    #[test]
    fn empty_file_path_means_no_file_sink() {
        let config = Config::build("svc", "", true, "", "", false, "info").unwrap();
        assert_eq!(config.log_file_path(), None);

        let config = Config::build("svc", "", false, "/var/log/svc.log", "", false, "info").unwrap();
        assert_eq!(config.log_file_path(), Some("/var/log/svc.log"));
    }

    #[test]
    fn builder_enables_analyser_with_address() {
        let config = Config::builder()
            .pod("pod-1")
            .log_analyser("collector:5044")
            .build()
            .unwrap();
        assert!(config.log_analyser_enabled());
        assert_eq!(config.log_analyser_address(), "collector:5044");
    }

    #[test]
    fn deserialize_runs_validation() {
        let ok: Config = serde_json::from_str(r#"{"service_name":"svc","console":true,"log_level":"debug"}"#).unwrap();
        assert_eq!(ok.log_level(), "debug");

        let err = serde_json::from_str::<Config>(r#"{"service_name":"svc"}"#).unwrap_err();
        assert!(err.to_string().contains("at least one logging option"));
    }
}
