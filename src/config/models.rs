use serde::Deserialize;

/// Flattened application configuration; the on-disk form is grouped into
/// tables (see `tables.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub dataset_path: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_level: LogLevel,
    pub preprocess_input: String,
    pub preprocess_output: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            dataset_path: crate::config::defaults::default_dataset_path(),
            host: crate::config::defaults::default_host(),
            port: crate::config::defaults::default_port(),
            workers: crate::config::defaults::default_workers(),
            log_level: crate::config::defaults::default_log_level(),
            preprocess_input: crate::config::defaults::default_preprocess_input(),
            preprocess_output: crate::config::defaults::default_preprocess_output(),
        }
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
