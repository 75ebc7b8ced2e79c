use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    dataset: DatasetConfig,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    preprocess: PreprocessConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            dataset_path: tables.dataset.path,
            host: tables.server.host,
            port: tables.server.port,
            workers: tables.server.workers,
            log_level: tables.logging.log_level,
            preprocess_input: tables.preprocess.input,
            preprocess_output: tables.preprocess.output,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatasetConfig {
    #[serde(default = "defaults::default_dataset_path")]
    path: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            path: defaults::default_dataset_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
    #[serde(default = "defaults::default_host")]
    host: String,
    #[serde(default = "defaults::default_port")]
    port: u16,
    #[serde(default = "defaults::default_workers")]
    workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: defaults::default_host(),
            port: defaults::default_port(),
            workers: defaults::default_workers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PreprocessConfig {
    #[serde(default = "defaults::default_preprocess_input")]
    input: String,
    #[serde(default = "defaults::default_preprocess_output")]
    output: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            input: defaults::default_preprocess_input(),
            output: defaults::default_preprocess_output(),
        }
    }
}
