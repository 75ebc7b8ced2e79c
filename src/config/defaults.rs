pub(crate) const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

pub(crate) fn default_dataset_path() -> String {
    "processed_minif2f.jsonl".to_string()
}

pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_port() -> u16 {
    5000
}

pub(crate) fn default_workers() -> usize {
    1
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_preprocess_input() -> String {
    "minif2f_lean4.jsonl".to_string()
}

pub(crate) fn default_preprocess_output() -> String {
    "processed_minif2f.jsonl".to_string()
}
