//! Configuration loading for the dataset viewer.
//!
//! All tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! defaults so the viewer can still start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{apply_env_overrides, load_config};
pub use models::{AppConfig, LogLevel};
pub(crate) use defaults::DEFAULT_CONFIG_PATH;
