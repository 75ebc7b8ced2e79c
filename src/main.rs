//! Entry point for the dataset viewer.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load configuration from `conf/config.toml` (or `--config PATH`).
//! - Either derive the intermediate dataset file, or load the dataset once and
//!   serve it.

mod config;
mod dataset;
mod errors;
mod normalizer;
mod preprocess;
mod render;
mod server;

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH, apply_env_overrides, load_config};
use crate::dataset::load_dataset;
use crate::preprocess::process_file;
use crate::render::RenderedPage;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str =
    "Usage: minif2f-viewer [--config PATH] [serve | process [INPUT] [OUTPUT]]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Serve,
    Process {
        input: Option<PathBuf>,
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    config_path: PathBuf,
    command: Command,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = apply_env_overrides(load_config(&args.config_path), |key| env::var(key).ok());
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %args.config_path.display(),
        level = %config.log_level,
        "Starting dataset viewer"
    );

    match args.command {
        Command::Process { input, output } => {
            let input = input.unwrap_or_else(|| PathBuf::from(&config.preprocess_input));
            let output = output.unwrap_or_else(|| PathBuf::from(&config.preprocess_output));
            process_file(&input, &output)?;
            Ok(())
        }
        Command::Serve => serve(&config),
    }
}

fn serve(config: &AppConfig) -> Result<()> {
    let dataset = load_dataset(Path::new(&config.dataset_path))?;
    if dataset.is_empty() {
        warn!(path = %config.dataset_path, "Dataset is empty; serving an empty page");
    }
    let page = Arc::new(RenderedPage::new(&dataset).context("Failed to render index page")?);
    info!(
        records = dataset.len(),
        bytes = page.body().len(),
        etag = %page.etag(),
        "Rendered index page"
    );

    actix_web::rt::System::new().block_on(server::serve(config, page))
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut positional = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
                config_path = PathBuf::from(path);
            }
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("serve") => Command::Serve,
        Some("process") => Command::Process {
            input: positional.next().map(PathBuf::from),
            output: positional.next().map(PathBuf::from),
        },
        Some(other) => return Err(anyhow!("Unknown command `{other}`\n{USAGE}")),
    };
    if let Some(extra) = positional.next() {
        return Err(anyhow!("Unexpected argument `{extra}`\n{USAGE}"));
    }

    Ok(Args {
        config_path,
        command,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_serve() {
        let parsed = args(&[]).expect("no args");
        assert_eq!(parsed.command, Command::Serve);
        assert_eq!(parsed.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn process_takes_optional_paths() {
        let parsed = args(&["--config", "alt.toml", "process", "raw.jsonl"]).expect("process");
        assert_eq!(parsed.config_path, PathBuf::from("alt.toml"));
        assert_eq!(
            parsed.command,
            Command::Process {
                input: Some(PathBuf::from("raw.jsonl")),
                output: None,
            }
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(args(&["render"]).is_err());
        assert!(args(&["serve", "extra"]).is_err());
        assert!(args(&["--config"]).is_err());
    }
}
