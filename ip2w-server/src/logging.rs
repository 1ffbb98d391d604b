use ip2w_core::{ConfigError, config::LoggingConfig};
use std::{
    fs::{File, OpenOptions},
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// A broken `[logging]` section still leaves a stderr subscriber in place;
/// the error is returned so the caller can refuse requests with it.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    let builder = tracing_subscriber::fmt();

    let (installed, outcome) = match prepare(config) {
        Ok((filter, Some(file))) => (
            builder
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init(),
            Ok(()),
        ),
        Ok((filter, None)) => {
            (builder.with_env_filter(filter).with_writer(std::io::stderr).try_init(), Ok(()))
        }
        Err(err) => {
            let filter = EnvFilter::new(LevelFilter::INFO.to_string());
            (builder.with_env_filter(filter).with_writer(std::io::stderr).try_init(), Err(err))
        }
    };

    if let Err(err) = installed {
        eprintln!("ip2w: could not install log subscriber: {err}");
    }
    outcome
}

/// Resolve the filter and open the log file without touching global state.
fn prepare(config: &LoggingConfig) -> Result<(EnvFilter, Option<File>), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = level_directive(&config.level)?;
            EnvFilter::try_new(&directive).map_err(|source| ConfigError::Logging {
                message: format!("invalid logging level '{}'", config.level),
                source: source.into(),
            })?
        }
    };

    let file = match &config.filename {
        Some(path) => Some(
            OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
                ConfigError::Logging {
                    message: format!("failed to open log file {}", path.display()),
                    source: source.into(),
                }
            })?,
        ),
        None => None,
    };

    Ok((filter, file))
}

/// Turn a configured level into a filter directive.
///
/// Bare words must name a level; `WARNING`, `CRITICAL`, `FATAL` and `NOTSET`
/// are accepted as aliases. Anything with `=`, `,` or `[` is passed through.
fn level_directive(level: &str) -> Result<String, ConfigError> {
    let level = level.trim();
    if level.contains(['=', ',', '[']) {
        return Ok(level.to_string());
    }

    let mapped = match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        other => other.to_string(),
    };

    mapped.parse::<LevelFilter>().map(|_| mapped).map_err(|source| ConfigError::Logging {
        message: format!("unknown logging level '{level}'"),
        source: source.into(),
    })
}
