use std::path::PathBuf;

use chrono::Local;
use miette::{miette, Context};
use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::traits::ResolvableConfiguration;
use crate::utilities::get_running_executable_directory;

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfiguration {
    /// A `tracing` filter directive, e.g. `info` or `ripple=debug,warn`.
    pub level: String,

    /// If set, logs are appended to this file instead of being printed to stderr.
    /// The `{SELF}` and `{DATETIME}` placeholders have already been replaced.
    pub log_file_path: Option<PathBuf>,
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            log_file_path: None,
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub(crate) struct UnresolvedLoggingConfiguration {
    level: Option<String>,

    log_file_path: Option<String>,
}

impl ResolvableConfiguration for UnresolvedLoggingConfiguration {
    type Resolved = LoggingConfiguration;

    fn resolve(self) -> miette::Result<Self::Resolved> {
        let level = self
            .level
            .map(|level| level.trim().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        if level.is_empty() {
            return Err(ConfigurationError::InvalidValue {
                key: "logging.level",
                reason: "the filter directive is empty".to_string(),
            }
            .into());
        }

        let log_file_path = match self.log_file_path {
            Some(raw_path) => Some(resolve_log_file_path(&raw_path)?),
            None => None,
        };

        Ok(LoggingConfiguration {
            level,
            log_file_path,
        })
    }
}

fn resolve_log_file_path(raw_path: &str) -> miette::Result<PathBuf> {
    let mut path_as_string = raw_path.to_string();

    if path_as_string.contains("{SELF}") {
        let executable_directory = get_running_executable_directory()
            .wrap_err_with(|| {
                miette!("Could not resolve {{SELF}} in logging.log_file_path.")
            })?
            .to_string_lossy()
            .to_string();

        path_as_string = path_as_string.replace("{SELF}", &executable_directory);
    }

    if path_as_string.contains("{DATETIME}") {
        let formatted_time_now = Local::now().format("%Y-%m-%d_%H-%M-%S");

        path_as_string = path_as_string
            .replace("{DATETIME}", &formatted_time_now.to_string());
    }

    Ok(PathBuf::from(path_as_string))
}
