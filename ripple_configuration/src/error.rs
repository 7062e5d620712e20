use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigurationError {
    #[error("Failed to load configuration file \"{}\".", .file_path.display())]
    FileLoadError {
        file_path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error(
        "Failed to parse configuration \
        \"{source_name}\" as TOML: {error}."
    )]
    FileFormatError {
        source_name: String,
        error: Box<toml::de::Error>,
    },

    #[error("Invalid value for `{key}`: {reason}.")]
    #[diagnostic(help("see data/configuration.toml for the accepted values"))]
    InvalidValue { key: &'static str, reason: String },
}
