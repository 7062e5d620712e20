//! Module containing the entire configuration structure for `ripple`.

pub mod buffer;
pub mod dispatch;
pub mod logging;

use std::fs;
use std::path::PathBuf;

use miette::{miette, Context, Result};
use serde::Deserialize;

use crate::buffer::{BufferConfiguration, UnresolvedBufferConfiguration};
use crate::dispatch::{
    DispatchConfiguration,
    UnresolvedDispatchConfiguration,
};
use crate::error::ConfigurationError;
use crate::logging::{LoggingConfiguration, UnresolvedLoggingConfiguration};
use crate::traits::{
    ResolvableConfiguration,
    ResolvableWithContextConfiguration,
};
use crate::utilities::get_default_configuration_file_path;

/// This struct contains the entire `ripple` configuration:
/// circular buffer defaults, the notification dispatch strategy and logging.
///
/// Every table and key is optional; missing values fall back to the defaults
/// (see [`Configuration::default`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    pub buffer: BufferConfiguration,

    pub dispatch: DispatchConfiguration,

    pub logging: LoggingConfiguration,

    /// `None` if the configuration was not loaded from a file.
    pub configuration_file_path: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
struct UnresolvedConfiguration {
    buffer: UnresolvedBufferConfiguration,

    dispatch: UnresolvedDispatchConfiguration,

    logging: UnresolvedLoggingConfiguration,
}

impl Configuration {
    pub fn load_from_path<S: Into<PathBuf>>(
        configuration_filepath: S,
    ) -> Result<Configuration> {
        let configuration_filepath = configuration_filepath.into();

        let configuration_string = fs::read_to_string(&configuration_filepath)
            .map_err(|error| ConfigurationError::FileLoadError {
                file_path: configuration_filepath.clone(),
                error,
            })?;

        let unresolved_configuration = parse_unresolved(
            &configuration_string,
            &configuration_filepath.to_string_lossy(),
        )?;

        let configuration_file_path =
            dunce::canonicalize(&configuration_filepath).map_err(|error| {
                ConfigurationError::FileLoadError {
                    file_path: configuration_filepath.clone(),
                    error,
                }
            })?;

        unresolved_configuration
            .resolve(Some(configuration_file_path))
            .wrap_err_with(|| {
                miette!(
                    "Invalid configuration file: {:?}",
                    configuration_filepath
                )
            })
    }

    /// Parse and resolve a configuration from an in-memory TOML string.
    pub fn load_from_str<S: AsRef<str>>(
        configuration_string: S,
    ) -> Result<Configuration> {
        parse_unresolved(configuration_string.as_ref(), "<string>")?
            .resolve(None)
    }

    pub fn load_default_path() -> Result<Configuration> {
        Configuration::load_from_path(
            get_default_configuration_file_path().wrap_err_with(|| {
                miette!("Could not get default configuration file path.")
            })?,
        )
    }
}

fn parse_unresolved(
    configuration_string: &str,
    source_name: &str,
) -> Result<UnresolvedConfiguration> {
    toml::from_str(configuration_string).map_err(|error| {
        ConfigurationError::FileFormatError {
            source_name: source_name.to_string(),
            error: Box::new(error),
        }
        .into()
    })
}

impl ResolvableWithContextConfiguration for UnresolvedConfiguration {
    type Resolved = Configuration;
    type Context = Option<PathBuf>;

    fn resolve(
        self,
        configuration_file_path: Option<PathBuf>,
    ) -> Result<Self::Resolved> {
        let buffer = self.buffer.resolve()?;
        let dispatch = self.dispatch.resolve()?;
        let logging = self.logging.resolve()?;

        Ok(Configuration {
            buffer,
            dispatch,
            logging,
            configuration_file_path,
        })
    }
}
