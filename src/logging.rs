use std::env::args;
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use miette::{miette, Context, IntoDiagnostic, Result};
use ripple_configuration::logging::LoggingConfiguration;
use tracing_subscriber::EnvFilter;

pub const RIPPLE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global `tracing` subscriber described by the logging configuration.
///
/// Events are filtered by `configuration.level` (an `EnvFilter` directive) and
/// written to stderr, or appended to `configuration.log_file_path` if set.
///
/// Fails if the filter directive is invalid, if the log file cannot be prepared,
/// or if a global subscriber has already been installed.
pub fn initialize_logging(configuration: &LoggingConfiguration) -> Result<()> {
    let filter = EnvFilter::try_new(&configuration.level)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!("Invalid logging level directive: {:?}", configuration.level)
        })?;

    let install_result = match &configuration.log_file_path {
        Some(log_file_path) => {
            let log_file = initialize_log_file_for_log_output(log_file_path)?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
    };

    install_result.map_err(|error| {
        miette!("Could not install the global tracing subscriber: {error}")
    })
}

/// Prepares the log file for log output.
/// This involves opening the file for writing (creating it and its parent
/// directories if necessary). An existing file is opened in append mode.
///
/// A small invocation header is written to the log file before the writer
/// handle is returned.
pub fn initialize_log_file_for_log_output(
    log_output_file_path: &Path,
) -> Result<LineWriter<File>> {
    if let Some(log_output_directory_path) = log_output_file_path.parent() {
        if log_output_directory_path.exists()
            && !log_output_directory_path.is_dir()
        {
            return Err(miette!("Invalid log file path: parent directory path is actually not a directory."));
        }

        if !log_output_directory_path.as_os_str().is_empty()
            && !log_output_directory_path.exists()
        {
            fs::create_dir_all(log_output_directory_path)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!("Failed to create log file parent directory.")
                })?;
        }
    }

    let output_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_output_file_path)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!(
                "Failed to open log output file for appending: {:?}",
                log_output_file_path
            )
        })?;

    let mut line_writer = LineWriter::new(output_file);

    let formatted_time_now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    writeln!(
        line_writer,
        "{} Hello from ripple {}. Started with arguments: {:?}",
        formatted_time_now,
        RIPPLE_VERSION,
        args().collect::<Vec<_>>()
    )
    .into_diagnostic()
    .wrap_err_with(|| miette!("Could not write invocation header to file."))?;

    Ok(line_writer)
}
