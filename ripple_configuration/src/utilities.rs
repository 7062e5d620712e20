use std::env::args;
use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};

/// Inspect the first command line argument to find out the directory the program resides in.
///
/// If the executable is running inside cargo's debug target directory (`./target/debug`)
/// and the grandparent directory contains `Cargo.toml`, the grandparent (project root)
/// is returned instead.
///
///  <project directory>
///  |-- target
///  |   |-- debug
///  |       |- <executable>
///  |- Cargo.toml
///  |- ...
pub fn get_running_executable_directory() -> Result<PathBuf> {
    let current_args = args()
        .next()
        .ok_or_else(|| miette!("Could not get first commandline argument!"))?;

    let executable_directory = dunce::canonicalize(current_args)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!("Could not canonicalize running executable path.")
        })?
        .parent()
        .ok_or_else(|| miette!("Could not get executable's directory."))?
        .to_path_buf();

    let is_named = |path: &Path, name: &str| {
        path.file_name()
            .map(|file_name| file_name.eq(name))
            .unwrap_or(false)
    };

    if is_named(&executable_directory, "debug") {
        if let Some(target_directory) = executable_directory.parent() {
            if is_named(target_directory, "target") {
                if let Some(project_directory) = target_directory.parent() {
                    if project_directory.join("Cargo.toml").exists() {
                        return Ok(project_directory.to_path_buf());
                    }
                }
            }
        }
    }

    Ok(executable_directory)
}

/// Returns the default configuration filepath: `./data/configuration.toml`
/// relative to the directory returned by [`get_running_executable_directory`].
pub fn get_default_configuration_file_path() -> Result<PathBuf> {
    let mut configuration_filepath = get_running_executable_directory()
        .wrap_err_with(|| miette!("Could not get the executable directory."))?;
    configuration_filepath.push("data");
    configuration_filepath.push("configuration.toml");

    if !configuration_filepath.exists() {
        return Err(miette!(
            "Could not find configuration.toml in data directory: {:?}",
            configuration_filepath
        ));
    }

    dunce::canonicalize(configuration_filepath)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!("Could not canonicalize the configuration.toml file path.")
        })
}
