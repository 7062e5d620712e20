use std::fs;
use std::sync::Arc;

use ripple::configuration::logging::LoggingConfiguration;
use ripple::logging::initialize_logging;
use ripple::{Observable, WorkerPoolDispatcher};

// Installs the process-wide subscriber, so everything lives in one test.
#[test]
fn logs_are_written_to_the_configured_file() {
    let log_directory = std::env::temp_dir()
        .join(format!("ripple-logging-{}", std::process::id()));
    let log_file_path = log_directory.join("ripple.log");

    let configuration = LoggingConfiguration {
        level: "ripple=debug".to_string(),
        log_file_path: Some(log_file_path.clone()),
    };

    initialize_logging(&configuration).unwrap();

    let pool = Arc::new(WorkerPoolDispatcher::new(1).unwrap());
    let observable = Observable::with_dispatcher(0, pool.clone());
    let observer = observable.observe(|_| panic!("deliberate observer failure"));

    observable.set(1);
    pool.join().unwrap();
    observer.close();

    let contents = fs::read_to_string(&log_file_path).unwrap();
    fs::remove_dir_all(&log_directory).unwrap();

    assert!(contents.contains("Hello from ripple"));
    assert!(contents.contains("Observer registered."));
    assert!(contents.contains("Observer callback panicked"));
    assert!(contents.contains("deliberate observer failure"));
    assert!(contents.contains("Observer closed."));

    // The global subscriber can only be installed once.
    assert!(initialize_logging(&LoggingConfiguration::default()).is_err());
}
