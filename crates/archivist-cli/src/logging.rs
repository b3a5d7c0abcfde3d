use std::env;
use std::io::IsTerminal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/archivist.log";

/// Console output goes to stderr; stdout is reserved for JSON results.
/// Setting `LOG_FILE_PATH` to an empty string turns the file layer off.
pub fn init_logger() -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (file_layer, guard) = if log_file_path.trim().is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::never("./", &log_file_path);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_target(false)
            .with_ansi(false);
        (Some(layer), Some(guard))
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .pretty()
        .with_file(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(filter_layer)
        .init();

    let file_target = if guard.is_some() { log_file_path.as_str() } else { "off" };
    info!(level = %filter, file = file_target, "Logging initialised");

    guard
}
