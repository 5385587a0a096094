use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use topic_sorter_core::AppConfig;

const DEFAULT_LOG_FILE: &str = "./logs/topic-sorter.log";

/// Split `LOG_FILE_PATH` into the appender's directory and file name.
fn log_file_location() -> (PathBuf, PathBuf) {
    let path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let path = Path::new(&path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("topic-sorter.log"));
    (dir, name)
}

/// Stdout plus file logging. Keep the returned guard alive for the whole run or the
/// file writer drops buffered lines.
///
/// The diagnostic log is separate from the JSON run log, which records what was moved.
pub fn init_logger(config: &AppConfig) -> impl Drop {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let (log_dir, log_name) = log_file_location();
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .with_target(false)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    info!(
        "Diagnostics in {}; sort decisions recorded in {}",
        log_dir.join(&log_name).display(),
        config.run_log_file
    );

    guard
}
