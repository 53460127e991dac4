//! Logging setup for FleetWatch.
//!
//! Structured tracing output goes to two places at once: a session log
//! file under `logs/` (truncated at startup) and stdout for operators
//! tailing the process. Verbosity is controlled with the `RUST_LOG`
//! environment variable and defaults to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes buffered log lines and closes the file, so
/// hold it until the process exits.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber.
///
/// Creates `log_dir` if missing and truncates any previous session's file,
/// then installs a file layer and a stdout layer behind the `RUST_LOG`
/// filter.
///
/// # Errors
///
/// Returns an [`io::Error`] if the log directory cannot be created or the
/// log file cannot be truncated.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Truncate the previous session's log; rolling::never appends.
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default directory for log files.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Default session log filename.
pub fn default_log_file() -> &'static str {
    "fleetwatch.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = PathBuf::from(format!("test_logs_{tag}_{nanos}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_dir(), "logs");
        assert_eq!(default_log_file(), "fleetwatch.log");
    }

    #[test]
    fn test_truncates_previous_session_file() {
        let dir = scratch_dir("truncate");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("session.log");
        fs::write(&file, "stale lines from last run").unwrap();

        fs::write(&file, "").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_creates_nested_log_dir() {
        let dir = scratch_dir("nested").join("a/b");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("session.log");
        fs::write(&file, "").unwrap();
        assert!(file.exists());

        // Remove from the top of the scratch tree.
        let top = dir.ancestors().nth(2).unwrap().to_path_buf();
        fs::remove_dir_all(top).unwrap();
    }

    // init_logging itself installs a process-global subscriber and can run
    // only once, so its end-to-end behavior is exercised manually rather
    // than in unit tests.
}
