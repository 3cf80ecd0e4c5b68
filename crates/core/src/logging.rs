use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives checked before `RUST_LOG`.
pub const LOG_ENV: &str = "MARKSCOPE_LOG";

/// `~/.markscope/logs`, or `./.markscope/logs` without a home directory.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".markscope")
        .join("logs")
}

/// Install the global subscriber for one process.
///
/// Events go to a daily file under [`log_dir`] named after `component`
/// (`cli.log.2024-01-21`), and also to stderr when `to_stderr` is set. The
/// level comes from [`LOG_ENV`], then `RUST_LOG`, then `info`. A subscriber
/// installed earlier (by a host or a test harness) is left in place.
///
/// Keep the returned guard alive until exit, or buffered lines are lost.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    let log_dir = log_dir();
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(env_filter()).with(file_layer);

    if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        let _ = registry.with(stderr_layer).try_init();
    } else {
        let _ = registry.try_init();
    }

    guard
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_layout() {
        let dir = log_dir();
        assert!(dir.ends_with(".markscope/logs"));
    }
}
