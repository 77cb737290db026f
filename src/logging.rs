//! Logging configuration with file output and a quiet console.
//!
//! Writes logs to `~/.config/lull/lull.log` (or platform equivalent).
//! The console only shows warnings so log lines do not bury the clock.
//! Set `DEBUG_LOGGING=1` to enable debug output for the lull crates on both.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Initialize logging with dual output (file + stderr).
///
/// Returns a `WorkerGuard` that must be held for the application lifetime
/// so buffered log lines are flushed on shutdown. Falls back to stderr-only
/// logging when the log directory cannot be used.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let Some(log_dir) = dirs::config_dir().map(|config| config.join("lull")) else {
        init_stderr_only(debug_logging);
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // Subscriber not installed yet
        eprintln!(
            "Failed to create log directory {:?}: {}, using stderr only",
            log_dir, e
        );
        init_stderr_only(debug_logging);
        return None;
    }

    let file_appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("lull")
        .filename_suffix("log")
        .build(&log_dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to open log file in {:?}: {}", log_dir, e);
            init_stderr_only(debug_logging);
            return None;
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(EnvFilter::new(filter_directive(debug_logging)));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer(debug_logging))
        .init();

    tracing::info!(log_dir = ?log_dir, debug_logging, "lull logging initialized");

    Some(guard)
}

fn filter_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        "info,lull=debug,lull_core=debug"
    } else {
        "info"
    }
}

fn stderr_layer<S>(debug_logging: bool) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let directive = if debug_logging {
        filter_directive(true)
    } else {
        "warn"
    };
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(EnvFilter::new(directive))
}

/// Fallback when file logging is unavailable
fn init_stderr_only(debug_logging: bool) {
    tracing_subscriber::registry()
        .with(stderr_layer(debug_logging))
        .init();

    tracing::info!(debug_logging, "lull logging initialized (stderr only)");
}
