use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "forwarder.log";

/// Daily-rotated log file under `dir`, creating the directory if needed
pub fn open_log_appender(dir: &Path) -> Result<RollingFileAppender, String> {
    fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .map_err(|e| format!("cannot open log file in {}: {}", dir.display(), e))
}

/// Initializes the logging system with console output and, when the log
/// directory is writable, a JSON file. A read-only working directory only
/// costs the file layer.
pub fn init_logging() {
    let (file_layer, file_error) = match open_log_appender(Path::new(LOG_DIR)) {
        Ok(appender) => {
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(appender);
            // The guard flushes on drop; keep it for the life of the process
            std::mem::forget(guard);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), None)
        }
        Err(e) => (None, Some(e)),
    };

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("audit_forwarder=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled, console only: {}", e);
    }
}
