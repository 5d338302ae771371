use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Initialize process-wide logging once. Writes to stderr (never stdout — stdout is the UCI
/// wire) unless `log_file` names a path, in which case output goes there instead.
///
/// Level is controlled by `RUST_LOG`, defaulting to `info`.
pub fn init(log_file: Option<&str>) {
    INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = fmt().with_env_filter(env_filter).with_target(true);

        match log_file {
            Some(path) => {
                if let Some(dir) = std::path::Path::new(path).parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .expect("open log file");
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = GUARD.set(guard);
                let _ = builder.with_ansi(false).with_writer(non_blocking).try_init();
            }
            None => {
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        }
    });
}
