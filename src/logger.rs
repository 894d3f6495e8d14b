use std::{path::Path, sync::OnceLock};
use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging once for the whole process, writing to `path`.
/// `RUST_LOG` overrides `filter` (e.g. `search=debug,perft=trace`).
pub fn init_logging<P: AsRef<Path>>(path: P, filter: &str) {
    INIT.get_or_init(|| {
        let path = path.as_ref();

        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open log file");

        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        // the guard must outlive the process or buffered lines are lost
        let _ = GUARD.set(guard);

        let env_filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
        };

        let subscriber = fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking)
            .finish();

        // idempotent under tests that race to install a subscriber
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
