use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

static SUBSCRIBER_INIT: std::sync::Once = std::sync::Once::new();

/// Default filter when RUST_LOG is unset
pub fn default_filter() -> String {
    format!("warn,{name}=info", name = env!("CARGO_CRATE_NAME"))
}

/// Send logs to `path`, appending. The terminal belongs to the UI, so nothing is
/// logged to stdout or stderr. Only the first call has any effect.
pub fn setup_logging(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    SUBSCRIBER_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

        let subscriber = FmtSubscriber::builder()
            .with_target(true)
            .with_ansi(false)
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("reflex: a global tracing subscriber was already set");
        }
    });
    Ok(())
}
