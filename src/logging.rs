use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::settings::{config_dir, log_path};

/// Send tracing output to the log file; the terminal belongs to the
/// dashboard. If the file cannot be opened logging stays off.
pub fn init() {
    if std::fs::create_dir_all(config_dir()).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(log_path()) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}
