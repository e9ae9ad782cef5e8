use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file for this run, named after the local start time.
fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{}.log", stamp))
}

/// Install the global subscriber: env-filtered stderr output, plus a plain
/// copy in `dir` when configured. Returns the log file path if any.
pub fn init(dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let (file_layer, path) = match dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {:?}", dir))?;
            let path = log_file_path(dir);
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(path)
}
