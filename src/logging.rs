//! Tracing setup.
//!
//! stderr always gets formatted output filtered by `RUST_LOG`. Setting
//! `ADVICE_LOG=1` adds a plain-text file sink at [`log_file`], which is what
//! to attach when a card's fit looks wrong: every refit is logged under the
//! `fit` and `board` targets at debug level.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "advice-board.log";

/// Flushes the file sink on drop. Hold it until the process exits.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset. With the file sink on,
/// the default is raised to `debug` so refits are recorded.
pub fn init(default_level: &str) -> LogGuard {
    let file_enabled = std::env::var("ADVICE_LOG").as_deref() == Ok("1");
    let level = if file_enabled { "debug" } else { default_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match file_enabled.then(log_file) {
        Some(path) => {
            let dir = path.parent().map(PathBuf::from).unwrap_or_default();
            let _ = std::fs::create_dir_all(&dir);
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE_NAME));
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    LogGuard { _file: guard }
}

/// Where the file sink writes: `$XDG_DATA_HOME/advice-board/`, else the
/// platform log directory under `$HOME`, else `/tmp`.
pub fn log_file() -> PathBuf {
    let dir = match std::env::var_os("XDG_DATA_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => match std::env::var_os("HOME") {
            Some(home) if cfg!(target_os = "macos") => PathBuf::from(home).join("Library").join("Logs"),
            Some(home) => PathBuf::from(home).join(".local").join("share"),
            None => PathBuf::from("/tmp"),
        },
    };
    dir.join("advice-board").join(LOG_FILE_NAME)
}
