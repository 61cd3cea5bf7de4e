//! Config file location and hot-reload.
//!
//! Watches `~/.config/advice-board/board.toml` and hands every successfully
//! parsed version to the event loop over a channel. A file that fails to
//! parse is logged and ignored; the board keeps its previous config.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::config::BoardConfig;

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/advice-board/`, else `$HOME/.config/advice-board/`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("advice-board");
        return p;
    }
    let mut p = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    p.push(".config");
    p.push("advice-board");
    p
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("board.toml")
}

/// Write `content` to `path` unless the file already exists.
pub fn ensure_default_config(path: &Path, content: &str) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

// ---------------------------------------------------------------------------
// Watcher
// ---------------------------------------------------------------------------

/// Keeps the notify watcher alive and exposes reloaded configs.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    rx: mpsc::Receiver<BoardConfig>,
}

impl ConfigWatcher {
    /// Watch the *parent directory* of `path`.
    ///
    /// Editors that save via rename would otherwise be missed.
    pub fn start(path: PathBuf) -> notify::Result<Self> {
        let target = path.file_name().map(|f| f.to_os_string());
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let (tx, rx) = mpsc::channel();
        let watched = path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(target: "config", "watch error: {e}");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            let affects_target = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|f| f.to_os_string()) == target);
            if !affects_target {
                return;
            }
            match BoardConfig::load(&watched) {
                Ok(config) => {
                    info!(target: "config", path = %watched.display(), "config reloaded");
                    let _ = tx.send(config);
                }
                Err(e) => warn!(target: "config", "ignoring config change: {e:#}"),
            }
        })?;

        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        Ok(Self {
            _watcher: watcher,
            path,
            rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest reloaded config since the last call, if any.
    pub fn poll(&self) -> Option<BoardConfig> {
        self.rx.try_iter().last()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_board_toml() {
        let path = default_config_path();
        assert!(path.ends_with("advice-board/board.toml"), "got {}", path.display());
    }

    #[test]
    fn ensure_default_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.toml");
        ensure_default_config(&path, "[grid]\ncolumns = 2\n").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("columns = 2"));
    }

    #[test]
    fn ensure_default_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "# user customized\n").unwrap();
        ensure_default_config(&path, "# default\n").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("user customized"));
    }

    #[test]
    fn default_config_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        ensure_default_config(&path, &BoardConfig::default().to_toml()).unwrap();
        assert_eq!(BoardConfig::load(&path).unwrap(), BoardConfig::default());
    }
}
