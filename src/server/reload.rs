//! Catalog auto-reload
//!
//! Watches the directory holding `catalog.yaml` and swaps a fresh copy into
//! the shared [`Catalog`] when the file is written. The directory is watched
//! rather than the file because editors often replace files on save.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{Catalog, CatalogData};
use crate::error::{DemoError, Result};

/// Quiet period after the first event of a burst before reloading
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Live watcher; dropping it stops reloads
pub struct CatalogWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start watching `path` and reload `catalog` on change
///
/// # Errors
///
/// Returns [`DemoError::Watch`] if the watcher cannot be created or the
/// directory cannot be watched
pub fn watch_catalog(path: PathBuf, catalog: Catalog) -> Result<CatalogWatcher> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        Config::default(),
    )
    .map_err(DemoError::from)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(DemoError::from)?;
    tracing::info!("Watching {} for changes", path.display());

    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if !touches(&event, &path) {
                continue;
            }
            tokio::time::sleep(DEBOUNCE).await;
            while rx.try_recv().is_ok() {}
            reload_catalog(&path, &catalog).await;
        }
    });

    Ok(CatalogWatcher {
        _watcher: watcher,
        task,
    })
}

fn touches(event: &Event, path: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Re-read `path` into `catalog`
///
/// A file that cannot be read or fails validation is logged and the current
/// data stays live. Returns whether the catalog was replaced.
pub async fn reload_catalog(path: &Path, catalog: &Catalog) -> bool {
    let result = match CatalogData::load(path) {
        Ok(data) => catalog.replace(data).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!("Reloaded catalog from {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Ignoring catalog change in {}: {}", path.display(), e);
            false
        }
    }
}
