//! File change notifications using the notify crate.
//!
//! The reader polls at end-of-file; a `ChangeWatcher` only lets it wake up
//! before the poll interval is over when the file is written to.

use crate::error::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Watches the parent directory of one file for changes to that file.
pub(crate) struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: String,
}

impl ChangeWatcher {
    /// Creates a watcher and starts watching the directory containing `path`.
    pub(crate) fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref();

        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&watch_dir(file_path), RecursiveMode::NonRecursive)?;

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name,
        })
    }

    /// Waits until the watched file changes or `max_wait` elapses.
    pub(crate) async fn wait_for_change(&mut self, max_wait: Duration) {
        let deadline = tokio::time::sleep(max_wait);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return,
                event = self.receiver.recv() => match event {
                    Some(Ok(event)) if is_event_relevant_to_file(&event, &self.file_name) => {
                        self.drain_pending();
                        return;
                    }
                    Some(_) => continue,
                    None => {
                        // Watcher thread is gone; fall back to the plain back-off.
                        (&mut deadline).await;
                        return;
                    }
                },
            }
        }
    }

    // Coalesce a burst of writes into a single wake-up.
    fn drain_pending(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Directory to watch for `path`; a bare file name lives in the current directory.
fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check if a notify event is relevant to a specific file
pub(crate) fn is_event_relevant_to_file(event: &Event, target_file_name: &str) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy() == target_file_name)
            .unwrap_or(false)
    })
}
