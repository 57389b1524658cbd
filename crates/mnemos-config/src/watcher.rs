//! Hot-reload of bindable members.
//!
//! A [`BindableWatcher`] watches the directory holding a configuration file
//! and, when the file is created or modified, runs a reconcile pass that
//! copies changed bindable values into the live instance.
//!
//! # Architecture
//!
//! The `notify` backend delivers events on its own thread. Matching events are
//! forwarded through an unbounded `tokio::sync::mpsc` channel to a dedicated
//! worker thread, which:
//! 1. Sleeps for the settle delay so the writer can finish
//! 2. Drains any events queued meanwhile (debounce)
//! 3. Runs the reconcile pass
//!
//! The parent directory is watched rather than the file itself so that
//! editors replacing the file by rename are still observed.
//!
//! Reconcile failures are logged and swallowed; the watcher keeps running
//! until [`stop`](BindableWatcher::stop) is called or it is dropped.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mnemos_core::{ConfigError, ConfigResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// The reconcile pass run after a file change. Returns the number of
/// bindable members that changed.
pub type Reconciler = Arc<dyn Fn() -> ConfigResult<usize> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Changed,
    Shutdown,
}

/// Background watcher owned by a file controller.
pub struct BindableWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    tx: mpsc::UnboundedSender<Signal>,
    stopped: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

impl BindableWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Watch`] if the OS watcher or the worker thread
    /// can't be started.
    pub fn spawn(path: &Path, settle_delay: Duration, reconcile: Reconciler) -> ConfigResult<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| ConfigError::watch(path, "path has no file name"))?;
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stopped = Arc::new(AtomicBool::new(false));

        let event_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if is_relevant(&event, &file_name) {
                    // Only fails once the worker is gone.
                    let _ = event_tx.send(Signal::Changed);
                }
            }
        })
        .map_err(|e| ConfigError::watch(&directory, e.to_string()))?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::watch(&directory, e.to_string()))?;

        let worker_stopped = Arc::clone(&stopped);
        let watched = path.to_path_buf();
        let worker = thread::Builder::new()
            .name("mnemos-watcher".to_string())
            .spawn(move || {
                while let Some(signal) = rx.blocking_recv() {
                    if signal == Signal::Shutdown {
                        break;
                    }
                    thread::sleep(settle_delay);
                    loop {
                        match rx.try_recv() {
                            Ok(Signal::Changed) => continue,
                            Ok(Signal::Shutdown) => return,
                            Err(_) => break,
                        }
                    }
                    if worker_stopped.load(Ordering::Acquire) {
                        break;
                    }
                    match reconcile() {
                        Ok(changed) => tracing::debug!(
                            path = %watched.display(),
                            changed,
                            "hot-reload pass finished"
                        ),
                        Err(e) => tracing::debug!(
                            path = %watched.display(),
                            error = %e,
                            "hot-reload pass failed"
                        ),
                    }
                }
            })
            .map_err(|e| ConfigError::watch(path, e.to_string()))?;

        tracing::debug!(path = %path.display(), "watching configuration file");
        Ok(Self {
            path: path.to_path_buf(),
            watcher: Some(watcher),
            tx,
            stopped,
            worker: Some(worker),
        })
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the worker is still running.
    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop watching and wait for the worker to exit.
    ///
    /// When called from the worker itself (a subscriber reacting to a
    /// hot-reload), the worker is detached instead of joined.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.watcher = None;
        let _ = self.tx.send(Signal::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
            tracing::debug!(path = %self.path.display(), "stopped watching configuration file");
        }
    }
}

impl Drop for BindableWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BindableWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindableWatcher")
            .field("path", &self.path)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
