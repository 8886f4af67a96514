//! Filesystem change notifications with a polling fallback.
//!
//! Each root gets exactly one active strategy: a recursive notify watch
//! when registration succeeds, or a periodic rescan timer when it fails
//! (unsupported filesystem, missing directory, watch limits). Either way
//! the output is the same coarse signal: "rescan this root".

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecursiveMode},
    DebounceEventResult,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::discovery;

/// Debounce window for bursts of notify events.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Default interval for the polling fallback.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Request to rescan one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTrigger {
    pub root: PathBuf,
}

/// Strategy in effect for a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStrategy {
    Notify,
    Poll,
}

/// Per-root change detection feeding scan triggers into the watch service.
///
/// Notify watchers and poll timers both live in background tasks tied to
/// the cancellation token; cancelling it stops event delivery.
pub struct ChangeNotifier {
    strategies: Vec<(PathBuf, WatchStrategy)>,
}

impl ChangeNotifier {
    /// Set up change detection for every root.
    #[must_use]
    pub fn spawn(
        roots: &[PathBuf],
        trigger_tx: &mpsc::UnboundedSender<ScanTrigger>,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Self {
        let mut strategies = Vec::new();

        for root in roots {
            match Self::watch_root(root, trigger_tx.clone(), cancel.clone()) {
                Ok(()) => {
                    tracing::debug!(root = %root.display(), "Watching root for filesystem events");
                    strategies.push((root.clone(), WatchStrategy::Notify));
                }
                Err(error) => {
                    tracing::info!(
                        root = %root.display(),
                        %error,
                        "Filesystem notifications unavailable, falling back to polling"
                    );
                    Self::spawn_poll_task(
                        root.clone(),
                        trigger_tx.clone(),
                        poll_interval,
                        cancel.clone(),
                    );
                    strategies.push((root.clone(), WatchStrategy::Poll));
                }
            }
        }

        Self { strategies }
    }

    /// The strategy chosen for a root, if it is managed by this notifier.
    #[must_use]
    pub fn strategy(&self, root: &Path) -> Option<WatchStrategy> {
        self.strategies
            .iter()
            .find(|(candidate, _)| candidate == root)
            .map(|(_, strategy)| *strategy)
    }

    /// Register a recursive notify watch on `root`. The debouncer is parked
    /// in a task that keeps it alive until cancellation.
    fn watch_root(
        root: &Path,
        trigger_tx: mpsc::UnboundedSender<ScanTrigger>,
        cancel: CancellationToken,
    ) -> Result<(), notify::Error> {
        let trigger_root = root.to_path_buf();
        let mut debouncer = new_debouncer(
            DEBOUNCE_WINDOW,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let relevant = events.iter().any(|event| {
                        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                            && event.paths.iter().any(|path| discovery::is_session_log(path))
                    });
                    if relevant {
                        let _ = trigger_tx.send(ScanTrigger {
                            root: trigger_root.clone(),
                        });
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(%error, "File watcher error");
                    }
                }
            },
        )?;

        debouncer.watch(root, RecursiveMode::Recursive)?;

        tokio::spawn(async move {
            cancel.cancelled().await;
            drop(debouncer);
        });

        Ok(())
    }

    fn spawn_poll_task(
        root: PathBuf,
        trigger_tx: mpsc::UnboundedSender<ScanTrigger>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if trigger_tx.send(ScanTrigger { root: root.clone() }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}
