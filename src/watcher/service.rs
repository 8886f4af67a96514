//! Watch service: the single writer feeding the store.
//!
//! Discovery, tailing, reconstruction, and store mutation all run on one
//! loop. Triggers queued while a pass is in flight are drained into a
//! single follow-up pass, so no file ever has two overlapping tail passes
//! racing its offset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::store::LogStore;

use super::discovery::{self, DiscoveredLog};
use super::entry::{self, LogEvent};
use super::notifier::ScanTrigger;
use super::tailer::FileTailer;

/// Discovery-to-store pipeline for a set of root directories.
pub struct WatchService {
    roots: Vec<PathBuf>,
    store: Arc<LogStore>,
    tailers: HashMap<PathBuf, FileTailer>,
    trigger_rx: mpsc::UnboundedReceiver<ScanTrigger>,
    watched_files: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl WatchService {
    #[must_use]
    pub fn new(
        roots: Vec<PathBuf>,
        store: Arc<LogStore>,
        trigger_rx: mpsc::UnboundedReceiver<ScanTrigger>,
        watched_files: Arc<AtomicUsize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            roots,
            store,
            tailers: HashMap::new(),
            trigger_rx,
            watched_files,
            cancel,
        }
    }

    /// Run until cancelled: one initial pass over every root, then a pass
    /// per (coalesced) trigger batch.
    pub async fn run(mut self) {
        for root in self.roots.clone() {
            self.scan_root(&root).await;
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                trigger = self.trigger_rx.recv() => {
                    let Some(trigger) = trigger else { break };
                    let mut roots = vec![trigger.root];
                    while let Ok(next) = self.trigger_rx.try_recv() {
                        if !roots.contains(&next.root) {
                            roots.push(next.root);
                        }
                    }
                    for root in &roots {
                        self.scan_root(root).await;
                    }
                }
            }
        }
        tracing::debug!("Watch service stopped");
    }

    /// One discovery pass: register new files at offset zero (full read),
    /// tail known files whose size moved past the consumed offset.
    async fn scan_root(&mut self, root: &Path) {
        for log in discovery::collect_session_logs(root) {
            if let Some(tailer) = self.tailers.get(&log.path) {
                // Equal size means nothing new. Smaller means the file was
                // truncated; the tailer resolves that by restarting.
                if log.len == tailer.offset() {
                    continue;
                }
            } else {
                tracing::debug!(
                    path = %log.path.display(),
                    session_id = %log.session_id,
                    "Tracking new session log"
                );
            }
            self.tail_file(&log).await;
        }
        self.watched_files.store(self.tailers.len(), Ordering::Relaxed);
    }

    async fn tail_file(&mut self, log: &DiscoveredLog) {
        let tailer = self
            .tailers
            .entry(log.path.clone())
            .or_insert_with(|| FileTailer::new(log.path.clone()));

        let lines = match tailer.read_new_lines().await {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(
                    path = %log.path.display(),
                    %error,
                    "Tail pass failed, will retry on next change"
                );
                return;
            }
        };

        for line in lines {
            match entry::reconstruct(&line, &log.session_id) {
                Some(LogEvent::Console(record)) => self.store.append_console(record).await,
                Some(LogEvent::Network { update, session_id }) => {
                    self.store.upsert_network(update, session_id.as_deref()).await;
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service_for(
        root: &Path,
        store: &Arc<LogStore>,
    ) -> (
        WatchService,
        mpsc::UnboundedSender<ScanTrigger>,
        CancellationToken,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let service = WatchService::new(
            vec![root.to_path_buf()],
            Arc::clone(store),
            rx,
            Arc::new(AtomicUsize::new(0)),
            cancel.clone(),
        );
        (service, tx, cancel)
    }

    #[tokio::test]
    async fn test_initial_pass_reads_existing_file_in_full() {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join("session-boot.jsonl"),
            "{\"type\":\"console\",\"content\":\"a\"}\n{\"type\":\"console\",\"content\":\"b\"}\n",
        )
        .unwrap();

        let store = Arc::new(LogStore::new());
        let (service, _tx, cancel) = service_for(root.path(), &store);
        let task = tokio::spawn(service.run());

        for _ in 0..50 {
            if store.console_len().await == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let snapshot = store.console_snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].content, "a");
        assert_eq!(snapshot[0].session_id.as_deref(), Some("boot"));

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_picks_up_appended_lines_once() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("session-x.jsonl");
        std::fs::write(&path, "{\"type\":\"console\",\"content\":\"one\"}\n").unwrap();

        let store = Arc::new(LogStore::new());
        let (service, tx, cancel) = service_for(root.path(), &store);
        let task = tokio::spawn(service.run());

        for _ in 0..50 {
            if store.console_len().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // Redundant triggers must not re-deliver already-consumed lines.
        for _ in 0..3 {
            tx.send(ScanTrigger {
                root: root.path().to_path_buf(),
            })
            .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.console_len().await, 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
