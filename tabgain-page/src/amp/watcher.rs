//! Mutation watcher
//!
//! Observes structural document changes and feeds newly inserted
//! playable elements to the tracker without rescanning the whole
//! document. Insertions are batched across a short debounce window so
//! bursty mutation (infinite-scroll feeds) costs one flush, not one
//! pass per insertion.

use crate::amp::tracker::MediaTracker;
use crate::page::{Document, MediaElement};
use std::sync::{Arc, Mutex};
use tabgain_common::params;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Debounced observer of document insertions
pub struct MutationWatcher {
    document: Arc<Document>,
    tracker: Arc<MediaTracker>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MutationWatcher {
    pub fn new(document: Arc<Document>, tracker: Arc<MediaTracker>) -> Self {
        Self {
            document,
            tracker,
            task: Mutex::new(None),
        }
    }

    /// Start observing document mutations
    ///
    /// Tolerates re-arming: any prior observation is disconnected first,
    /// so exactly one observer is active at a time.
    pub fn observe(&self) {
        let mut slot = self.task.lock().unwrap();
        if let Some(prev) = slot.take() {
            debug!("Disconnecting previous mutation observer");
            prev.abort();
        }

        // Subscribe before spawning so no record is missed in between
        let mut mutations = self.document.subscribe_mutations();
        let tracker = Arc::clone(&self.tracker);

        let handle = tokio::spawn(async move {
            let mut pending: Vec<Arc<MediaElement>> = Vec::new();
            let mut deadline: Option<Instant> = None;

            loop {
                let flush_timer = async move {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    record = mutations.recv() => match record {
                        Ok(record) => {
                            let added = record.added_media();
                            if !added.is_empty() {
                                for element in added {
                                    if !pending.iter().any(|p| p.id() == element.id()) {
                                        pending.push(element);
                                    }
                                }
                                // Each batch of insertions re-arms the window
                                deadline = Some(Instant::now() + params::MUTATION_DEBOUNCE);
                            }
                        }
                        Err(RecvError::Lagged(missed)) => {
                            // Dropped records are picked up by the reconcile
                            // that follows the next flush
                            warn!(missed, "Mutation observer lagged");
                            deadline = Some(Instant::now() + params::MUTATION_DEBOUNCE);
                        }
                        Err(RecvError::Closed) => {
                            if !pending.is_empty() {
                                flush(&tracker, &mut pending).await;
                            }
                            break;
                        }
                    },
                    _ = flush_timer => {
                        deadline = None;
                        flush(&tracker, &mut pending).await;
                    }
                }
            }
        });
        *slot = Some(handle);
    }

    /// Stop observing (teardown)
    pub fn disconnect(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Whether an observer task is currently active
    pub fn is_observing(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for MutationWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Connect one accumulated batch, then reconcile
async fn flush(tracker: &MediaTracker, pending: &mut Vec<Arc<MediaElement>>) {
    let batch = std::mem::take(pending);
    debug!(count = batch.len(), "Flushing mutation batch");
    for element in &batch {
        tracker.connect(element).await;
    }
    tracker.reconcile().await;
}
