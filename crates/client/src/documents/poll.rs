// Background refresh of a workspace's documents while any are indexing.
//
// One loop per tracker at most. Each loop is tagged with the epoch it was
// started under; a result is applied only while that epoch is current, so
// a fetch that completes after cancellation is dropped on the floor.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ragdesk_common::types::Document;

use super::Shared;
use crate::gateway::{ApiError, RemoteApi};

/// Handle for a running poll loop. Dropping it cancels the loop.
///
/// Cancellation never aborts a request already on the wire; the loop exits
/// once that request returns and its result is discarded.
pub(super) struct PollHandle {
    shutdown_tx: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl PollHandle {
    pub(super) fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub(super) fn spawn<A: RemoteApi>(shared: Arc<Shared<A>>, epoch: u64) -> PollHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(poll_loop(shared, epoch, shutdown_rx));
    PollHandle { shutdown_tx, _task: task }
}

async fn poll_loop<A: RemoteApi>(
    shared: Arc<Shared<A>>,
    epoch: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let workspace = shared.workspace_id.clone();
    loop {
        tokio::select! {
            _ = tokio::time::sleep(shared.poll_interval) => {},
            _ = shutdown_rx.changed() => {
                debug!(%workspace, epoch, "poll loop cancelled");
                return;
            }
        }

        let result = shared.fetch().await;
        if *shutdown_rx.borrow() {
            debug!(%workspace, epoch, "discarding poll result after cancellation");
            return;
        }

        match result {
            Ok(fresh) => match shared.apply(Some(epoch), fresh) {
                Some(true) => debug!(%workspace, epoch, "documents still processing"),
                Some(false) => {
                    info!(%workspace, "indexing finished");
                    shared.finish_polling(epoch);
                    return;
                }
                None => {
                    debug!(%workspace, epoch, "poll result from a stale loop discarded");
                    return;
                }
            },
            Err(ApiError::Unauthenticated) => {
                warn!(%workspace, "signed out while polling; stopping");
                shared.finish_polling(epoch);
                return;
            }
            Err(error) => {
                warn!(%workspace, error = %error, "document poll failed; retrying on schedule");
            }
        }
    }
}

/// Merge a fresh listing into the previous one without letting a document
/// move backwards in its lifecycle.
///
/// Membership and order come from `fresh`. A row whose reported status is
/// not reachable from the status already seen keeps its previous row.
pub fn merge_monotonic(previous: &[Document], fresh: Vec<Document>) -> Vec<Document> {
    fresh
        .into_iter()
        .map(|doc| match previous.iter().find(|old| old.id == doc.id) {
            Some(old) if !old.status.can_transition_to(doc.status) => {
                warn!(
                    document = %doc.id,
                    from = %old.status,
                    to = %doc.status,
                    "ignoring status regression reported by the server"
                );
                old.clone()
            }
            _ => doc,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::document;
    use ragdesk_common::types::DocumentStatus::*;

    #[test]
    fn forward_transitions_are_taken() {
        let previous = vec![document("d1", "a.pdf", Processing)];
        let mut ready = document("d1", "a.pdf", Ready);
        ready.chunk_count = 12;

        let merged = merge_monotonic(&previous, vec![ready.clone()]);
        assert_eq!(merged, vec![ready]);
    }

    #[test]
    fn terminal_status_survives_regression() {
        let mut ready = document("d1", "a.pdf", Ready);
        ready.chunk_count = 12;
        let previous = vec![ready.clone(), document("d2", "b.pdf", Error)];

        let merged = merge_monotonic(
            &previous,
            vec![document("d1", "a.pdf", Processing), document("d2", "b.pdf", Processing)],
        );

        assert_eq!(merged[0], ready);
        assert_eq!(merged[1].status, Error);
    }

    #[test]
    fn membership_follows_fresh_listing() {
        let previous = vec![document("d1", "a.pdf", Ready), document("d2", "b.pdf", Ready)];
        let merged = merge_monotonic(
            &previous,
            vec![document("d3", "c.pdf", Processing), document("d2", "b.pdf", Ready)],
        );

        let ids: Vec<&str> = merged.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d3", "d2"]);
    }
}
