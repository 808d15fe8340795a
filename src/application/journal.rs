use crate::domain::account::MainAccount;
use crate::domain::ports::LedgerStoreRef;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Receives a snapshot after every successful ledger mutation.
///
/// Recording never blocks, so the engine can call it while holding the ledger
/// lock and snapshots reach the store in mutation order.
#[derive(Clone, Debug)]
pub struct Journal {
    sender: mpsc::UnboundedSender<MainAccount>,
}

/// The background task saving journaled snapshots.
#[derive(Debug)]
pub struct JournalTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Journal {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MainAccount>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Starts a task that saves journaled snapshots into `store`.
    ///
    /// Bursts are coalesced: only the newest queued snapshot is written, since each
    /// one is the full account. The task ends once every `Journal` clone is dropped
    /// and the queue is drained, or when its `JournalTask` is closed or dropped.
    pub fn spawn(store: LedgerStoreRef) -> (Self, JournalTask) {
        let (journal, mut receiver) = Self::channel();
        let (shutdown, mut shutdown_signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut closing = false;
            while !closing {
                let mut latest = tokio::select! {
                    received = receiver.recv() => match received {
                        Some(snapshot) => snapshot,
                        None => break,
                    },
                    _ = &mut shutdown_signal => {
                        closing = true;
                        match receiver.try_recv() {
                            Ok(snapshot) => snapshot,
                            Err(_) => break,
                        }
                    }
                };
                while let Ok(newer) = receiver.try_recv() {
                    latest = newer;
                }
                if let Err(e) = store.save(latest).await {
                    tracing::warn!(error = %e, "failed to persist ledger snapshot");
                }
            }
            tracing::debug!("journal closed");
        });

        (journal, JournalTask { shutdown, handle })
    }

    pub fn record(&self, snapshot: MainAccount) {
        if self.sender.send(snapshot).is_err() {
            tracing::warn!("journal receiver dropped; snapshot not persisted");
        }
    }
}

impl JournalTask {
    /// Saves whatever is still queued, then stops. Returns once no save is in
    /// flight, so the caller can write to the store without being overtaken.
    pub async fn close(self) {
        // Err means the task already finished.
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "journal task did not finish cleanly");
        }
    }
}
