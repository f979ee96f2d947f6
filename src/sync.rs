//! Serialized saving of snapshots
//!
//! One worker task owns the store and drains a queue of full snapshots, so saves are issued in
//! the order they were enqueued and never overlap. A failed save is not retried, the next
//! snapshot carries the same state forward.

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::storage;
use crate::storage::Snapshot;
use crate::storage::SnapshotStore;

/// Runs on the first failed save of the session
pub type FailureHook = Box<dyn FnOnce(&storage::Error) + Send>;

/// What the worker is doing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Sending,
    Failed,
}

/// Progress of the sync worker
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub phase: SyncPhase,

    /// Saves that succeeded
    pub completed: u64,

    /// Saves that failed
    pub failed: u64,

    pub last_error: Option<String>,
}

enum Job {
    Save {
        snapshot: Snapshot,
        done: oneshot::Sender<storage::Result<()>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Outcome of one enqueued save
#[derive(Debug)]
pub struct SyncTicket {
    receiver: oneshot::Receiver<storage::Result<()>>,
}

impl SyncTicket {
    /// Wait until the save went through or failed
    pub async fn wait(self) -> storage::Result<()> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(storage::Error::Connection("Sync worker stopped".to_string())))
    }
}

/// Queue of snapshot saves
///
/// Must be created inside a tokio runtime. Dropping it lets the worker finish the queue.
#[derive(Debug)]
pub struct SyncCoordinator {
    sender: mpsc::UnboundedSender<Job>,
    status: watch::Receiver<SyncStatus>,
}

impl SyncCoordinator {
    /// Start a worker saving to the store, the first failure is logged as an error
    pub fn new<S>(store: S) -> Self
    where
        S: SnapshotStore,
    {
        Self::with_failure_hook(store, |err| {
            tracing::error!("Sync failed, changes are only kept locally: {err}");
        })
    }

    /// Start a worker saving to the store, the hook runs on the first failure
    pub fn with_failure_hook<S, F>(store: S, on_first_failure: F) -> Self
    where
        S: SnapshotStore,
        F: FnOnce(&storage::Error) + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (status_sender, status) = watch::channel(SyncStatus::default());

        tokio::spawn(run(
            store,
            receiver,
            status_sender,
            Box::new(on_first_failure),
        ));

        Self { sender, status }
    }

    /// Queue a snapshot to be saved after everything queued before it
    pub fn enqueue(&self, snapshot: Snapshot) -> SyncTicket {
        let (done, receiver) = oneshot::channel();

        if self.sender.send(Job::Save { snapshot, done }).is_err() {
            tracing::warn!("Sync worker stopped, snapshot not saved");
        }

        SyncTicket { receiver }
    }

    /// Wait until every save queued so far is done
    pub async fn flush(&self) {
        let (done, receiver) = oneshot::channel();

        if self.sender.send(Job::Flush(done)).is_ok() {
            receiver.await.ok();
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }
}

async fn run<S>(
    store: S,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    status: watch::Sender<SyncStatus>,
    on_first_failure: FailureHook,
) where
    S: SnapshotStore,
{
    let mut on_first_failure = Some(on_first_failure);

    while let Some(job) = jobs.recv().await {
        let (snapshot, done) = match job {
            Job::Save { snapshot, done } => (snapshot, done),
            Job::Flush(done) => {
                done.send(()).ok();
                continue;
            }
        };

        status.send_modify(|status| status.phase = SyncPhase::Sending);

        let result = store.save(&snapshot).await;

        match &result {
            Ok(()) => {
                tracing::debug!(
                    categories = snapshot.categories.len(),
                    notes = snapshot.notes.len(),
                    "Snapshot saved"
                );

                status.send_modify(|status| {
                    status.phase = SyncPhase::Idle;
                    status.completed += 1;
                });
            }
            Err(err) => {
                status.send_modify(|status| {
                    status.phase = SyncPhase::Failed;
                    status.failed += 1;
                    status.last_error = Some(err.to_string());
                });

                match on_first_failure.take() {
                    Some(hook) => hook(err),
                    None => tracing::debug!("Sync failed again: {err}"),
                }

                status.send_modify(|status| status.phase = SyncPhase::Idle);
            }
        }

        done.send(result).ok();
    }

    tracing::debug!("Sync worker stopped");
}
