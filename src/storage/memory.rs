//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Result;
use super::Snapshot;
use super::SnapshotStore;

/// An in-memory storage
///
/// Clones share the same snapshot
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// The stored snapshot
    snapshot: Arc<Mutex<Snapshot>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Memory storage holding a snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotStore for Memory {
    async fn load(&self) -> Result<Snapshot> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.lock().await = snapshot.clone();

        Ok(())
    }
}
