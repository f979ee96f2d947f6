use axum::Extension;

use crate::storage::Snapshot;
use crate::storage::SnapshotStore;

use super::Error;
use super::Form;
use super::Success;

/// The stored snapshot
pub async fn load<S: SnapshotStore>(
    Extension(storage): Extension<S>,
) -> Result<Success<Snapshot>, Error> {
    storage
        .load()
        .await
        .map(Success::ok)
        .map_err(Error::internal_server_error)
}

/// Replace the stored snapshot, responds with what is stored afterwards
pub async fn save<S: SnapshotStore>(
    Extension(storage): Extension<S>,
    Form(snapshot): Form<Snapshot>,
) -> Result<Success<Snapshot>, Error> {
    tracing::debug!(
        categories = snapshot.categories.len(),
        notes = snapshot.notes.len(),
        "Replacing snapshot"
    );

    storage
        .save(&snapshot)
        .await
        .map_err(Error::internal_server_error)?;

    load(Extension(storage)).await
}
