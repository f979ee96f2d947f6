//! The snapshot API
//!
//! - `GET /api/snapshot` responds with the stored snapshot
//! - `PUT /api/snapshot` replaces it and responds with the new one

use axum::Extension;
use axum::Router;
use axum::http::Uri;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use request::Form;
pub use response::Error;
pub use response::Success;

use crate::storage::SnapshotStore;

mod request;
mod response;
mod snapshot;

/// Get the Axum router for all API routes
pub fn router<S: SnapshotStore>() -> Router {
    Router::new().route("/snapshot", get(snapshot::load::<S>).put(snapshot::save::<S>))
}

/// Create the full app serving the API over a store
pub fn app<S: SnapshotStore>(storage: S) -> Router {
    Router::new()
        .nest("/api", router::<S>())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
}

async fn not_found(uri: Uri) -> Error {
    tracing::debug!("No route for {uri}");

    Error::not_found("Not found")
}
