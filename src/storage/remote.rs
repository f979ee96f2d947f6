//! Remote storage
//!
//! Talks to the snapshot API (see [`crate::api`]) through any tower service, a real HTTP client
//! or the router itself

use std::fmt::Display;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::http::header::ACCEPT;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde::Deserialize;
use tower::Service;
use tower::ServiceExt;

use super::Error;
use super::Result;
use super::Snapshot;
use super::SnapshotStore;
use super::connection_error;

/// Default path of the snapshot endpoint
pub const DEFAULT_ENDPOINT: &str = "/api/snapshot";

/// Response envelope of the snapshot API
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,

    #[serde(default)]
    data: Option<Snapshot>,

    #[serde(default)]
    message: String,
}

/// Storage behind the snapshot API
#[derive(Clone, Debug)]
pub struct Remote<T> {
    /// Sends the requests
    service: T,

    /// URI of the snapshot endpoint
    endpoint: String,
}

impl<T> Remote<T> {
    /// Create a remote storage using the default endpoint
    pub fn new(service: T) -> Self {
        Self::with_endpoint(service, DEFAULT_ENDPOINT)
    }

    /// Create a remote storage using a custom endpoint URI
    pub fn with_endpoint<E>(service: T, endpoint: E) -> Self
    where
        E: Into<String>,
    {
        Self {
            service,
            endpoint: endpoint.into(),
        }
    }
}

impl<T> Remote<T>
where
    T: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
    T::Future: Send,
    T::Error: Display,
{
    /// Send a request and unwrap the snapshot from the envelope
    async fn exchange(&self, request: Request<Body>) -> Result<Snapshot> {
        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(connection_error)?;

        let status_code = response.status();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(connection_error)?
            .to_bytes();

        let envelope = serde_json::from_slice::<Envelope>(&body)
            .map_err(|err| Error::Connection(format!("HTTP {status_code}: {err}")))?;

        if !status_code.is_success() || !envelope.success {
            return Err(Error::Connection(if envelope.message.is_empty() {
                format!("HTTP {status_code}")
            } else {
                envelope.message
            }));
        }

        envelope
            .data
            .ok_or_else(|| Error::Connection("Response without snapshot".to_string()))
    }
}

#[async_trait]
impl<T> SnapshotStore for Remote<T>
where
    T: Service<Request<Body>, Response = Response<Body>> + Clone + Send + Sync + 'static,
    T::Future: Send,
    T::Error: Display,
{
    async fn load(&self) -> Result<Snapshot> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(&self.endpoint)
            .header(ACCEPT, "application/json")
            .body(Body::empty())
            .map_err(connection_error)?;

        self.exchange(request).await
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_vec(snapshot).map_err(connection_error)?;

        let request = Request::builder()
            .method(Method::PUT)
            .uri(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(connection_error)?;

        tracing::debug!(
            categories = snapshot.categories.len(),
            notes = snapshot.notes.len(),
            "Sending snapshot to {}",
            self.endpoint
        );

        self.exchange(request).await.map(|_| ())
    }
}
