//! Async fetch abstraction and runtime spawning.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use super::agent::LoadRequest;
use super::asset::{AssetHandle, LoadResourceStatus};

/// Failure produced by an [`AssetSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Failure classification.
    pub status: LoadResourceStatus,
    /// Human-readable message.
    pub message: String,
}

impl LoadFailure {
    /// Create a failure.
    pub fn new(status: LoadResourceStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for LoadFailure {}

/// Asynchronous fetcher of resource bytes.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use prometheus_asset_pipeline::core::{AssetHandle, AssetSource, LoadFailure, LoadRequest};
///
/// #[derive(Clone)]
/// struct DiskSource;
///
/// #[async_trait]
/// impl AssetSource for DiskSource {
///     async fn fetch(&self, request: LoadRequest) -> Result<AssetHandle, LoadFailure> {
///         let bytes = tokio::fs::read(request.address.location()).await.map_err(|e| {
///             LoadFailure::new(prometheus_asset_pipeline::core::LoadResourceStatus::NotExist, e.to_string())
///         })?;
///         Ok(Arc::new(bytes))
///     }
/// }
/// ```
#[async_trait]
pub trait AssetSource: Send + Sync + Clone + 'static {
    /// Fetch and instantiate the requested resource.
    async fn fetch(&self, request: LoadRequest) -> Result<AssetHandle, LoadFailure>;
}

/// Spawner abstraction to allow runtime-agnostic scheduling.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
