//! Error types for pool and pipeline operations.

use thiserror::Error;

use super::address::AssetAddress;
use super::asset::LoadResourceStatus;

/// Misuse of the reference pool. Always indicates a lifetime bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The type was never acquired from this pool, so it has no collection.
    #[error("reference type '{type_name}' is unknown to this pool")]
    UnknownType {
        /// Name of the released type.
        type_name: &'static str,
    },
    /// The declared release type differs from the instance's concrete type.
    #[error("reference type mismatch: declared '{expected}', found '{found}'")]
    TypeMismatch {
        /// Type the caller released the instance as.
        expected: &'static str,
        /// Concrete type of the instance.
        found: &'static str,
    },
    /// The instance is not checked out: released twice, or never acquired here.
    #[error("reference of type '{type_name}' has been released already or was never acquired")]
    NotAcquired {
        /// Name of the released type.
        type_name: &'static str,
    },
}

/// Errors produced by the loading pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Package name or location is empty.
    #[error("asset address '{0}' is invalid")]
    InvalidAddress(AssetAddress),
    /// The address is in the unloading set.
    #[error("asset '{0}' is being unloaded")]
    BeingUnloaded(AssetAddress),
    /// The address is in the loading set.
    #[error("asset '{0}' is being loaded")]
    BeingLoaded(AssetAddress),
    /// The address is in the loaded set.
    #[error("asset '{0}' is already loaded")]
    AlreadyLoaded(AssetAddress),
    /// Unload requested for an address that is not loaded.
    #[error("asset '{0}' is not loaded yet")]
    NotLoaded(AssetAddress),
    /// No resource backend has been wired in.
    #[error("resource backend must be set first")]
    BackendNotSet,
    /// The loader has no agents to run tasks on.
    #[error("no load resource agent has been added")]
    NoAgents,
    /// A load failed and nobody handled the failure.
    #[error("load failure, asset '{address}', status '{status}', error message '{message}'")]
    LoadFailed {
        /// Address that failed to load.
        address: AssetAddress,
        /// Failure classification reported by the backend.
        status: LoadResourceStatus,
        /// Human-readable backend message.
        message: String,
    },
    /// A scene unload failed and nobody handled the failure.
    #[error("unload scene failure, scene asset '{address}', error message '{message}'")]
    UnloadFailed {
        /// Address that failed to unload.
        address: AssetAddress,
        /// Human-readable backend message.
        message: String,
    },
    /// The waiting queue reached its configured depth.
    #[error("waiting task queue is full (max {0})")]
    QueueFull(usize),
    /// The loader has been shut down.
    #[error("resource loader has been shut down")]
    ShutDown,
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Reference pool misuse.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl PipelineError {
    /// Whether the error is a rejected precondition on the address state.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::BeingUnloaded(_) | Self::BeingLoaded(_) | Self::AlreadyLoaded(_) | Self::NotLoaded(_)
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
