//! Core pipeline abstractions: pooling, identity, tasks, agents and state.

pub mod address;
pub mod agent;
pub mod asset;
pub mod backend;
pub mod callbacks;
pub mod error;
pub mod executor;
pub mod reference_pool;
pub mod task;
pub mod tracker;

pub use address::AssetAddress;
pub use agent::{
    HelperHandle, HelperOutcome, LoadCompletion, LoadRequest, LoadResourceAgent,
    LoadResourceAgentHelper, StartedLoad, UnloadCompletion,
};
pub use asset::{AssetHandle, AssetObject, AssetType, HasAssetResult, LoadResourceStatus, UserData};
pub use backend::{ResourceBackend, ResourceHelper};
pub use callbacks::{LoadAssetCallbacks, LoadSceneCallbacks, UnloadSceneCallbacks};
pub use error::{AppResult, PipelineError, PoolError};
pub use executor::{AssetSource, LoadFailure, Spawn};
pub use reference_pool::{IntoAny, Reference, ReferencePool, ReferencePoolInfo};
pub use task::{LoadResourceTask, SerialCounter, TaskCallbacks, TaskKind};
pub use tracker::{ResourceState, ResourceStateSets};
