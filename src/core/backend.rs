//! Collaborator contracts at the edges of the pipeline.

use super::address::AssetAddress;
use super::agent::UnloadCompletion;
use super::asset::{AssetHandle, AssetType, HasAssetResult, UserData};
use super::callbacks::{LoadAssetCallbacks, LoadSceneCallbacks, UnloadSceneCallbacks};
use super::error::PipelineError;

/// Loading backend consumed by state trackers.
///
/// Calls never block. An `Err` means the request was rejected synchronously and
/// no callback will fire; `Ok` means exactly one callback of the set will fire
/// later.
pub trait ResourceBackend: Send + Sync {
    /// Availability of an address.
    ///
    /// # Errors
    ///
    /// Invalid address.
    fn has_asset(&self, address: &AssetAddress) -> Result<HasAssetResult, PipelineError>;

    /// Queue an asset load. `priority: None` uses the backend default.
    ///
    /// # Errors
    ///
    /// Synchronous rejection of the request.
    fn load_asset(
        &self,
        address: &AssetAddress,
        asset_type: Option<AssetType>,
        priority: Option<i32>,
        callbacks: LoadAssetCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError>;

    /// Queue a scene load. `priority: None` uses the backend default.
    ///
    /// # Errors
    ///
    /// Synchronous rejection of the request.
    fn load_scene(
        &self,
        address: &AssetAddress,
        priority: Option<i32>,
        callbacks: LoadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError>;

    /// Start a scene unload.
    ///
    /// # Errors
    ///
    /// Synchronous rejection of the request.
    fn unload_scene(
        &self,
        address: &AssetAddress,
        callbacks: UnloadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError>;
}

/// Package-level services the resource loader delegates to.
pub trait ResourceHelper: Send + Sync {
    /// Whether an address exists and where.
    fn has_asset(&self, address: &AssetAddress) -> HasAssetResult;

    /// Unload a scene; report exactly once through `completion`.
    fn unload_scene(&self, address: &AssetAddress, completion: UnloadCompletion);

    /// Release a loaded asset.
    fn unload_asset(&self, asset: AssetHandle);
}
