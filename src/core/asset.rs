//! Asset handles, type tags, statuses and the pooled asset wrapper.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::PoolError;
use super::reference_pool::{Reference, ReferencePool};

/// Opaque handle to a loaded asset or scene, produced by the backend.
pub type AssetHandle = Arc<dyn Any + Send + Sync>;

/// Opaque caller data carried alongside a request into its callbacks.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Runtime tag for the type a caller expects an asset to load as.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetType {
    id: TypeId,
    name: &'static str,
}

impl AssetType {
    /// Tag for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type identity.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Classification of a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadResourceStatus {
    /// The address does not exist in any package.
    NotExist,
    /// The resource exists but is not available locally yet.
    NotReady,
    /// A dependency of the resource failed to load.
    DependencyError,
    /// The resource loaded as a different type than requested.
    TypeError,
    /// The resource data is corrupt or could not be instantiated.
    AssetError,
    /// Fetching from a remote location failed.
    NetworkError,
    /// The load ended without a report: its completion was dropped or the
    /// loader shut down first.
    Abandoned,
}

impl fmt::Display for LoadResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Availability of an address as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasAssetResult {
    /// Unknown address.
    NotExist,
    /// Known, but its package is not ready.
    NotReady,
    /// Available locally.
    AssetOnDisk,
    /// Must be downloaded first.
    AssetOnRemote,
}

/// Pooled wrapper around a loaded asset, handed to task hooks.
#[derive(Default)]
pub struct AssetObject {
    asset: Option<AssetHandle>,
    is_scene: bool,
    user_data: Option<UserData>,
}

impl AssetObject {
    /// Acquire a wrapper from the pool and fill it.
    ///
    /// # Errors
    ///
    /// Propagates pool misuse.
    pub fn create(
        pool: &ReferencePool,
        asset: AssetHandle,
        is_scene: bool,
        user_data: Option<UserData>,
    ) -> Result<Box<Self>, PoolError> {
        let mut object = pool.acquire::<Self>()?;
        object.asset = Some(asset);
        object.is_scene = is_scene;
        object.user_data = user_data;
        Ok(object)
    }

    /// The wrapped asset; `None` only on a cleared wrapper.
    #[must_use]
    pub const fn asset(&self) -> Option<&AssetHandle> {
        self.asset.as_ref()
    }

    /// Whether the asset is a scene.
    #[must_use]
    pub const fn is_scene(&self) -> bool {
        self.is_scene
    }

    /// Caller data of the request that produced the asset.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

impl Reference for AssetObject {
    fn clear(&mut self) {
        self.asset = None;
        self.is_scene = false;
        self.user_data = None;
    }
}

impl fmt::Debug for AssetObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetObject")
            .field("loaded", &self.asset.is_some())
            .field("is_scene", &self.is_scene)
            .finish_non_exhaustive()
    }
}
