//! Callback sets attached to load and unload requests.
//!
//! Failure callbacks return a `Result`: returning `Err` escalates the failure
//! out of the update cycle that delivered it. A callback set without a failure
//! callback escalates every failure.

use std::sync::Arc;
use std::time::Duration;

use super::address::AssetAddress;
use super::asset::{AssetHandle, LoadResourceStatus, UserData};
use super::error::PipelineError;

/// Invoked with `(address, asset, duration, user_data)` when an asset loads.
pub type LoadAssetSuccessCallback =
    Arc<dyn Fn(&AssetAddress, AssetHandle, Duration, Option<UserData>) + Send + Sync>;

/// Invoked with `(address, status, message, user_data)` when an asset fails to load.
pub type LoadAssetFailureCallback = Arc<
    dyn Fn(&AssetAddress, LoadResourceStatus, &str, Option<UserData>) -> Result<(), PipelineError>
        + Send
        + Sync,
>;

/// Invoked with `(address, scene, duration, user_data)` when a scene loads.
pub type LoadSceneSuccessCallback =
    Arc<dyn Fn(&AssetAddress, AssetHandle, Duration, Option<UserData>) + Send + Sync>;

/// Invoked with `(address, status, message, user_data)` when a scene fails to load.
pub type LoadSceneFailureCallback = Arc<
    dyn Fn(&AssetAddress, LoadResourceStatus, &str, Option<UserData>) -> Result<(), PipelineError>
        + Send
        + Sync,
>;

/// Invoked with `(address, user_data)` when a scene unloads.
pub type UnloadSceneSuccessCallback = Arc<dyn Fn(&AssetAddress, Option<UserData>) + Send + Sync>;

/// Invoked with `(address, message, user_data)` when a scene fails to unload.
pub type UnloadSceneFailureCallback =
    Arc<dyn Fn(&AssetAddress, &str, Option<UserData>) -> Result<(), PipelineError> + Send + Sync>;

/// Callbacks for one asset load request.
#[derive(Clone)]
pub struct LoadAssetCallbacks {
    success: LoadAssetSuccessCallback,
    failure: Option<LoadAssetFailureCallback>,
}

impl LoadAssetCallbacks {
    /// Callback set with only a success callback.
    pub fn new<F>(success: F) -> Self
    where
        F: Fn(&AssetAddress, AssetHandle, Duration, Option<UserData>) + Send + Sync + 'static,
    {
        Self {
            success: Arc::new(success),
            failure: None,
        }
    }

    /// Add a failure callback.
    #[must_use]
    pub fn with_failure<F>(mut self, failure: F) -> Self
    where
        F: Fn(&AssetAddress, LoadResourceStatus, &str, Option<UserData>) -> Result<(), PipelineError>
            + Send
            + Sync
            + 'static,
    {
        self.failure = Some(Arc::new(failure));
        self
    }

    /// Success callback.
    #[must_use]
    pub const fn success(&self) -> &LoadAssetSuccessCallback {
        &self.success
    }

    /// Failure callback, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&LoadAssetFailureCallback> {
        self.failure.as_ref()
    }
}

/// Callbacks for one scene load request.
#[derive(Clone)]
pub struct LoadSceneCallbacks {
    success: LoadSceneSuccessCallback,
    failure: Option<LoadSceneFailureCallback>,
}

impl LoadSceneCallbacks {
    /// Callback set with only a success callback.
    pub fn new<F>(success: F) -> Self
    where
        F: Fn(&AssetAddress, AssetHandle, Duration, Option<UserData>) + Send + Sync + 'static,
    {
        Self {
            success: Arc::new(success),
            failure: None,
        }
    }

    /// Add a failure callback.
    #[must_use]
    pub fn with_failure<F>(mut self, failure: F) -> Self
    where
        F: Fn(&AssetAddress, LoadResourceStatus, &str, Option<UserData>) -> Result<(), PipelineError>
            + Send
            + Sync
            + 'static,
    {
        self.failure = Some(Arc::new(failure));
        self
    }

    /// Success callback.
    #[must_use]
    pub const fn success(&self) -> &LoadSceneSuccessCallback {
        &self.success
    }

    /// Failure callback, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&LoadSceneFailureCallback> {
        self.failure.as_ref()
    }
}

/// Callbacks for one scene unload request.
#[derive(Clone)]
pub struct UnloadSceneCallbacks {
    success: UnloadSceneSuccessCallback,
    failure: Option<UnloadSceneFailureCallback>,
}

impl UnloadSceneCallbacks {
    /// Callback set with only a success callback.
    pub fn new<F>(success: F) -> Self
    where
        F: Fn(&AssetAddress, Option<UserData>) + Send + Sync + 'static,
    {
        Self {
            success: Arc::new(success),
            failure: None,
        }
    }

    /// Add a failure callback.
    #[must_use]
    pub fn with_failure<F>(mut self, failure: F) -> Self
    where
        F: Fn(&AssetAddress, &str, Option<UserData>) -> Result<(), PipelineError> + Send + Sync + 'static,
    {
        self.failure = Some(Arc::new(failure));
        self
    }

    /// Report a successful unload.
    pub fn succeed(&self, address: &AssetAddress, user_data: Option<UserData>) {
        (self.success)(address, user_data);
    }

    /// Report a failed unload; escalates when no failure callback is set.
    ///
    /// # Errors
    ///
    /// The failure callback's error, or `PipelineError::UnloadFailed`.
    pub fn fail(
        &self,
        address: &AssetAddress,
        message: &str,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        match &self.failure {
            Some(failure) => failure(address, message, user_data),
            None => Err(PipelineError::UnloadFailed {
                address: address.clone(),
                message: message.to_owned(),
            }),
        }
    }
}
