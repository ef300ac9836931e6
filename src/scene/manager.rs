//! Scene state tracker.
//!
//! [`SceneManager`] is the only owner of the loading/loaded/unloading sets for
//! scenes. Requests are validated and recorded here, then forwarded to the
//! resource backend with callbacks bound back to the manager. The callbacks
//! hold a weak reference, so an outstanding request never keeps a dropped
//! manager alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::core::{
    AssetAddress, AssetHandle, HasAssetResult, LoadResourceStatus, LoadSceneCallbacks, PipelineError,
    ReferencePool, ResourceBackend, ResourceStateSets, UnloadSceneCallbacks, UserData,
};

use super::events::{
    fire, EventHandler, EventHandlers, HandlerId, LoadSceneFailureEventArgs, LoadSceneSuccessEventArgs,
    NotifyOutcome, UnloadSceneFailureEventArgs, UnloadSceneSuccessEventArgs,
};

#[derive(Default)]
struct SceneHandlers {
    load_success: EventHandlers<LoadSceneSuccessEventArgs>,
    load_failure: EventHandlers<LoadSceneFailureEventArgs>,
    unload_success: EventHandlers<UnloadSceneSuccessEventArgs>,
    unload_failure: EventHandlers<UnloadSceneFailureEventArgs>,
}

struct Inner {
    pool: Arc<ReferencePool>,
    sets: Mutex<ResourceStateSets>,
    handlers: RwLock<SceneHandlers>,
    backend: RwLock<Option<Arc<dyn ResourceBackend>>>,
    next_handler: AtomicU64,
}

/// Tracks scene load state and fans backend outcomes out as events.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct SceneManager {
    inner: Arc<Inner>,
}

impl SceneManager {
    /// Create a manager drawing event records from `pool`.
    pub fn new(pool: Arc<ReferencePool>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pool,
                sets: Mutex::new(ResourceStateSets::new()),
                handlers: RwLock::new(SceneHandlers::default()),
                backend: RwLock::new(None),
                next_handler: AtomicU64::new(1),
            }),
        }
    }

    /// Wire in the resource backend.
    pub fn set_resource_backend(&self, backend: Arc<dyn ResourceBackend>) {
        *self.inner.backend.write() = Some(backend);
    }

    fn backend(&self) -> Result<Arc<dyn ResourceBackend>, PipelineError> {
        self.inner
            .backend
            .read()
            .clone()
            .ok_or(PipelineError::BackendNotSet)
    }

    fn validate(address: &AssetAddress) -> Result<(), PipelineError> {
        if address.is_valid() {
            Ok(())
        } else {
            Err(PipelineError::InvalidAddress(address.clone()))
        }
    }

    /// Whether a scene is loaded.
    ///
    /// # Errors
    ///
    /// Invalid address.
    pub fn scene_is_loaded(&self, address: &AssetAddress) -> Result<bool, PipelineError> {
        Self::validate(address)?;
        Ok(self.inner.sets.lock().is_loaded(address))
    }

    /// Whether a scene is loading.
    ///
    /// # Errors
    ///
    /// Invalid address.
    pub fn scene_is_loading(&self, address: &AssetAddress) -> Result<bool, PipelineError> {
        Self::validate(address)?;
        Ok(self.inner.sets.lock().is_loading(address))
    }

    /// Whether a scene is unloading.
    ///
    /// # Errors
    ///
    /// Invalid address.
    pub fn scene_is_unloading(&self, address: &AssetAddress) -> Result<bool, PipelineError> {
        Self::validate(address)?;
        Ok(self.inner.sets.lock().is_unloading(address))
    }

    /// Loaded scenes in load order.
    pub fn loaded_scene_addresses(&self) -> Vec<AssetAddress> {
        self.inner.sets.lock().loaded().to_vec()
    }

    /// Loading scenes in request order.
    pub fn loading_scene_addresses(&self) -> Vec<AssetAddress> {
        self.inner.sets.lock().loading().to_vec()
    }

    /// Unloading scenes in request order.
    pub fn unloading_scene_addresses(&self) -> Vec<AssetAddress> {
        self.inner.sets.lock().unloading().to_vec()
    }

    /// Whether the backend knows the scene.
    ///
    /// # Errors
    ///
    /// Invalid address, or no backend wired in.
    pub fn has_scene(&self, address: &AssetAddress) -> Result<bool, PipelineError> {
        Self::validate(address)?;
        let result = self.backend()?.has_asset(address)?;
        Ok(result != HasAssetResult::NotExist)
    }

    /// Request a scene load.
    ///
    /// # Errors
    ///
    /// Invalid address, no backend, or the scene is unloading, loading or
    /// loaded already. A synchronous backend rejection is returned after the
    /// scene has been taken out of the loading set again.
    pub fn load_scene(
        &self,
        address: &AssetAddress,
        priority: Option<i32>,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        Self::validate(address)?;
        let backend = self.backend()?;
        self.inner.sets.lock().begin_load(address)?;

        if let Err(err) = backend.load_scene(address, priority, self.load_callbacks(), user_data) {
            tracing::warn!(address = %address, error = %err, "backend rejected scene load");
            self.inner.sets.lock().cancel_load(address);
            return Err(err);
        }
        tracing::debug!(address = %address, ?priority, "scene load requested");
        Ok(())
    }

    /// Request a scene unload.
    ///
    /// # Errors
    ///
    /// Invalid address, no backend, or the scene is unloading, loading or not
    /// loaded. A synchronous backend rejection is returned after the scene has
    /// been moved back to loaded.
    pub fn unload_scene(&self, address: &AssetAddress, user_data: Option<UserData>) -> Result<(), PipelineError> {
        Self::validate(address)?;
        let backend = self.backend()?;
        self.inner.sets.lock().begin_unload(address)?;

        if let Err(err) = backend.unload_scene(address, self.unload_callbacks(), user_data) {
            tracing::warn!(address = %address, error = %err, "backend rejected scene unload");
            self.inner.sets.lock().finish_unload(address, false);
            return Err(err);
        }
        tracing::debug!(address = %address, "scene unload requested");
        Ok(())
    }

    fn load_callbacks(&self) -> LoadSceneCallbacks {
        let on_success = Arc::downgrade(&self.inner);
        let on_failure = Weak::clone(&on_success);
        LoadSceneCallbacks::new(move |address, scene, duration, user_data| {
            if let Some(inner) = on_success.upgrade() {
                inner.load_scene_succeeded(address, scene, duration, user_data);
            }
        })
        .with_failure(move |address, status, message, user_data| {
            on_failure.upgrade().map_or(Ok(()), |inner| {
                inner
                    .load_scene_failed(address, status, message, user_data)
                    .into_result()
                    .map(drop)
            })
        })
    }

    fn unload_callbacks(&self) -> UnloadSceneCallbacks {
        let on_success = Arc::downgrade(&self.inner);
        let on_failure = Weak::clone(&on_success);
        UnloadSceneCallbacks::new(move |address, user_data| {
            if let Some(inner) = on_success.upgrade() {
                inner.unload_scene_succeeded(address, user_data);
            }
        })
        .with_failure(move |address, message, user_data| {
            on_failure.upgrade().map_or(Ok(()), |inner| {
                inner
                    .unload_scene_failed(address, message, user_data)
                    .into_result()
                    .map(drop)
            })
        })
    }

    fn next_handler_id(&self) -> HandlerId {
        HandlerId(self.inner.next_handler.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to scene load successes.
    pub fn on_load_scene_success<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&LoadSceneSuccessEventArgs) + Send + Sync + 'static,
    {
        let id = self.next_handler_id();
        let handler: EventHandler<LoadSceneSuccessEventArgs> = Arc::new(handler);
        self.inner.handlers.write().load_success.add(id, handler);
        id
    }

    /// Subscribe to scene load failures.
    pub fn on_load_scene_failure<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&LoadSceneFailureEventArgs) + Send + Sync + 'static,
    {
        let id = self.next_handler_id();
        let handler: EventHandler<LoadSceneFailureEventArgs> = Arc::new(handler);
        self.inner.handlers.write().load_failure.add(id, handler);
        id
    }

    /// Subscribe to scene unload successes.
    pub fn on_unload_scene_success<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&UnloadSceneSuccessEventArgs) + Send + Sync + 'static,
    {
        let id = self.next_handler_id();
        let handler: EventHandler<UnloadSceneSuccessEventArgs> = Arc::new(handler);
        self.inner.handlers.write().unload_success.add(id, handler);
        id
    }

    /// Subscribe to scene unload failures.
    pub fn on_unload_scene_failure<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&UnloadSceneFailureEventArgs) + Send + Sync + 'static,
    {
        let id = self.next_handler_id();
        let handler: EventHandler<UnloadSceneFailureEventArgs> = Arc::new(handler);
        self.inner.handlers.write().unload_failure.add(id, handler);
        id
    }

    /// Remove a subscription; false when it was already gone.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.write();
        handlers.load_success.remove(id)
            || handlers.load_failure.remove(id)
            || handlers.unload_success.remove(id)
            || handlers.unload_failure.remove(id)
    }

    /// Unload every loaded scene, then forget all tracked state.
    ///
    /// Unload errors are logged. The sets are cleared whether or not the
    /// unloads have completed; their later callbacks change nothing.
    pub fn shutdown(&self) {
        let loaded: Vec<AssetAddress> = {
            let sets = self.inner.sets.lock();
            sets.loaded()
                .iter()
                .filter(|address| !sets.is_unloading(address))
                .cloned()
                .collect()
        };
        for address in &loaded {
            if let Err(err) = self.unload_scene(address, None) {
                tracing::warn!(address = %address, error = %err, "scene unload failed during shutdown");
            }
        }
        self.inner.sets.lock().clear();
        tracing::info!(unloaded = loaded.len(), "scene manager shut down");
    }
}

impl Inner {
    fn load_scene_succeeded(
        &self,
        address: &AssetAddress,
        scene: AssetHandle,
        duration: Duration,
        user_data: Option<UserData>,
    ) {
        if !self.sets.lock().finish_load(address, true) {
            tracing::debug!(address = %address, "load success for an untracked scene");
        }
        let handlers = self.handlers.read().load_success.snapshot();
        let fired = fire(&self.pool, &handlers, |args: &mut LoadSceneSuccessEventArgs| {
            args.fill(address.clone(), scene, duration, user_data);
        });
        if let Err(err) = fired {
            tracing::error!(address = %address, error = %err, "load scene success event lost");
        }
    }

    fn load_scene_failed(
        &self,
        address: &AssetAddress,
        status: LoadResourceStatus,
        message: &str,
        user_data: Option<UserData>,
    ) -> NotifyOutcome {
        self.sets.lock().finish_load(address, false);
        let handlers = self.handlers.read().load_failure.snapshot();
        if handlers.is_empty() {
            return NotifyOutcome::Unhandled(PipelineError::LoadFailed {
                address: address.clone(),
                status,
                message: message.to_owned(),
            });
        }
        match fire(&self.pool, &handlers, |args: &mut LoadSceneFailureEventArgs| {
            args.fill(address.clone(), status, message, user_data);
        }) {
            Ok(delivered) => NotifyOutcome::Delivered(delivered),
            Err(err) => NotifyOutcome::Unhandled(err.into()),
        }
    }

    fn unload_scene_succeeded(&self, address: &AssetAddress, user_data: Option<UserData>) {
        if !self.sets.lock().finish_unload(address, true) {
            tracing::debug!(address = %address, "unload success for an untracked scene");
        }
        let handlers = self.handlers.read().unload_success.snapshot();
        let fired = fire(&self.pool, &handlers, |args: &mut UnloadSceneSuccessEventArgs| {
            args.fill(address.clone(), user_data);
        });
        if let Err(err) = fired {
            tracing::error!(address = %address, error = %err, "unload scene success event lost");
        }
    }

    fn unload_scene_failed(
        &self,
        address: &AssetAddress,
        message: &str,
        user_data: Option<UserData>,
    ) -> NotifyOutcome {
        if self.sets.lock().finish_unload(address, false) {
            tracing::warn!(address = %address, message, "scene unload failed, scene kept as loaded");
        }
        let handlers = self.handlers.read().unload_failure.snapshot();
        if handlers.is_empty() {
            return NotifyOutcome::Unhandled(PipelineError::UnloadFailed {
                address: address.clone(),
                message: message.to_owned(),
            });
        }
        match fire(&self.pool, &handlers, |args: &mut UnloadSceneFailureEventArgs| {
            args.fill(address.clone(), message, user_data);
        }) {
            Ok(delivered) => NotifyOutcome::Delivered(delivered),
            Err(err) => NotifyOutcome::Unhandled(err.into()),
        }
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sets = self.inner.sets.lock();
        f.debug_struct("SceneManager")
            .field("loading", &sets.loading())
            .field("loaded", &sets.loaded())
            .field("unloading", &sets.unloading())
            .field("backend_set", &self.inner.backend.read().is_some())
            .finish_non_exhaustive()
    }
}
