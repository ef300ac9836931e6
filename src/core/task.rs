//! Pooled load task descriptors.
//!
//! A [`LoadResourceTask`] is acquired from the [`ReferencePool`] for every
//! accepted load request, owned exclusively by the queue or agent currently
//! holding it, and released exactly once after its terminal hook has fired.
//! The asset and scene variants differ only in the callback set they carry, so
//! the kind is a tag on the callbacks rather than a separate type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::address::AssetAddress;
use super::asset::{AssetObject, AssetType, LoadResourceStatus, UserData};
use super::callbacks::{LoadAssetCallbacks, LoadSceneCallbacks};
use super::error::{PipelineError, PoolError};
use super::reference_pool::{Reference, ReferencePool};

const EMPTY_ASSET_MESSAGE: &str = "load reported success without an asset";

/// Monotonic source of task serial ids.
///
/// Ids start at 1 and are never reused for the lifetime of the counter.
#[derive(Debug, Default)]
pub struct SerialCounter {
    last: AtomicU64,
}

impl SerialCounter {
    /// Counter that has issued nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Issue the next id.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last id issued, 0 if none.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

/// Whether a task loads a plain asset or a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Plain asset.
    Asset,
    /// Scene.
    Scene,
}

/// Callback set of a task, tagged by kind.
#[derive(Clone)]
pub enum TaskCallbacks {
    /// Asset load callbacks.
    Asset(LoadAssetCallbacks),
    /// Scene load callbacks.
    Scene(LoadSceneCallbacks),
}

impl TaskCallbacks {
    /// Kind implied by the callback set.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Asset(_) => TaskKind::Asset,
            Self::Scene(_) => TaskKind::Scene,
        }
    }
}

/// One in-flight load request.
#[derive(Default)]
pub struct LoadResourceTask {
    serial_id: u64,
    address: AssetAddress,
    asset_type: Option<AssetType>,
    priority: i32,
    user_data: Option<UserData>,
    start_time: Option<Instant>,
    done: bool,
    callbacks: Option<TaskCallbacks>,
}

impl LoadResourceTask {
    /// Acquire and initialize an asset task.
    ///
    /// # Errors
    ///
    /// Propagates pool misuse.
    pub fn create_asset(
        pool: &ReferencePool,
        serial: &SerialCounter,
        address: AssetAddress,
        asset_type: Option<AssetType>,
        priority: i32,
        callbacks: LoadAssetCallbacks,
        user_data: Option<UserData>,
    ) -> Result<Box<Self>, PoolError> {
        let mut task = pool.acquire::<Self>()?;
        task.initialize(serial.next(), address, asset_type, priority, user_data);
        task.callbacks = Some(TaskCallbacks::Asset(callbacks));
        Ok(task)
    }

    /// Acquire and initialize a scene task.
    ///
    /// # Errors
    ///
    /// Propagates pool misuse.
    pub fn create_scene(
        pool: &ReferencePool,
        serial: &SerialCounter,
        address: AssetAddress,
        priority: i32,
        callbacks: LoadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<Box<Self>, PoolError> {
        let mut task = pool.acquire::<Self>()?;
        task.initialize(serial.next(), address, None, priority, user_data);
        task.callbacks = Some(TaskCallbacks::Scene(callbacks));
        Ok(task)
    }

    fn initialize(
        &mut self,
        serial_id: u64,
        address: AssetAddress,
        asset_type: Option<AssetType>,
        priority: i32,
        user_data: Option<UserData>,
    ) {
        debug_assert_eq!(self.serial_id, 0, "task initialized twice without clear");
        self.serial_id = serial_id;
        self.address = address;
        self.asset_type = asset_type;
        self.priority = priority;
        self.user_data = user_data;
    }

    /// Serial id, 0 on a cleared task.
    #[must_use]
    pub const fn serial_id(&self) -> u64 {
        self.serial_id
    }

    /// Address being loaded.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Requested asset type; always `None` for scenes.
    #[must_use]
    pub const fn asset_type(&self) -> Option<AssetType> {
        self.asset_type
    }

    /// Scheduling priority, higher runs first.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Caller data.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    /// When an agent started the task.
    #[must_use]
    pub const fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Record when an agent started the task.
    pub fn set_start_time(&mut self, start_time: Instant) {
        self.start_time = Some(start_time);
    }

    /// Whether the terminal hook has been reached.
    #[must_use]
    pub const fn done(&self) -> bool {
        self.done
    }

    /// Mark the terminal hook as reached.
    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    /// Kind of the task; `None` on a cleared task.
    #[must_use]
    pub fn kind(&self) -> Option<TaskKind> {
        self.callbacks.as_ref().map(TaskCallbacks::kind)
    }

    /// Whether the task loads a scene.
    #[must_use]
    pub fn is_scene(&self) -> bool {
        self.kind() == Some(TaskKind::Scene)
    }

    /// Deliver a loaded asset to the success callback.
    ///
    /// A wrapper without an asset is routed to the failure callback as an
    /// `AssetError` instead.
    ///
    /// # Errors
    ///
    /// Only for an empty wrapper: see [`Self::on_load_failure`].
    pub fn on_load_success(
        &self,
        agent_id: usize,
        asset: &AssetObject,
        duration: Duration,
    ) -> Result<(), PipelineError> {
        let Some(handle) = asset.asset() else {
            tracing::warn!(serial_id = self.serial_id, agent_id, "load success without an asset");
            return self.on_load_failure(agent_id, LoadResourceStatus::AssetError, EMPTY_ASSET_MESSAGE);
        };
        tracing::debug!(
            serial_id = self.serial_id,
            agent_id,
            address = %self.address,
            elapsed_ms = duration.as_millis(),
            "load task succeeded"
        );
        let user_data = self.user_data.clone();
        match &self.callbacks {
            Some(TaskCallbacks::Asset(callbacks)) => {
                (callbacks.success())(&self.address, handle.clone(), duration, user_data);
            }
            Some(TaskCallbacks::Scene(callbacks)) => {
                (callbacks.success())(&self.address, handle.clone(), duration, user_data);
            }
            None => tracing::warn!(serial_id = self.serial_id, "load success on a cleared task"),
        }
        Ok(())
    }

    /// Deliver a failure to the failure callback.
    ///
    /// # Errors
    ///
    /// The failure callback's own error, or `PipelineError::LoadFailed` when the
    /// task carries no failure callback.
    pub fn on_load_failure(
        &self,
        agent_id: usize,
        status: LoadResourceStatus,
        message: &str,
    ) -> Result<(), PipelineError> {
        tracing::debug!(
            serial_id = self.serial_id,
            agent_id,
            address = %self.address,
            %status,
            message,
            "load task failed"
        );
        let user_data = self.user_data.clone();
        let failure = match &self.callbacks {
            Some(TaskCallbacks::Asset(callbacks)) => callbacks.failure().cloned(),
            Some(TaskCallbacks::Scene(callbacks)) => callbacks.failure().cloned(),
            None => None,
        };
        match failure {
            Some(failure) => failure(&self.address, status, message, user_data),
            None => Err(PipelineError::LoadFailed {
                address: self.address.clone(),
                status,
                message: message.to_owned(),
            }),
        }
    }
}

impl Reference for LoadResourceTask {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for LoadResourceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadResourceTask")
            .field("serial_id", &self.serial_id)
            .field("address", &self.address)
            .field("kind", &self.kind())
            .field("asset_type", &self.asset_type)
            .field("priority", &self.priority)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
