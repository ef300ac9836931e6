//! Load agents: the seam between a task and the external fetcher.
//!
//! An agent runs at most one task at a time. It hands the task's request to its
//! [`LoadResourceAgentHelper`] together with a one-shot [`LoadCompletion`]; the
//! helper may finish synchronously or from any other thread. Completions travel
//! over a channel and are routed back to the agent on the owner's update cycle.
//!
//! A completion handle that is dropped without reporting posts an
//! [`LoadResourceStatus::Abandoned`] failure, so a panicked or cancelled fetch
//! still frees its agent and reaches the caller's failure path.
//!
//! Helpers never run under the loader's locks: [`LoadResourceAgent::start`]
//! only reserves the agent and returns a [`StartedLoad`] the loader runs once
//! its guards are gone.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use super::address::AssetAddress;
use super::asset::{AssetHandle, AssetObject, AssetType, LoadResourceStatus, UserData};
use super::callbacks::UnloadSceneCallbacks;
use super::error::PipelineError;
use super::reference_pool::ReferencePool;
use super::task::LoadResourceTask;

/// What a helper needs to know to fetch a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Serial id of the task behind the request.
    pub serial_id: u64,
    /// Address to fetch.
    pub address: AssetAddress,
    /// Requested type, if any.
    pub asset_type: Option<AssetType>,
    /// Whether a scene is requested.
    pub is_scene: bool,
    /// Scheduling priority the task ran with.
    pub priority: i32,
}

impl LoadRequest {
    fn from_task(task: &LoadResourceTask) -> Self {
        Self {
            serial_id: task.serial_id(),
            address: task.address().clone(),
            asset_type: task.asset_type(),
            is_scene: task.is_scene(),
            priority: task.priority(),
        }
    }
}

/// Result reported by a helper.
pub enum HelperOutcome {
    /// Fetched and instantiated.
    Loaded(AssetHandle),
    /// Failed with a classification and message.
    Failed {
        /// Failure classification.
        status: LoadResourceStatus,
        /// Human-readable message.
        message: String,
    },
}

impl fmt::Debug for HelperOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(_) => f.write_str("Loaded(..)"),
            Self::Failed { status, message } => f
                .debug_struct("Failed")
                .field("status", status)
                .field("message", message)
                .finish(),
        }
    }
}

/// Message posted by completion handles into the loader's channel.
pub(crate) enum Completion {
    Load {
        agent_id: usize,
        serial_id: u64,
        outcome: HelperOutcome,
    },
    UnloadScene {
        address: AssetAddress,
        callbacks: UnloadSceneCallbacks,
        user_data: Option<UserData>,
        outcome: Result<(), String>,
    },
}

const DROPPED_MESSAGE: &str = "completion dropped without a report";

/// One-shot handle a helper uses to report the outcome of a load.
///
/// Dropping it unreported fails the load with `Abandoned`.
pub struct LoadCompletion {
    agent_id: usize,
    serial_id: u64,
    sender: Option<Sender<Completion>>,
}

impl LoadCompletion {
    /// Serial id of the task this completion belongs to.
    #[must_use]
    pub const fn serial_id(&self) -> u64 {
        self.serial_id
    }

    /// Report a loaded asset.
    pub fn succeed(mut self, asset: AssetHandle) {
        self.send(HelperOutcome::Loaded(asset));
    }

    /// Report a failure.
    pub fn fail(mut self, status: LoadResourceStatus, message: impl Into<String>) {
        self.send(HelperOutcome::Failed {
            status,
            message: message.into(),
        });
    }

    fn send(&mut self, outcome: HelperOutcome) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let message = Completion::Load {
            agent_id: self.agent_id,
            serial_id: self.serial_id,
            outcome,
        };
        if sender.send(message).is_err() {
            tracing::debug!(serial_id = self.serial_id, "loader gone, completion dropped");
        }
    }
}

impl Drop for LoadCompletion {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::warn!(
                agent_id = self.agent_id,
                serial_id = self.serial_id,
                "load completion dropped without a report"
            );
            self.send(HelperOutcome::Failed {
                status: LoadResourceStatus::Abandoned,
                message: DROPPED_MESSAGE.to_owned(),
            });
        }
    }
}

impl fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("agent_id", &self.agent_id)
            .field("serial_id", &self.serial_id)
            .finish_non_exhaustive()
    }
}

struct PendingUnload {
    callbacks: UnloadSceneCallbacks,
    user_data: Option<UserData>,
    sender: Sender<Completion>,
}

/// One-shot handle a resource helper uses to report the outcome of a scene unload.
///
/// Dropping it unreported fails the unload.
pub struct UnloadCompletion {
    address: AssetAddress,
    pending: Option<PendingUnload>,
}

impl UnloadCompletion {
    pub(crate) const fn new(
        address: AssetAddress,
        callbacks: UnloadSceneCallbacks,
        user_data: Option<UserData>,
        sender: Sender<Completion>,
    ) -> Self {
        Self {
            address,
            pending: Some(PendingUnload {
                callbacks,
                user_data,
                sender,
            }),
        }
    }

    /// Scene being unloaded.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Report a successful unload.
    pub fn succeed(mut self) {
        self.send(Ok(()));
    }

    /// Report a failed unload.
    pub fn fail(mut self, message: impl Into<String>) {
        self.send(Err(message.into()));
    }

    fn send(&mut self, outcome: Result<(), String>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let message = Completion::UnloadScene {
            address: self.address.clone(),
            callbacks: pending.callbacks,
            user_data: pending.user_data,
            outcome,
        };
        if pending.sender.send(message).is_err() {
            tracing::debug!(address = %self.address, "loader gone, unload completion dropped");
        }
    }
}

impl Drop for UnloadCompletion {
    fn drop(&mut self) {
        if self.pending.is_some() {
            tracing::warn!(address = %self.address, "unload completion dropped without a report");
            self.send(Err(DROPPED_MESSAGE.to_owned()));
        }
    }
}

impl fmt::Debug for UnloadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnloadCompletion")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// External fetcher bound to one agent.
pub trait LoadResourceAgentHelper: Send {
    /// Start fetching; report exactly once through `completion`.
    fn load(&mut self, request: LoadRequest, completion: LoadCompletion);

    /// Drop per-task state after a completion has been routed.
    fn reset(&mut self) {}
}

/// Shared access to an agent's helper, usable without holding the agent.
#[derive(Clone)]
pub struct HelperHandle(Arc<Mutex<Box<dyn LoadResourceAgentHelper>>>);

impl HelperHandle {
    fn new(helper: Box<dyn LoadResourceAgentHelper>) -> Self {
        Self(Arc::new(Mutex::new(helper)))
    }

    /// Run the helper's `reset`.
    pub fn reset(&self) {
        self.0.lock().reset();
    }
}

impl fmt::Debug for HelperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperHandle").finish_non_exhaustive()
    }
}

/// A load an agent has accepted but whose helper has not been called yet.
#[must_use = "the helper only runs when the load is run"]
pub struct StartedLoad {
    helper: HelperHandle,
    request: LoadRequest,
    completion: LoadCompletion,
}

impl StartedLoad {
    /// Request handed to the helper.
    pub const fn request(&self) -> &LoadRequest {
        &self.request
    }

    /// Call the helper.
    pub fn run(self) {
        let Self {
            helper,
            request,
            completion,
        } = self;
        helper.0.lock().load(request, completion);
    }
}

impl fmt::Debug for StartedLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartedLoad")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Executor that runs one task at a time through its helper.
pub struct LoadResourceAgent {
    id: usize,
    helper: HelperHandle,
    task: Option<Box<LoadResourceTask>>,
    sender: Sender<Completion>,
}

impl LoadResourceAgent {
    pub(crate) fn new(
        id: usize,
        helper: Box<dyn LoadResourceAgentHelper>,
        sender: Sender<Completion>,
    ) -> Self {
        Self {
            id,
            helper: HelperHandle::new(helper),
            task: None,
            sender,
        }
    }

    /// Agent id, unique within its loader.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Whether a task is running.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    /// Serial id of the running task.
    #[must_use]
    pub fn running_serial_id(&self) -> Option<u64> {
        self.task.as_ref().map(|task| task.serial_id())
    }

    /// Handle to this agent's helper.
    #[must_use]
    pub fn helper(&self) -> HelperHandle {
        self.helper.clone()
    }

    /// Reserve the agent for a task. A busy agent hands the task back untouched.
    ///
    /// The helper is not called until the returned load is run.
    ///
    /// # Errors
    ///
    /// Returns the task when the agent is already running one.
    pub fn start(&mut self, mut task: Box<LoadResourceTask>) -> Result<StartedLoad, Box<LoadResourceTask>> {
        if self.task.is_some() {
            return Err(task);
        }
        task.set_start_time(Instant::now());
        let request = LoadRequest::from_task(&task);
        let completion = LoadCompletion {
            agent_id: self.id,
            serial_id: request.serial_id,
            sender: Some(self.sender.clone()),
        };
        tracing::debug!(
            agent_id = self.id,
            serial_id = request.serial_id,
            address = %request.address,
            "agent started task"
        );
        self.task = Some(task);
        Ok(StartedLoad {
            helper: self.helper.clone(),
            request,
            completion,
        })
    }

    /// Detach the running task if `serial_id` matches it.
    ///
    /// The helper is not reset here; call [`HelperHandle::reset`] once no
    /// lock guarding the agent is held.
    pub fn take_task(&mut self, serial_id: u64) -> Option<Box<LoadResourceTask>> {
        self.task.take_if(|task| task.serial_id() == serial_id)
    }

    /// Detach the running task unconditionally.
    pub fn abandon(&mut self) -> Option<Box<LoadResourceTask>> {
        self.task.take()
    }

    /// Route an outcome into a detached task, then release it.
    ///
    /// Wrapper and task always go back to `pool`, even when the hook errors.
    ///
    /// # Errors
    ///
    /// The hook's error first, otherwise any pool misuse on release.
    pub fn report(
        agent_id: usize,
        mut task: Box<LoadResourceTask>,
        outcome: HelperOutcome,
        pool: &ReferencePool,
    ) -> Result<(), PipelineError> {
        let duration = task
            .start_time()
            .map_or(Duration::ZERO, |start| start.elapsed());
        task.set_done(true);

        let result = match outcome {
            HelperOutcome::Loaded(asset) => {
                let user_data = task.user_data().cloned();
                match AssetObject::create(pool, asset, task.is_scene(), user_data) {
                    Ok(object) => {
                        let delivered = task.on_load_success(agent_id, &object, duration);
                        delivered.and(pool.release(object).map_err(PipelineError::from))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            HelperOutcome::Failed { status, message } => {
                task.on_load_failure(agent_id, status, &message)
            }
        };

        let released = pool.release(task).map_err(PipelineError::from);
        result.and(released)
    }
}

impl fmt::Debug for LoadResourceAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadResourceAgent")
            .field("id", &self.id)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}
