//! Resource loader: waiting queue, load agents and completion routing.
//!
//! Requests are turned into pooled tasks and queued by priority. The owner
//! drives [`ResourceLoader::update`], which first routes every completion that
//! helpers have posted since the previous cycle, then hands waiting tasks to
//! idle agents. Task hooks and caller callbacks therefore always run on the
//! thread calling `update`, and never under a loader lock. Agent helpers are
//! called outside the locks too, so they may request further loads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::config::LoaderConfig;
use crate::core::agent::Completion;
use crate::core::{
    AssetAddress, AssetHandle, AssetType, HasAssetResult, LoadAssetCallbacks, LoadResourceAgent,
    LoadResourceAgentHelper, LoadResourceTask, LoadSceneCallbacks, PipelineError, ReferencePool,
    LoadResourceStatus, ResourceBackend, ResourceHelper, SerialCounter, UnloadCompletion,
    UnloadSceneCallbacks, UserData,
};
use crate::infra::WaitingTaskQueue;

const SHUTDOWN_MESSAGE: &str = "resource loader shut down";

/// Priority scheduler over a fixed set of load agents.
pub struct ResourceLoader {
    config: LoaderConfig,
    pool: Arc<ReferencePool>,
    serial: SerialCounter,
    helper: Arc<dyn ResourceHelper>,
    waiting: Mutex<WaitingTaskQueue>,
    agents: Mutex<Vec<LoadResourceAgent>>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    shut_down: AtomicBool,
}

impl ResourceLoader {
    /// Create a loader with no agents yet.
    pub fn new(config: LoaderConfig, pool: Arc<ReferencePool>, helper: Arc<dyn ResourceHelper>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        tracing::info!(
            max_waiting_tasks = config.max_waiting_tasks,
            default_priority = config.default_priority,
            "resource loader created"
        );
        Self {
            waiting: Mutex::new(WaitingTaskQueue::new(config.max_waiting_tasks)),
            config,
            pool,
            serial: SerialCounter::new(),
            helper,
            agents: Mutex::new(Vec::new()),
            sender,
            receiver,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Pool tasks and asset wrappers are drawn from.
    pub const fn pool(&self) -> &Arc<ReferencePool> {
        &self.pool
    }

    /// Add an agent driven by `helper`; returns its id.
    pub fn add_agent(&self, helper: Box<dyn LoadResourceAgentHelper>) -> usize {
        let mut agents = self.agents.lock();
        let id = agents.len();
        agents.push(LoadResourceAgent::new(id, helper, self.sender.clone()));
        tracing::debug!(agent_id = id, "load agent added");
        id
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.lock().len()
    }

    /// Agents without a task.
    pub fn free_agent_count(&self) -> usize {
        self.agents.lock().iter().filter(|agent| !agent.is_busy()).count()
    }

    /// Agents running a task.
    pub fn working_agent_count(&self) -> usize {
        self.agents.lock().iter().filter(|agent| agent.is_busy()).count()
    }

    /// Tasks waiting for an agent.
    pub fn waiting_task_count(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Serial id of the most recently accepted task, 0 if none.
    pub fn last_serial_id(&self) -> u64 {
        self.serial.last()
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Hand a loaded asset back to the helper.
    pub fn unload_asset(&self, asset: AssetHandle) {
        self.helper.unload_asset(asset);
    }

    fn check_accepting(&self) -> Result<(), PipelineError> {
        if self.is_shut_down() {
            return Err(PipelineError::ShutDown);
        }
        if self.agents.lock().is_empty() {
            return Err(PipelineError::NoAgents);
        }
        Ok(())
    }

    /// Create a task under the queue lock so the depth check and the push agree.
    fn enqueue<F>(&self, address: &AssetAddress, create: F) -> Result<(), PipelineError>
    where
        F: FnOnce(&ReferencePool, &SerialCounter) -> Result<Box<LoadResourceTask>, PipelineError>,
    {
        let mut waiting = self.waiting.lock();
        if waiting.is_full() {
            tracing::warn!(
                address = %address,
                max_waiting_tasks = waiting.max_depth(),
                "load rejected: waiting queue full"
            );
            return Err(PipelineError::QueueFull(waiting.max_depth()));
        }
        let task = create(&self.pool, &self.serial)?;
        tracing::debug!(
            serial_id = task.serial_id(),
            address = %address,
            priority = task.priority(),
            scene = task.is_scene(),
            "load task queued"
        );
        if let Err((err, task)) = waiting.push(task) {
            self.pool.release(task)?;
            return Err(err);
        }
        Ok(())
    }

    /// Route completions, then dispatch waiting tasks to idle agents.
    ///
    /// Every pending completion is processed even when one of them fails.
    ///
    /// # Errors
    ///
    /// The first unhandled failure of the cycle; later ones are logged.
    pub fn update(&self) -> Result<(), PipelineError> {
        if self.is_shut_down() {
            let dropped = self.receiver.try_iter().count();
            if dropped > 0 {
                tracing::debug!(dropped, "completions ignored after shutdown");
            }
            return Ok(());
        }

        let mut first_error = None;
        let mut record = |result: Result<(), PipelineError>| {
            if let Err(err) = result {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::error!(error = %err, "additional failure in update cycle");
                }
            }
        };

        while let Ok(completion) = self.receiver.try_recv() {
            record(self.complete(completion));
        }
        record(self.dispatch());

        first_error.map_or(Ok(()), Err)
    }

    fn complete(&self, completion: Completion) -> Result<(), PipelineError> {
        match completion {
            Completion::Load {
                agent_id,
                serial_id,
                outcome,
            } => {
                let detached = self.agents.lock().get_mut(agent_id).and_then(|agent| {
                    agent
                        .take_task(serial_id)
                        .map(|task| (task, agent.helper()))
                });
                let Some((task, helper)) = detached else {
                    tracing::warn!(agent_id, serial_id, "stale load completion ignored");
                    return Ok(());
                };
                helper.reset();
                LoadResourceAgent::report(agent_id, task, outcome, &self.pool)
            }
            Completion::UnloadScene {
                address,
                callbacks,
                user_data,
                outcome,
            } => match outcome {
                Ok(()) => {
                    tracing::debug!(address = %address, "scene unloaded");
                    callbacks.succeed(&address, user_data);
                    Ok(())
                }
                Err(message) => {
                    tracing::debug!(address = %address, message = %message, "scene unload failed");
                    callbacks.fail(&address, &message, user_data)
                }
            },
        }
    }

    /// Pair idle agents with waiting tasks under the locks, then call the
    /// helpers once both guards are dropped.
    fn dispatch(&self) -> Result<(), PipelineError> {
        let mut result = Ok(());
        let started = {
            let mut agents = self.agents.lock();
            let mut waiting = self.waiting.lock();
            let mut started = Vec::new();
            for agent in agents.iter_mut().filter(|agent| !agent.is_busy()) {
                let Some(task) = waiting.pop() else {
                    break;
                };
                match agent.start(task) {
                    Ok(load) => started.push(load),
                    Err(task) => {
                        if let Err((err, task)) = waiting.push(task) {
                            result = self.pool.release(task).map_err(PipelineError::from).and(Err(err));
                            break;
                        }
                    }
                }
            }
            started
        };
        for load in started {
            load.run();
        }
        result
    }

    /// Stop accepting work and fail every queued and running task.
    ///
    /// Each task's failure callback runs with [`LoadResourceStatus::Abandoned`],
    /// so a bound scene tracker leaves its loading state. Errors from those
    /// callbacks are logged, not returned. Completions arriving later are ignored.
    ///
    /// # Errors
    ///
    /// The first pool misuse hit while releasing; the rest are logged.
    pub fn shutdown(&self) -> Result<(), PipelineError> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let (running, helpers): (Vec<_>, Vec<_>) = self
            .agents
            .lock()
            .iter_mut()
            .filter_map(|agent| agent.abandon().map(|task| ((agent.id(), task), agent.helper())))
            .unzip();
        for helper in helpers {
            helper.reset();
        }
        let waiting = self.waiting.lock().drain();
        let released = running.len() + waiting.len();

        let mut first_error = None;
        let pending = running
            .into_iter()
            .chain(waiting.into_iter().map(|task| (usize::MAX, task)));
        for (agent_id, task) in pending {
            if let Err(err) = task.on_load_failure(agent_id, LoadResourceStatus::Abandoned, SHUTDOWN_MESSAGE) {
                tracing::debug!(
                    serial_id = task.serial_id(),
                    error = %err,
                    "abandoned task had no failure handler"
                );
            }
            if let Err(err) = self.pool.release(task) {
                tracing::error!(error = %err, "failed to release task on shutdown");
                first_error.get_or_insert(PipelineError::from(err));
            }
        }
        let dropped = self.receiver.try_iter().count();

        tracing::info!(released, dropped, "resource loader shut down");
        first_error.map_or(Ok(()), Err)
    }
}

impl ResourceBackend for ResourceLoader {
    fn has_asset(&self, address: &AssetAddress) -> Result<HasAssetResult, PipelineError> {
        if !address.is_valid() {
            return Err(PipelineError::InvalidAddress(address.clone()));
        }
        Ok(self.helper.has_asset(address))
    }

    fn load_asset(
        &self,
        address: &AssetAddress,
        asset_type: Option<AssetType>,
        priority: Option<i32>,
        callbacks: LoadAssetCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        if !address.is_valid() {
            return Err(PipelineError::InvalidAddress(address.clone()));
        }
        self.check_accepting()?;
        let priority = priority.unwrap_or(self.config.default_priority);
        self.enqueue(address, |pool, serial| {
            LoadResourceTask::create_asset(
                pool,
                serial,
                address.clone(),
                asset_type,
                priority,
                callbacks,
                user_data,
            )
            .map_err(PipelineError::from)
        })
    }

    fn load_scene(
        &self,
        address: &AssetAddress,
        priority: Option<i32>,
        callbacks: LoadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        if !address.is_valid() {
            return Err(PipelineError::InvalidAddress(address.clone()));
        }
        self.check_accepting()?;
        let priority = priority.unwrap_or(self.config.default_priority);
        self.enqueue(address, |pool, serial| {
            LoadResourceTask::create_scene(pool, serial, address.clone(), priority, callbacks, user_data)
                .map_err(PipelineError::from)
        })
    }

    fn unload_scene(
        &self,
        address: &AssetAddress,
        callbacks: UnloadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        if !address.is_valid() {
            return Err(PipelineError::InvalidAddress(address.clone()));
        }
        if self.is_shut_down() {
            return Err(PipelineError::ShutDown);
        }
        tracing::debug!(address = %address, "scene unload requested");
        let completion = UnloadCompletion::new(address.clone(), callbacks, user_data, self.sender.clone());
        self.helper.unload_scene(address, completion);
        Ok(())
    }
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("config", &self.config)
            .field("last_serial_id", &self.serial.last())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
