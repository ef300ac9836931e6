//! Builders to construct a wired pipeline from configuration.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::core::{LoadResourceAgentHelper, PipelineError, ReferencePool, ResourceHelper};
use crate::resource::ResourceLoader;
use crate::scene::SceneManager;

/// Reference pool, loader and scene manager wired together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pool shared by tasks, asset wrappers and event records.
    pub pool: Arc<ReferencePool>,
    /// Scheduler; also the scene manager's backend.
    pub loader: Arc<ResourceLoader>,
    /// Scene state tracker.
    pub scenes: SceneManager,
}

impl Pipeline {
    /// Run one update cycle of the loader.
    ///
    /// # Errors
    ///
    /// The first unhandled failure of the cycle.
    pub fn update(&self) -> Result<(), PipelineError> {
        self.loader.update()
    }

    /// Unload scenes, then stop the loader.
    ///
    /// # Errors
    ///
    /// Pool misuse while releasing outstanding tasks.
    pub fn shutdown(&self) -> Result<(), PipelineError> {
        self.scenes.shutdown();
        self.loader.shutdown()?;
        self.pool.clear_all();
        Ok(())
    }
}

/// Build the reference pool described by `cfg`.
pub fn build_reference_pool(cfg: &PipelineConfig) -> Arc<ReferencePool> {
    Arc::new(ReferencePool::from_config(&cfg.reference_pool))
}

/// Build a loader with `cfg.loader.agent_count` agents, one helper per agent.
///
/// # Errors
///
/// Invalid configuration, or whatever the helper factory returns.
pub fn build_loader<FA>(
    cfg: &PipelineConfig,
    pool: Arc<ReferencePool>,
    resource_helper: Arc<dyn ResourceHelper>,
    mut agent_helper_factory: FA,
) -> Result<ResourceLoader, PipelineError>
where
    FA: FnMut(usize) -> Result<Box<dyn LoadResourceAgentHelper>, PipelineError>,
{
    cfg.validate().map_err(PipelineError::InvalidConfig)?;

    let loader = ResourceLoader::new(cfg.loader.clone(), pool, resource_helper);
    for index in 0..cfg.loader.agent_count {
        let helper = agent_helper_factory(index)?;
        loader.add_agent(helper);
    }
    Ok(loader)
}

/// Build the whole pipeline and wire the scene manager to the loader.
///
/// # Errors
///
/// Same as [`build_loader`].
pub fn build_pipeline<FA>(
    cfg: &PipelineConfig,
    resource_helper: Arc<dyn ResourceHelper>,
    agent_helper_factory: FA,
) -> Result<Pipeline, PipelineError>
where
    FA: FnMut(usize) -> Result<Box<dyn LoadResourceAgentHelper>, PipelineError>,
{
    let pool = build_reference_pool(cfg);
    let loader = Arc::new(build_loader(
        cfg,
        Arc::clone(&pool),
        resource_helper,
        agent_helper_factory,
    )?);
    let scenes = SceneManager::new(Arc::clone(&pool));
    scenes.set_resource_backend(Arc::clone(&loader) as Arc<dyn crate::core::ResourceBackend>);
    tracing::info!(agents = loader.agent_count(), "asset pipeline built");
    Ok(Pipeline { pool, loader, scenes })
}
