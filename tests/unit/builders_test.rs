//! Tests for builder modules

use prometheus_asset_pipeline::builders::{build_loader, build_pipeline, build_reference_pool};
use prometheus_asset_pipeline::config::{LoaderConfig, PipelineConfig, ReferencePoolConfig};
use prometheus_asset_pipeline::core::{
    AssetAddress, AssetHandle, HasAssetResult, LoadCompletion, LoadRequest, LoadResourceAgentHelper,
    PipelineError, ResourceHelper, UnloadCompletion,
};
use std::sync::Arc;

struct IdleHelper;

impl LoadResourceAgentHelper for IdleHelper {
    fn load(&mut self, _request: LoadRequest, _completion: LoadCompletion) {}
}

struct NoPackage;

impl ResourceHelper for NoPackage {
    fn has_asset(&self, _address: &AssetAddress) -> HasAssetResult {
        HasAssetResult::NotExist
    }

    fn unload_scene(&self, _address: &AssetAddress, completion: UnloadCompletion) {
        completion.succeed();
    }

    fn unload_asset(&self, _asset: AssetHandle) {}
}

fn config(agent_count: usize, strict_check: bool) -> PipelineConfig {
    PipelineConfig {
        loader: LoaderConfig {
            agent_count,
            max_waiting_tasks: 8,
            default_priority: 0,
        },
        reference_pool: ReferencePoolConfig { strict_check },
    }
}

#[test]
fn test_build_reference_pool_honors_strict_flag() {
    assert!(build_reference_pool(&config(1, true)).strict_check());
    assert!(!build_reference_pool(&config(1, false)).strict_check());
}

#[test]
fn test_build_loader_creates_agents() {
    let cfg = config(3, true);
    let mut indices = Vec::new();
    let loader = build_loader(&cfg, build_reference_pool(&cfg), Arc::new(NoPackage), |index| {
        indices.push(index);
        Ok(Box::new(IdleHelper) as Box<dyn LoadResourceAgentHelper>)
    })
    .unwrap();
    assert_eq!(loader.agent_count(), 3);
    assert_eq!(loader.free_agent_count(), 3);
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_build_loader_rejects_invalid_config() {
    let cfg = config(0, true);
    let err = build_loader(&cfg, build_reference_pool(&cfg), Arc::new(NoPackage), |_| {
        Ok(Box::new(IdleHelper) as Box<dyn LoadResourceAgentHelper>)
    })
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn test_build_pipeline_propagates_factory_error() {
    let err = build_pipeline(&config(2, true), Arc::new(NoPackage), |_| {
        Err(PipelineError::InvalidConfig("no fetcher".into()))
    })
    .unwrap_err();
    assert!(err.to_string().contains("no fetcher"));
}

#[test]
fn test_build_pipeline_wires_scene_backend() {
    let pipeline = build_pipeline(&config(1, true), Arc::new(NoPackage), |_| {
        Ok(Box::new(IdleHelper) as Box<dyn LoadResourceAgentHelper>)
    })
    .unwrap();
    let level = AssetAddress::new("pkg", "level1");

    assert!(!pipeline.scenes.has_scene(&level).unwrap());
    pipeline.scenes.load_scene(&level, None, None).unwrap();
    assert_eq!(pipeline.loader.waiting_task_count(), 1);
    pipeline.shutdown().unwrap();
}
