//! Tests for configuration validation

use prometheus_asset_pipeline::config::{LoaderConfig, PipelineConfig, ReferencePoolConfig};

#[test]
fn test_loader_config_validation() {
    let valid = LoaderConfig {
        agent_count: 2,
        max_waiting_tasks: 16,
        default_priority: 0,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_loader_config_invalid_agent_count() {
    let invalid = LoaderConfig {
        agent_count: 0,
        max_waiting_tasks: 16,
        default_priority: 0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_loader_config_invalid_queue_depth() {
    let invalid = LoaderConfig {
        agent_count: 1,
        max_waiting_tasks: 0,
        default_priority: 0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pipeline_config_from_json() {
    let json = r#"{
        "loader": { "agent_count": 3, "max_waiting_tasks": 10, "default_priority": 2 },
        "reference_pool": { "strict_check": false }
    }"#;
    let cfg = PipelineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.loader.agent_count, 3);
    assert_eq!(cfg.loader.max_waiting_tasks, 10);
    assert_eq!(cfg.loader.default_priority, 2);
    assert_eq!(cfg.reference_pool, ReferencePoolConfig { strict_check: false });
}

#[test]
fn test_pipeline_config_partial_json_uses_defaults() {
    let cfg = PipelineConfig::from_json_str(r#"{ "loader": { "max_waiting_tasks": 7 } }"#).unwrap();
    assert_eq!(cfg.loader.max_waiting_tasks, 7);
    assert_eq!(cfg.loader.agent_count, LoaderConfig::default().agent_count);
    assert!(cfg.reference_pool.strict_check);
}

#[test]
fn test_pipeline_config_rejects_invalid_json() {
    let err = PipelineConfig::from_json_str(r#"{ "loader": { "agent_count": 0 } }"#).unwrap_err();
    assert!(err.contains("agent_count"), "{err}");
    let err = PipelineConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"), "{err}");
}

#[test]
fn test_pipeline_config_from_path() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("asset-pipeline-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "loader": { "agent_count": 1 } }"#).unwrap();

    let cfg = PipelineConfig::from_path(&path).unwrap();
    assert_eq!(cfg.loader.agent_count, 1);
    std::fs::remove_file(&path).unwrap();

    let err = PipelineConfig::from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("reading pipeline config"));
}
