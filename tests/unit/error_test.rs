//! Tests for error types

use prometheus_asset_pipeline::core::{AssetAddress, LoadResourceStatus, PipelineError, PoolError};

#[test]
fn test_precondition_messages_name_the_state() {
    let address = AssetAddress::new("pkg", "level1");
    assert_eq!(
        PipelineError::BeingUnloaded(address.clone()).to_string(),
        "asset 'pkg/level1' is being unloaded"
    );
    assert_eq!(
        PipelineError::BeingLoaded(address.clone()).to_string(),
        "asset 'pkg/level1' is being loaded"
    );
    assert_eq!(
        PipelineError::AlreadyLoaded(address.clone()).to_string(),
        "asset 'pkg/level1' is already loaded"
    );
    assert_eq!(
        PipelineError::NotLoaded(address).to_string(),
        "asset 'pkg/level1' is not loaded yet"
    );
}

#[test]
fn test_load_failed_error() {
    let err = PipelineError::LoadFailed {
        address: AssetAddress::new("pkg", "level1"),
        status: LoadResourceStatus::NetworkError,
        message: "timeout".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "load failure, asset 'pkg/level1', status 'NetworkError', error message 'timeout'"
    );
    assert!(!err.is_precondition());
}

#[test]
fn test_invalid_address_error() {
    let err = PipelineError::InvalidAddress(AssetAddress::new("", "level1"));
    assert_eq!(format!("{err}"), "asset address '/level1' is invalid");
}

#[test]
fn test_pool_error_is_transparent() {
    let err: PipelineError = PoolError::NotAcquired { type_name: "Foo" }.into();
    assert_eq!(
        format!("{err}"),
        "reference of type 'Foo' has been released already or was never acquired"
    );
}

#[test]
fn test_queue_full_error() {
    assert_eq!(
        format!("{}", PipelineError::QueueFull(8)),
        "waiting task queue is full (max 8)"
    );
}

#[test]
fn test_precondition_classification() {
    let address = AssetAddress::new("pkg", "a");
    assert!(PipelineError::BeingLoaded(address.clone()).is_precondition());
    assert!(PipelineError::NotLoaded(address).is_precondition());
    assert!(!PipelineError::BackendNotSet.is_precondition());
    assert!(!PipelineError::NoAgents.is_precondition());
}
