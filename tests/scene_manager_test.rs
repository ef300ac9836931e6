//! Integration tests for SceneManager
//!
//! These tests drive the manager against a scripted backend that parks every
//! request until the test completes it, covering:
//! - Load/unload preconditions and state transitions
//! - Event payloads and pooled event record reuse
//! - Fail-loud behavior without subscribers
//! - Unload rollback
//! - Out-of-order completion
//! - Shutdown

use parking_lot::Mutex;
use prometheus_asset_pipeline::core::{
    AssetAddress, AssetHandle, AssetType, HasAssetResult, LoadAssetCallbacks, LoadResourceStatus,
    LoadSceneCallbacks, PipelineError, ReferencePool, ResourceBackend, UnloadSceneCallbacks,
    UserData,
};
use prometheus_asset_pipeline::scene::{LoadSceneSuccessEventArgs, SceneManager};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// SCRIPTED BACKEND
// ============================================================================

struct PendingLoad {
    address: AssetAddress,
    callbacks: LoadSceneCallbacks,
    user_data: Option<UserData>,
}

struct PendingUnload {
    address: AssetAddress,
    callbacks: UnloadSceneCallbacks,
    user_data: Option<UserData>,
}

#[derive(Default)]
struct ScriptedBackend {
    loads: Mutex<Vec<PendingLoad>>,
    unloads: Mutex<Vec<PendingUnload>>,
}

impl ScriptedBackend {
    fn take_load(&self, address: &AssetAddress) -> PendingLoad {
        let mut loads = self.loads.lock();
        let index = loads
            .iter()
            .position(|pending| &pending.address == address)
            .expect("no pending load for address");
        loads.remove(index)
    }

    fn take_unload(&self, address: &AssetAddress) -> PendingUnload {
        let mut unloads = self.unloads.lock();
        let index = unloads
            .iter()
            .position(|pending| &pending.address == address)
            .expect("no pending unload for address");
        unloads.remove(index)
    }

    fn succeed_load(&self, address: &AssetAddress, scene: AssetHandle, duration: Duration) {
        let pending = self.take_load(address);
        (pending.callbacks.success())(&pending.address, scene, duration, pending.user_data);
    }

    fn fail_load(
        &self,
        address: &AssetAddress,
        status: LoadResourceStatus,
        message: &str,
    ) -> Result<(), PipelineError> {
        let pending = self.take_load(address);
        let failure = pending.callbacks.failure().expect("scene callbacks carry a failure hook");
        failure(&pending.address, status, message, pending.user_data)
    }

    fn succeed_unload(&self, address: &AssetAddress) {
        let pending = self.take_unload(address);
        pending.callbacks.succeed(&pending.address, pending.user_data);
    }

    fn fail_unload(&self, address: &AssetAddress, message: &str) -> Result<(), PipelineError> {
        let pending = self.take_unload(address);
        pending.callbacks.fail(&pending.address, message, pending.user_data)
    }

    fn pending_unloads(&self) -> Vec<AssetAddress> {
        self.unloads.lock().iter().map(|p| p.address.clone()).collect()
    }
}

impl ResourceBackend for ScriptedBackend {
    fn has_asset(&self, address: &AssetAddress) -> Result<HasAssetResult, PipelineError> {
        Ok(if address.location().starts_with("missing") {
            HasAssetResult::NotExist
        } else {
            HasAssetResult::AssetOnDisk
        })
    }

    fn load_asset(
        &self,
        _address: &AssetAddress,
        _asset_type: Option<AssetType>,
        _priority: Option<i32>,
        _callbacks: LoadAssetCallbacks,
        _user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        unreachable!("scene manager never loads plain assets")
    }

    fn load_scene(
        &self,
        address: &AssetAddress,
        _priority: Option<i32>,
        callbacks: LoadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        self.loads.lock().push(PendingLoad {
            address: address.clone(),
            callbacks,
            user_data,
        });
        Ok(())
    }

    fn unload_scene(
        &self,
        address: &AssetAddress,
        callbacks: UnloadSceneCallbacks,
        user_data: Option<UserData>,
    ) -> Result<(), PipelineError> {
        self.unloads.lock().push(PendingUnload {
            address: address.clone(),
            callbacks,
            user_data,
        });
        Ok(())
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn setup() -> (SceneManager, Arc<ScriptedBackend>, Arc<ReferencePool>) {
    let pool = Arc::new(ReferencePool::new(true));
    let backend = Arc::new(ScriptedBackend::default());
    let scenes = SceneManager::new(Arc::clone(&pool));
    scenes.set_resource_backend(Arc::clone(&backend) as Arc<dyn ResourceBackend>);
    (scenes, backend, pool)
}

fn addr(location: &str) -> AssetAddress {
    AssetAddress::new("pkg", location)
}

fn scene_handle() -> AssetHandle {
    Arc::new(String::from("scene"))
}

// ============================================================================
// PRECONDITIONS
// ============================================================================

#[test]
fn test_double_load_rejected() {
    let (scenes, _backend, _pool) = setup();
    let a = addr("level1");

    scenes.load_scene(&a, None, None).unwrap();
    let err = scenes.load_scene(&a, None, None).unwrap_err();

    assert!(matches!(err, PipelineError::BeingLoaded(_)));
    assert!(err.is_precondition());
    assert_eq!(scenes.loading_scene_addresses(), vec![a]);
}

#[test]
fn test_load_and_unload_preconditions() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");

    assert!(matches!(scenes.unload_scene(&a, None), Err(PipelineError::NotLoaded(_))));

    scenes.load_scene(&a, None, None).unwrap();
    assert!(matches!(scenes.unload_scene(&a, None), Err(PipelineError::BeingLoaded(_))));

    backend.succeed_load(&a, scene_handle(), Duration::ZERO);
    assert!(matches!(scenes.load_scene(&a, None, None), Err(PipelineError::AlreadyLoaded(_))));

    scenes.unload_scene(&a, None).unwrap();
    assert!(matches!(scenes.load_scene(&a, None, None), Err(PipelineError::BeingUnloaded(_))));
    assert!(matches!(scenes.unload_scene(&a, None), Err(PipelineError::BeingUnloaded(_))));
}

#[test]
fn test_invalid_address_rejected_before_state() {
    let (scenes, _backend, _pool) = setup();
    let invalid = AssetAddress::new("", "level1");

    assert!(matches!(
        scenes.load_scene(&invalid, None, None),
        Err(PipelineError::InvalidAddress(_))
    ));
    assert!(matches!(
        scenes.unload_scene(&invalid, None),
        Err(PipelineError::InvalidAddress(_))
    ));
    assert!(scenes.loading_scene_addresses().is_empty());
}

#[test]
fn test_has_scene_delegates_to_backend() {
    let (scenes, _backend, _pool) = setup();
    assert!(scenes.has_scene(&addr("level1")).unwrap());
    assert!(!scenes.has_scene(&addr("missing-level")).unwrap());
}

// ============================================================================
// LIFECYCLE AND EVENTS
// ============================================================================

#[test]
fn test_full_lifecycle() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");

    scenes.load_scene(&a, Some(3), None).unwrap();
    assert!(scenes.scene_is_loading(&a).unwrap());

    backend.succeed_load(&a, scene_handle(), Duration::from_millis(12));
    assert!(scenes.scene_is_loaded(&a).unwrap());
    assert!(!scenes.scene_is_loading(&a).unwrap());
    assert!(!scenes.scene_is_unloading(&a).unwrap());

    scenes.unload_scene(&a, None).unwrap();
    assert!(scenes.scene_is_unloading(&a).unwrap());
    assert!(!scenes.scene_is_loaded(&a).unwrap());

    backend.succeed_unload(&a);
    assert!(!scenes.scene_is_unloading(&a).unwrap());
    assert!(scenes.loaded_scene_addresses().is_empty());
}

#[test]
fn test_success_event_payload_and_record_reuse() {
    let (scenes, backend, pool) = setup();
    let a = addr("level1");
    let handle = scene_handle();
    let expected_handle = Arc::clone(&handle);
    let user_data: UserData = Arc::new(42_u32);
    let record_address = Arc::new(Mutex::new(None));

    let seen = Arc::clone(&record_address);
    let expected = a.clone();
    scenes.on_load_scene_success(move |args: &LoadSceneSuccessEventArgs| {
        assert_eq!(args.address(), &expected);
        assert!(Arc::ptr_eq(args.scene_asset().unwrap(), &expected_handle));
        assert_eq!(args.duration(), Duration::from_millis(25));
        assert_eq!(args.user_data().unwrap().downcast_ref::<u32>(), Some(&42));
        *seen.lock() = Some(std::ptr::from_ref(args).addr());
    });

    scenes.load_scene(&a, None, Some(user_data)).unwrap();
    backend.succeed_load(&a, handle, Duration::from_millis(25));

    let info = pool.info::<LoadSceneSuccessEventArgs>().unwrap();
    assert_eq!(info.using_count, 0);
    assert_eq!(info.unused_count, 1);

    // The next acquisition hands back the same record, already cleared.
    let record = pool.acquire::<LoadSceneSuccessEventArgs>().unwrap();
    assert_eq!(Some(std::ptr::from_ref(&*record).addr()), *record_address.lock());
    assert!(record.address().is_empty());
    assert!(record.scene_asset().is_none());
    assert_eq!(record.duration(), Duration::ZERO);
    assert!(record.user_data().is_none());
    pool.release(record).unwrap();
}

#[test]
fn test_failure_without_subscriber_is_fatal() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");

    scenes.load_scene(&a, None, None).unwrap();
    let err = backend
        .fail_load(&a, LoadResourceStatus::NetworkError, "timeout")
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("level1"), "{message}");
    assert!(message.contains("timeout"), "{message}");
    assert!(matches!(
        err,
        PipelineError::LoadFailed {
            status: LoadResourceStatus::NetworkError,
            ..
        }
    ));
    assert!(!scenes.scene_is_loaded(&a).unwrap());
    assert!(!scenes.scene_is_loading(&a).unwrap());
}

#[test]
fn test_failure_with_subscriber_is_delivered() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    scenes.on_load_scene_failure(move |args| {
        sink.lock()
            .push((args.address().clone(), args.status(), args.error_message().to_owned()));
    });

    scenes.load_scene(&a, None, None).unwrap();
    backend
        .fail_load(&a, LoadResourceStatus::DependencyError, "shader missing")
        .unwrap();

    assert_eq!(
        *failures.lock(),
        vec![(
            a.clone(),
            Some(LoadResourceStatus::DependencyError),
            "shader missing".to_owned()
        )]
    );
    // Failed loads leave no trace, so the caller may retry.
    scenes.load_scene(&a, None, None).unwrap();
}

#[test]
fn test_subscriber_may_reenter_manager() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    let retry = scenes.clone();
    scenes.on_load_scene_failure(move |args| {
        retry.load_scene(args.address(), None, None).unwrap();
    });

    scenes.load_scene(&a, None, None).unwrap();
    backend.fail_load(&a, LoadResourceStatus::NotReady, "not yet").unwrap();

    assert!(scenes.scene_is_loading(&a).unwrap());
}

#[test]
fn test_unload_failure_rolls_back() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    scenes.load_scene(&a, None, None).unwrap();
    backend.succeed_load(&a, scene_handle(), Duration::ZERO);

    // Unhandled: reported as an error, state rolled back.
    scenes.unload_scene(&a, None).unwrap();
    let err = backend.fail_unload(&a, "scene busy").unwrap_err();
    assert!(matches!(err, PipelineError::UnloadFailed { .. }));
    assert!(scenes.scene_is_loaded(&a).unwrap());

    // Handled: event delivered, the rolled-back scene can be unloaded again.
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    scenes.on_unload_scene_failure(move |args| sink.lock().push(args.error_message().to_owned()));
    scenes.unload_scene(&a, None).unwrap();
    backend.fail_unload(&a, "still busy").unwrap();
    assert_eq!(*messages.lock(), vec!["still busy".to_owned()]);
    assert!(scenes.scene_is_loaded(&a).unwrap());

    scenes.unload_scene(&a, None).unwrap();
    backend.succeed_unload(&a);
    assert!(!scenes.scene_is_loaded(&a).unwrap());
}

#[test]
fn test_unload_success_event() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    let unloaded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&unloaded);
    scenes.on_unload_scene_success(move |args| {
        let tag = args.user_data().and_then(|d| d.downcast_ref::<&str>().copied());
        sink.lock().push((args.address().clone(), tag));
    });

    scenes.load_scene(&a, None, None).unwrap();
    backend.succeed_load(&a, scene_handle(), Duration::ZERO);
    scenes.unload_scene(&a, Some(Arc::new("bye") as UserData)).unwrap();
    backend.succeed_unload(&a);

    assert_eq!(*unloaded.lock(), vec![(a, Some("bye"))]);
}

// ============================================================================
// ORDERING AND SHUTDOWN
// ============================================================================

#[test]
fn test_out_of_order_completion() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level-a");
    let b = addr("level-b");
    let loaded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&loaded);
    scenes.on_load_scene_success(move |args| {
        let tag = *args.user_data().unwrap().downcast_ref::<char>().unwrap();
        sink.lock().push((args.address().clone(), tag));
    });

    scenes.load_scene(&a, None, Some(Arc::new('a') as UserData)).unwrap();
    scenes.load_scene(&b, None, Some(Arc::new('b') as UserData)).unwrap();

    backend.succeed_load(&b, scene_handle(), Duration::ZERO);
    assert!(scenes.scene_is_loaded(&b).unwrap());
    assert!(scenes.scene_is_loading(&a).unwrap());

    backend.succeed_load(&a, scene_handle(), Duration::ZERO);
    assert_eq!(scenes.loaded_scene_addresses(), vec![b.clone(), a.clone()]);
    assert_eq!(*loaded.lock(), vec![(b, 'b'), (a, 'a')]);
}

#[test]
fn test_shutdown_unloads_and_clears() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    let pending = addr("level2");

    scenes.load_scene(&a, None, None).unwrap();
    backend.succeed_load(&a, scene_handle(), Duration::ZERO);
    scenes.load_scene(&pending, None, None).unwrap();

    scenes.shutdown();

    assert_eq!(backend.pending_unloads(), vec![a.clone()]);
    assert!(scenes.loaded_scene_addresses().is_empty());
    assert!(scenes.loading_scene_addresses().is_empty());
    assert!(scenes.unloading_scene_addresses().is_empty());

    // Late completions find nothing to update.
    backend.succeed_unload(&a);
    backend.succeed_load(&pending, scene_handle(), Duration::ZERO);
    assert!(scenes.loaded_scene_addresses().is_empty());
}

#[test]
fn test_callbacks_outlive_manager() {
    let (scenes, backend, _pool) = setup();
    let a = addr("level1");
    scenes.load_scene(&a, None, None).unwrap();
    drop(scenes);

    backend.succeed_load(&a, scene_handle(), Duration::ZERO);
}
