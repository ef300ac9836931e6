//! Pooled scene event records and subscriber lists.
//!
//! A record is acquired from the reference pool for one firing, handed to each
//! subscriber by shared reference, and released as soon as the last subscriber
//! returns. Subscribers cannot keep it: they only ever see `&E`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{
    AssetAddress, AssetHandle, LoadResourceStatus, PipelineError, PoolError, Reference,
    ReferencePool, UserData,
};

/// Subscriber callback for events of type `E`.
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Identifies one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

/// Ordered subscriber list for one event type.
pub struct EventHandlers<E> {
    handlers: Vec<(HandlerId, EventHandler<E>)>,
}

impl<E> EventHandlers<E> {
    /// Empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append a subscriber.
    pub fn add(&mut self, id: HandlerId, handler: EventHandler<E>) {
        self.handlers.push((id, handler));
    }

    /// Remove a subscriber; false when `id` is not here.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// No subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Copy of the subscribers, for dispatch without holding a lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventHandler<E>> {
        self.handlers.iter().map(|(_, handler)| Arc::clone(handler)).collect()
    }
}

impl<E> Default for EventHandlers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventHandlers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("len", &self.handlers.len())
            .finish()
    }
}

/// Result of notifying subscribers of a failure.
#[derive(Debug)]
pub enum NotifyOutcome {
    /// At least one subscriber received the event.
    Delivered(usize),
    /// Nobody was subscribed; the failure is still the caller's problem.
    Unhandled(PipelineError),
}

impl NotifyOutcome {
    /// `Delivered(n)` as `Ok(n)`, `Unhandled(err)` as `Err(err)`.
    ///
    /// # Errors
    ///
    /// The unhandled failure.
    pub fn into_result(self) -> Result<usize, PipelineError> {
        match self {
            Self::Delivered(count) => Ok(count),
            Self::Unhandled(err) => Err(err),
        }
    }
}

/// Acquire a record, fill it, deliver it to every handler, release it.
///
/// Returns the number of handlers reached. No record is acquired when there
/// are no handlers.
pub(crate) fn fire<E, F>(
    pool: &ReferencePool,
    handlers: &[EventHandler<E>],
    fill: F,
) -> Result<usize, PoolError>
where
    E: Reference + Default,
    F: FnOnce(&mut E),
{
    if handlers.is_empty() {
        return Ok(0);
    }
    let mut args = pool.acquire::<E>()?;
    fill(&mut args);
    for handler in handlers {
        handler(&*args);
    }
    pool.release(args)?;
    Ok(handlers.len())
}

/// A scene finished loading.
#[derive(Default)]
pub struct LoadSceneSuccessEventArgs {
    address: AssetAddress,
    scene_asset: Option<AssetHandle>,
    duration: Duration,
    user_data: Option<UserData>,
}

impl LoadSceneSuccessEventArgs {
    pub(crate) fn fill(
        &mut self,
        address: AssetAddress,
        scene_asset: AssetHandle,
        duration: Duration,
        user_data: Option<UserData>,
    ) {
        self.address = address;
        self.scene_asset = Some(scene_asset);
        self.duration = duration;
        self.user_data = user_data;
    }

    /// Scene address.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Handle of the loaded scene.
    #[must_use]
    pub const fn scene_asset(&self) -> Option<&AssetHandle> {
        self.scene_asset.as_ref()
    }

    /// Time from agent start to completion.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Caller data of the load request.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

impl Reference for LoadSceneSuccessEventArgs {
    fn clear(&mut self) {
        self.address = AssetAddress::empty();
        self.scene_asset = None;
        self.duration = Duration::ZERO;
        self.user_data = None;
    }
}

/// A scene failed to load.
#[derive(Default)]
pub struct LoadSceneFailureEventArgs {
    address: AssetAddress,
    status: Option<LoadResourceStatus>,
    error_message: String,
    user_data: Option<UserData>,
}

impl LoadSceneFailureEventArgs {
    pub(crate) fn fill(
        &mut self,
        address: AssetAddress,
        status: LoadResourceStatus,
        error_message: &str,
        user_data: Option<UserData>,
    ) {
        self.address = address;
        self.status = Some(status);
        error_message.clone_into(&mut self.error_message);
        self.user_data = user_data;
    }

    /// Scene address.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Failure classification.
    #[must_use]
    pub const fn status(&self) -> Option<LoadResourceStatus> {
        self.status
    }

    /// Backend message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Caller data of the load request.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

impl Reference for LoadSceneFailureEventArgs {
    fn clear(&mut self) {
        self.address = AssetAddress::empty();
        self.status = None;
        self.error_message.clear();
        self.user_data = None;
    }
}

/// A scene finished unloading.
#[derive(Default)]
pub struct UnloadSceneSuccessEventArgs {
    address: AssetAddress,
    user_data: Option<UserData>,
}

impl UnloadSceneSuccessEventArgs {
    pub(crate) fn fill(&mut self, address: AssetAddress, user_data: Option<UserData>) {
        self.address = address;
        self.user_data = user_data;
    }

    /// Scene address.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Caller data of the unload request.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

impl Reference for UnloadSceneSuccessEventArgs {
    fn clear(&mut self) {
        self.address = AssetAddress::empty();
        self.user_data = None;
    }
}

/// A scene failed to unload and was rolled back to loaded.
#[derive(Default)]
pub struct UnloadSceneFailureEventArgs {
    address: AssetAddress,
    error_message: String,
    user_data: Option<UserData>,
}

impl UnloadSceneFailureEventArgs {
    pub(crate) fn fill(&mut self, address: AssetAddress, error_message: &str, user_data: Option<UserData>) {
        self.address = address;
        error_message.clone_into(&mut self.error_message);
        self.user_data = user_data;
    }

    /// Scene address.
    #[must_use]
    pub const fn address(&self) -> &AssetAddress {
        &self.address
    }

    /// Backend message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Caller data of the unload request.
    #[must_use]
    pub const fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

impl Reference for UnloadSceneFailureEventArgs {
    fn clear(&mut self) {
        self.address = AssetAddress::empty();
        self.error_message.clear();
        self.user_data = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_fire_without_handlers_acquires_nothing() {
        let pool = ReferencePool::new(true);
        let delivered = fire::<UnloadSceneSuccessEventArgs, _>(&pool, &[], |_| {}).unwrap();
        assert_eq!(delivered, 0);
        assert!(pool.info::<UnloadSceneSuccessEventArgs>().is_none());
    }

    #[test]
    fn test_fire_delivers_then_releases() {
        let pool = ReferencePool::new(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = EventHandlers::<UnloadSceneFailureEventArgs>::new();
        for id in 0..2 {
            let seen = Arc::clone(&seen);
            handlers.add(
                HandlerId(id),
                Arc::new(move |args: &UnloadSceneFailureEventArgs| {
                    seen.lock().push(format!("{} {}", args.address(), args.error_message()));
                }),
            );
        }

        let delivered = fire(&pool, &handlers.snapshot(), |args: &mut UnloadSceneFailureEventArgs| {
            args.fill(AssetAddress::new("pkg", "level1"), "busy", None);
        })
        .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(*seen.lock(), vec!["pkg/level1 busy".to_owned(); 2]);
        let info = pool.info::<UnloadSceneFailureEventArgs>().unwrap();
        assert_eq!(info.using_count, 0);
        assert_eq!(info.unused_count, 1);
    }

    #[test]
    fn test_released_records_keep_message_buffer() {
        let pool = ReferencePool::new(true);
        let message = "dependency pkg/shared.bundle failed to download".repeat(4);
        let mut args = pool.acquire::<LoadSceneFailureEventArgs>().unwrap();
        args.fill(
            AssetAddress::new("pkg", "level1"),
            LoadResourceStatus::DependencyError,
            &message,
            None,
        );
        let capacity = args.error_message.capacity();
        pool.release(args).unwrap();

        let reused = pool.acquire::<LoadSceneFailureEventArgs>().unwrap();
        assert!(reused.error_message().is_empty());
        assert!(reused.error_message.capacity() >= capacity);
        assert!(reused.address().is_empty());
        assert!(reused.status().is_none());
        pool.release(reused).unwrap();
    }

    #[test]
    fn test_released_success_record_drops_payload() {
        let pool = ReferencePool::new(true);
        let scene: AssetHandle = Arc::new("scene-root");
        let data: UserData = Arc::new(7_u32);
        let mut args = pool.acquire::<LoadSceneSuccessEventArgs>().unwrap();
        args.fill(
            AssetAddress::new("pkg", "level1"),
            Arc::clone(&scene),
            Duration::from_millis(12),
            Some(Arc::clone(&data)),
        );
        pool.release(args).unwrap();

        assert_eq!(Arc::strong_count(&scene), 1);
        assert_eq!(Arc::strong_count(&data), 1);
        let reused = pool.acquire::<LoadSceneSuccessEventArgs>().unwrap();
        assert!(reused.scene_asset().is_none());
        assert_eq!(reused.duration(), Duration::ZERO);
        pool.release(reused).unwrap();
    }

    #[test]
    fn test_remove_handler() {
        let mut handlers = EventHandlers::<LoadSceneSuccessEventArgs>::new();
        handlers.add(HandlerId(1), Arc::new(|_: &LoadSceneSuccessEventArgs| {}));
        handlers.add(HandlerId(2), Arc::new(|_: &LoadSceneSuccessEventArgs| {}));
        assert!(handlers.remove(HandlerId(1)));
        assert!(!handlers.remove(HandlerId(1)));
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn test_notify_outcome_into_result() {
        assert_eq!(NotifyOutcome::Delivered(3).into_result().unwrap(), 3);
        let err = NotifyOutcome::Unhandled(PipelineError::BackendNotSet)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, PipelineError::BackendNotSet));
    }
}
