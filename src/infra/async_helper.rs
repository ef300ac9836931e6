//! Agent helper that runs an [`AssetSource`] future on a spawner.

use crate::core::{
    AssetSource, LoadCompletion, LoadRequest, LoadResourceAgentHelper, Spawn,
};

/// Bridges async fetching onto the agent/completion model.
///
/// Each `load` spawns one future that fetches through the source and completes
/// the handle from whatever thread the runtime polls it on. A future that panics
/// or is cancelled drops its handle, which fails the load as `Abandoned`.
#[derive(Clone)]
pub struct AsyncLoadHelper<S, Sp> {
    source: S,
    spawner: Sp,
}

impl<S, Sp> AsyncLoadHelper<S, Sp>
where
    S: AssetSource,
    Sp: Spawn + Send + 'static,
{
    /// Create a helper fetching through `source` on `spawner`.
    pub const fn new(source: S, spawner: Sp) -> Self {
        Self { source, spawner }
    }

    /// The wrapped source.
    pub const fn source(&self) -> &S {
        &self.source
    }
}

impl<S, Sp> LoadResourceAgentHelper for AsyncLoadHelper<S, Sp>
where
    S: AssetSource,
    Sp: Spawn + Send + 'static,
{
    fn load(&mut self, request: LoadRequest, completion: LoadCompletion) {
        let source = self.source.clone();
        self.spawner.spawn(async move {
            let serial_id = request.serial_id;
            match source.fetch(request).await {
                Ok(asset) => completion.succeed(asset),
                Err(failure) => {
                    tracing::debug!(serial_id, %failure, "async fetch failed");
                    completion.fail(failure.status, failure.message);
                }
            }
        });
    }
}

impl<S, Sp> std::fmt::Debug for AsyncLoadHelper<S, Sp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLoadHelper").finish_non_exhaustive()
    }
}
