//! Loading/loaded/unloading bookkeeping for tracked addresses.
//!
//! Every method here is a pure state transition; callers serialize access.
//! An address sits in at most one of the three sets at a time.

use serde::Serialize;

use super::address::AssetAddress;
use super::error::PipelineError;

/// Where an address currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Load in flight.
    Loading,
    /// Loaded and usable.
    Loaded,
    /// Unload in flight.
    Unloading,
}

/// Three disjoint address sets in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ResourceStateSets {
    loading: Vec<AssetAddress>,
    loaded: Vec<AssetAddress>,
    unloading: Vec<AssetAddress>,
}

impl ResourceStateSets {
    /// Empty sets.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loading: Vec::new(),
            loaded: Vec::new(),
            unloading: Vec::new(),
        }
    }

    /// Current state of an address; `None` when untracked.
    #[must_use]
    pub fn state_of(&self, address: &AssetAddress) -> Option<ResourceState> {
        if self.loading.contains(address) {
            Some(ResourceState::Loading)
        } else if self.loaded.contains(address) {
            Some(ResourceState::Loaded)
        } else if self.unloading.contains(address) {
            Some(ResourceState::Unloading)
        } else {
            None
        }
    }

    /// In the loading set.
    #[must_use]
    pub fn is_loading(&self, address: &AssetAddress) -> bool {
        self.loading.contains(address)
    }

    /// In the loaded set.
    #[must_use]
    pub fn is_loaded(&self, address: &AssetAddress) -> bool {
        self.loaded.contains(address)
    }

    /// In the unloading set.
    #[must_use]
    pub fn is_unloading(&self, address: &AssetAddress) -> bool {
        self.unloading.contains(address)
    }

    /// Loading addresses.
    #[must_use]
    pub fn loading(&self) -> &[AssetAddress] {
        &self.loading
    }

    /// Loaded addresses.
    #[must_use]
    pub fn loaded(&self) -> &[AssetAddress] {
        &self.loaded
    }

    /// Unloading addresses.
    #[must_use]
    pub fn unloading(&self) -> &[AssetAddress] {
        &self.unloading
    }

    /// All three sets empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loading.is_empty() && self.loaded.is_empty() && self.unloading.is_empty()
    }

    /// Check load preconditions and enter `loading`.
    ///
    /// # Errors
    ///
    /// `BeingUnloaded`, `BeingLoaded` or `AlreadyLoaded`, checked in that order.
    pub fn begin_load(&mut self, address: &AssetAddress) -> Result<(), PipelineError> {
        if self.is_unloading(address) {
            return Err(PipelineError::BeingUnloaded(address.clone()));
        }
        if self.is_loading(address) {
            return Err(PipelineError::BeingLoaded(address.clone()));
        }
        if self.is_loaded(address) {
            return Err(PipelineError::AlreadyLoaded(address.clone()));
        }
        self.loading.push(address.clone());
        Ok(())
    }

    /// Undo `begin_load` after a synchronous backend rejection.
    pub fn cancel_load(&mut self, address: &AssetAddress) {
        remove(&mut self.loading, address);
    }

    /// Leave `loading`; enter `loaded` when `succeeded`.
    ///
    /// Returns false, changing nothing, when the address was not loading.
    pub fn finish_load(&mut self, address: &AssetAddress, succeeded: bool) -> bool {
        if !remove(&mut self.loading, address) {
            return false;
        }
        if succeeded {
            self.loaded.push(address.clone());
        }
        true
    }

    /// Check unload preconditions and move `loaded` to `unloading`.
    ///
    /// # Errors
    ///
    /// `BeingUnloaded`, `BeingLoaded` or `NotLoaded`, checked in that order.
    pub fn begin_unload(&mut self, address: &AssetAddress) -> Result<(), PipelineError> {
        if self.is_unloading(address) {
            return Err(PipelineError::BeingUnloaded(address.clone()));
        }
        if self.is_loading(address) {
            return Err(PipelineError::BeingLoaded(address.clone()));
        }
        if !remove(&mut self.loaded, address) {
            return Err(PipelineError::NotLoaded(address.clone()));
        }
        self.unloading.push(address.clone());
        Ok(())
    }

    /// Leave `unloading`; roll back to `loaded` unless `succeeded`.
    ///
    /// Returns false, changing nothing, when the address was not unloading.
    pub fn finish_unload(&mut self, address: &AssetAddress, succeeded: bool) -> bool {
        if !remove(&mut self.unloading, address) {
            return false;
        }
        if !succeeded {
            self.loaded.push(address.clone());
        }
        true
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.loading.clear();
        self.loaded.clear();
        self.unloading.clear();
    }
}

fn remove(set: &mut Vec<AssetAddress>, address: &AssetAddress) -> bool {
    match set.iter().position(|tracked| tracked == address) {
        Some(index) => {
            set.remove(index);
            true
        }
        None => false,
    }
}
