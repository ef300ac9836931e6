//! Type-keyed reference pool.
//!
//! Short-lived records (load tasks, event arguments, asset wrappers) are checked
//! out of a [`ReferencePool`] and checked back in once their owner is done with
//! them, instead of being allocated per request.
//!
//! # Design
//!
//! - One collection per concrete type, keyed by [`TypeId`], created lazily on
//!   first acquisition and never pre-sized
//! - `RwLock` on the type map (read-heavy), one `Mutex` per collection so
//!   unrelated types never contend
//! - Release validates before it clears: unknown types, declared/concrete type
//!   mismatches and double releases are reported as [`PoolError`]
//!
//! ```
//! use prometheus_asset_pipeline::core::{Reference, ReferencePool};
//!
//! #[derive(Default)]
//! struct Scratch {
//!     bytes: Vec<u8>,
//! }
//!
//! impl Reference for Scratch {
//!     fn clear(&mut self) {
//!         self.bytes.clear();
//!     }
//! }
//!
//! let pool = ReferencePool::new(true);
//! let mut scratch = pool.acquire::<Scratch>()?;
//! scratch.bytes.extend_from_slice(b"payload");
//! pool.release(scratch)?;
//!
//! let reused = pool.acquire::<Scratch>()?;
//! assert!(reused.bytes.is_empty());
//! # pool.release(reused)?;
//! # Ok::<(), prometheus_asset_pipeline::core::PoolError>(())
//! ```

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::error::PoolError;

/// Object-safe access to the concrete type behind a pooled reference.
///
/// Implemented for every `'static + Send` type; pooled types never implement it
/// by hand.
pub trait IntoAny: Any + Send {
    /// Borrow as `&dyn Any` of the concrete type.
    fn as_any(&self) -> &dyn Any;
    /// Convert a boxed reference into a boxed `Any` of the concrete type.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send> IntoAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A type whose instances can live in a [`ReferencePool`].
///
/// Acquisition additionally requires `Default`, which is the parameterless
/// construction path for a collection that has no unused instance.
pub trait Reference: IntoAny {
    /// Reset every field to its initial value and drop held references.
    fn clear(&mut self);
}

/// Statistics snapshot for one pooled type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePoolInfo {
    /// Concrete type name.
    pub type_name: &'static str,
    /// Instances sitting in the pool, ready for reuse.
    pub unused_count: usize,
    /// Instances currently checked out.
    pub using_count: usize,
    /// Total successful acquisitions.
    pub acquire_count: u64,
    /// Total successful releases.
    pub release_count: u64,
    /// Total instances constructed because the pool was empty.
    pub create_count: u64,
}

/// Type-erased view of one typed collection.
trait Collection: Send + Sync {
    fn release_boxed(&self, reference: Box<dyn Reference>, strict: bool) -> Result<(), PoolError>;
    fn info(&self) -> ReferencePoolInfo;
    fn drop_unused(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

struct CollectionState<T> {
    unused: Vec<Box<T>>,
    /// Addresses of checked-out instances, maintained in strict mode only.
    checked_out: HashSet<usize>,
    using_count: usize,
    acquire_count: u64,
    release_count: u64,
    create_count: u64,
}

struct ReferenceCollection<T> {
    type_name: &'static str,
    state: Mutex<CollectionState<T>>,
}

/// Zero-sized boxes share one dangling address, so identity tracking is
/// meaningless for them; only the checked-out count applies.
const fn tracks_identity<T>() -> bool {
    std::mem::size_of::<T>() != 0
}

fn address_of<T>(reference: &T) -> usize {
    std::ptr::from_ref(reference).addr()
}

impl<T: Reference> ReferenceCollection<T> {
    fn new() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            state: Mutex::new(CollectionState {
                unused: Vec::new(),
                checked_out: HashSet::new(),
                using_count: 0,
                acquire_count: 0,
                release_count: 0,
                create_count: 0,
            }),
        }
    }

    fn acquire(&self, strict: bool) -> Box<T>
    where
        T: Default,
    {
        let mut state = self.state.lock();
        let reference = if let Some(reference) = state.unused.pop() {
            reference
        } else {
            state.create_count += 1;
            Box::<T>::default()
        };
        state.using_count += 1;
        state.acquire_count += 1;
        if strict && tracks_identity::<T>() {
            state.checked_out.insert(address_of(&*reference));
        }
        reference
    }

    fn release(&self, mut reference: Box<T>, strict: bool) -> Result<(), PoolError> {
        {
            let mut state = self.state.lock();
            let known = !strict
                || !tracks_identity::<T>()
                || state.checked_out.remove(&address_of(&*reference));
            if state.using_count == 0 || !known {
                return Err(PoolError::NotAcquired {
                    type_name: self.type_name,
                });
            }
            state.using_count -= 1;
        }

        // The releasing thread owns the instance exclusively, so the reset can
        // run without holding the collection lock.
        reference.clear();

        let mut state = self.state.lock();
        state.release_count += 1;
        state.unused.push(reference);
        Ok(())
    }
}

impl<T: Reference> Collection for ReferenceCollection<T> {
    fn release_boxed(&self, reference: Box<dyn Reference>, strict: bool) -> Result<(), PoolError> {
        let found = (*reference).type_name();
        let reference = reference
            .into_any()
            .downcast::<T>()
            .map_err(|_| PoolError::TypeMismatch {
                expected: self.type_name,
                found,
            })?;
        self.release(reference, strict)
    }

    fn info(&self) -> ReferencePoolInfo {
        let state = self.state.lock();
        ReferencePoolInfo {
            type_name: self.type_name,
            unused_count: state.unused.len(),
            using_count: state.using_count,
            acquire_count: state.acquire_count,
            release_count: state.release_count,
            create_count: state.create_count,
        }
    }

    fn drop_unused(&self) -> usize {
        let unused = std::mem::take(&mut self.state.lock().unused);
        unused.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry of reusable instances keyed by concrete type.
///
/// Shared through an `Arc`; every operation takes `&self`.
pub struct ReferencePool {
    collections: RwLock<HashMap<TypeId, Arc<dyn Collection>>>,
    strict_check: bool,
}

impl ReferencePool {
    /// Create an empty pool.
    ///
    /// With `strict_check` the pool tracks the identity of every checked-out
    /// instance, so releasing an instance that is not checked out is reported
    /// even while other instances of the same type are.
    #[must_use]
    pub fn new(strict_check: bool) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            strict_check,
        }
    }

    /// Create a pool from configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::ReferencePoolConfig) -> Self {
        Self::new(config.strict_check)
    }

    /// Whether identity tracking is enabled.
    #[must_use]
    pub const fn strict_check(&self) -> bool {
        self.strict_check
    }

    /// Number of types that have a collection.
    #[must_use]
    pub fn count(&self) -> usize {
        self.collections.read().len()
    }

    /// Check out an instance of `T`, reusing an unused one when available.
    ///
    /// The instance is either freshly constructed through `Default` or was
    /// cleared when it was released, so callers always see initial state.
    ///
    /// # Errors
    ///
    /// `PoolError::TypeMismatch` if the collection registered for `T`'s type id
    /// does not hold `T`, which cannot happen through this API.
    pub fn acquire<T: Reference + Default>(&self) -> Result<Box<T>, PoolError> {
        let collection = self.collection_or_insert::<T>();
        let typed = Self::typed::<T>(&*collection)?;
        Ok(typed.acquire(self.strict_check))
    }

    /// Check an instance of `T` back in. The instance is cleared first.
    ///
    /// # Errors
    ///
    /// - `PoolError::UnknownType` if `T` was never acquired from this pool
    /// - `PoolError::NotAcquired` on a double release or a foreign instance
    pub fn release<T: Reference>(&self, reference: Box<T>) -> Result<(), PoolError> {
        let collection = self.collection(TypeId::of::<T>()).ok_or(PoolError::UnknownType {
            type_name: std::any::type_name::<T>(),
        })?;
        Self::typed::<T>(&*collection)?.release(reference, self.strict_check)
    }

    /// Check in a type-erased instance, routed by its concrete type.
    ///
    /// # Errors
    ///
    /// Same as [`ReferencePool::release`].
    pub fn release_boxed(&self, reference: Box<dyn Reference>) -> Result<(), PoolError> {
        // Deref first: the blanket `IntoAny` impl also covers the `Box` itself.
        let type_id = Any::type_id((*reference).as_any());
        let collection = self.collection(type_id).ok_or(PoolError::UnknownType {
            type_name: (*reference).type_name(),
        })?;
        collection.release_boxed(reference, self.strict_check)
    }

    /// Check in a type-erased instance the caller declares to be a `T`.
    ///
    /// # Errors
    ///
    /// `PoolError::TypeMismatch` if the instance is not a `T`; otherwise the
    /// errors of [`ReferencePool::release`].
    pub fn release_as<T: Reference>(&self, reference: Box<dyn Reference>) -> Result<(), PoolError> {
        let found = (*reference).type_name();
        let typed = reference
            .into_any()
            .downcast::<T>()
            .map_err(|_| PoolError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })?;
        self.release(typed)
    }

    /// Statistics for `T`, if it has a collection.
    #[must_use]
    pub fn info<T: Reference>(&self) -> Option<ReferencePoolInfo> {
        self.collection(TypeId::of::<T>()).map(|c| c.info())
    }

    /// Statistics for every pooled type, sorted by type name.
    #[must_use]
    pub fn infos(&self) -> Vec<ReferencePoolInfo> {
        let mut infos: Vec<_> = self.collections.read().values().map(|c| c.info()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }

    /// Drop every unused instance of every type without clearing them.
    ///
    /// Checked-out instances stay tracked and can still be released.
    pub fn clear_all(&self) {
        let collections: Vec<_> = self.collections.read().values().cloned().collect();
        let dropped: usize = collections.iter().map(|c| c.drop_unused()).sum();
        tracing::debug!(types = collections.len(), dropped, "reference pool cleared");
    }

    fn collection(&self, type_id: TypeId) -> Option<Arc<dyn Collection>> {
        self.collections.read().get(&type_id).cloned()
    }

    fn collection_or_insert<T: Reference>(&self) -> Arc<dyn Collection> {
        if let Some(collection) = self.collection(TypeId::of::<T>()) {
            return collection;
        }
        let mut collections = self.collections.write();
        Arc::clone(
            collections
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(ReferenceCollection::<T>::new())),
        )
    }

    fn typed<T: Reference>(collection: &dyn Collection) -> Result<&ReferenceCollection<T>, PoolError> {
        collection
            .as_any()
            .downcast_ref::<ReferenceCollection<T>>()
            .ok_or_else(|| PoolError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: collection.info().type_name,
            })
    }
}

impl Default for ReferencePool {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for ReferencePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencePool")
            .field("strict_check", &self.strict_check)
            .field("types", &self.count())
            .finish()
    }
}
