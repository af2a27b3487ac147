//! Reusable entity storage shared by segments and obstacles.
//!
//! Every entity owned by an [`ObjectPool`] lives in exactly one of two sets:
//! the available queue, owned by the pool, or the active set, owned by
//! whoever holds its [`PoolHandle`]. Entities are reset on acquire, so
//! callers always receive a pristine value. Released entities are reused in
//! FIFO order, which keeps every released entity reachable.

use std::collections::VecDeque;

use lane_runner_core::PoolError;
use serde::{Deserialize, Serialize};

/// Behaviour of a pool whose available set is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Allocate a fresh entity whenever the available set runs dry.
    #[default]
    Grow,
    /// Never own more than `capacity` entities; acquiring beyond it fails.
    Capped {
        /// Maximum number of entities the pool may own.
        capacity: usize,
    },
}

/// Entity that can be recycled through an [`ObjectPool`].
pub trait Poolable: Default {
    /// Restores the entity to its pristine state before it is handed out.
    fn reset(&mut self);
}

/// Handle to an acquired entity in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle(usize);

impl PoolHandle {
    #[cfg(test)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug)]
struct PoolSlot<T> {
    item: T,
    in_use: bool,
}

/// Pool of reusable entities with an explicit exhaustion policy.
#[derive(Debug)]
pub struct ObjectPool<T> {
    slots: Vec<PoolSlot<T>>,
    available: VecDeque<usize>,
    policy: PoolPolicy,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool governed by the provided policy.
    #[must_use]
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            slots: Vec::new(),
            available: VecDeque::new(),
            policy,
        }
    }

    /// Creates a pool pre-populated with `count` available entities.
    ///
    /// A capped pool never pre-allocates beyond its capacity.
    #[must_use]
    pub fn with_prewarmed(policy: PoolPolicy, count: usize) -> Self {
        let count = match policy {
            PoolPolicy::Grow => count,
            PoolPolicy::Capped { capacity } => count.min(capacity),
        };
        let mut pool = Self::new(policy);
        for index in 0..count {
            pool.slots.push(PoolSlot {
                item: T::default(),
                in_use: false,
            });
            pool.available.push_back(index);
        }
        pool
    }

    /// Acquires an entity, resetting it before returning its handle.
    pub fn acquire(&mut self) -> Result<PoolHandle, PoolError> {
        let index = match self.available.pop_front() {
            Some(index) => index,
            None => self.grow()?,
        };

        let slot = &mut self.slots[index];
        debug_assert!(!slot.in_use, "available slot was marked in use");
        slot.item.reset();
        slot.in_use = true;
        Ok(PoolHandle(index))
    }

    /// Returns an entity to the available set.
    ///
    /// Releasing a handle twice is rejected with [`PoolError::DoubleRelease`]
    /// and leaves the pool untouched.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(handle.0)
            .ok_or(PoolError::UnknownHandle)?;
        if !slot.in_use {
            return Err(PoolError::DoubleRelease);
        }
        slot.in_use = false;
        self.available.push_back(handle.0);
        Ok(())
    }

    /// Borrows an active entity.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.0)
            .filter(|slot| slot.in_use)
            .map(|slot| &slot.item)
    }

    /// Mutably borrows an active entity.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.0)
            .filter(|slot| slot.in_use)
            .map(|slot| &mut slot.item)
    }

    /// Reports whether the handle currently sits in the available set.
    #[must_use]
    pub fn is_available(&self, handle: PoolHandle) -> bool {
        self.available.contains(&handle.0)
    }

    /// Number of entities currently held by acquirers.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len() - self.available.len()
    }

    /// Number of entities waiting in the available set.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Total number of entities owned by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the pool owns no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn grow(&mut self) -> Result<usize, PoolError> {
        if let PoolPolicy::Capped { capacity } = self.policy {
            if self.slots.len() >= capacity {
                return Err(PoolError::Exhausted { capacity });
            }
        }

        log::debug!("growing pool to {} entities", self.slots.len() + 1);
        self.slots.push(PoolSlot {
            item: T::default(),
            in_use: false,
        });
        Ok(self.slots.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Marker {
        dirty: bool,
    }

    impl Poolable for Marker {
        fn reset(&mut self) {
            self.dirty = false;
        }
    }

    #[test]
    fn acquired_entity_is_never_available_until_released() {
        let mut pool: ObjectPool<Marker> = ObjectPool::with_prewarmed(PoolPolicy::Grow, 2);
        let handle = pool.acquire().expect("prewarmed pool");

        assert!(!pool.is_available(handle));
        assert_eq!(pool.active_count(), 1);

        pool.release(handle).expect("first release");
        assert!(pool.is_available(handle));
        assert_eq!(pool.available_count(), 2);
    }

    #[test]
    fn double_release_is_rejected_without_duplication() {
        let mut pool: ObjectPool<Marker> = ObjectPool::new(PoolPolicy::Grow);
        let handle = pool.acquire().expect("growing pool");
        pool.release(handle).expect("first release");

        assert_eq!(pool.release(handle), Err(PoolError::DoubleRelease));
        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn capped_pool_reports_exhaustion() {
        let mut pool: ObjectPool<Marker> = ObjectPool::new(PoolPolicy::Capped { capacity: 1 });
        let first = pool.acquire().expect("within capacity");

        assert_eq!(pool.acquire(), Err(PoolError::Exhausted { capacity: 1 }));

        pool.release(first).expect("release");
        assert!(pool.acquire().is_ok(), "released entity is reusable");
    }

    #[test]
    fn growing_pool_allocates_on_demand() {
        let mut pool: ObjectPool<Marker> = ObjectPool::new(PoolPolicy::Grow);
        assert!(pool.is_empty());
        let handles: Vec<_> = (0..5).map(|_| pool.acquire().expect("grow")).collect();

        assert_eq!(pool.len(), 5);
        assert_eq!(pool.active_count(), 5);
        assert_eq!(handles.len(), 5);
    }

    #[test]
    fn acquire_resets_entity_state() {
        let mut pool: ObjectPool<Marker> = ObjectPool::new(PoolPolicy::Grow);
        let handle = pool.acquire().expect("grow");
        pool.get_mut(handle).expect("active").dirty = true;
        pool.release(handle).expect("release");

        let reused = pool.acquire().expect("reuse");
        assert_eq!(reused, handle);
        assert!(!pool.get(reused).expect("active").dirty);
    }

    #[test]
    fn released_entities_are_reused_in_release_order() {
        let mut pool: ObjectPool<Marker> = ObjectPool::with_prewarmed(PoolPolicy::Grow, 3);
        let a = pool.acquire().expect("a");
        let b = pool.acquire().expect("b");
        let c = pool.acquire().expect("c");

        pool.release(c).expect("c");
        pool.release(a).expect("a");

        assert_eq!(pool.acquire(), Ok(c));
        assert_eq!(pool.acquire(), Ok(a));
        assert!(pool.get(b).is_some());
    }

    #[test]
    fn foreign_handle_is_unknown() {
        let mut pool: ObjectPool<Marker> = ObjectPool::new(PoolPolicy::Grow);
        assert_eq!(pool.release(PoolHandle(7)), Err(PoolError::UnknownHandle));
        assert!(pool.get(PoolHandle(7)).is_none());
    }
}
