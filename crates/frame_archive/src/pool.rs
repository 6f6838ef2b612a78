//! Bounded object pool with generation-checked handles.
//!
//! Values live in a `Slab` sized once at construction. The slab never holds
//! more than `N` entries, so its keys stay below `N` and its storage never
//! reallocates. Every slot carries a generation that is bumped on
//! `deallocate`, which makes a handle to a freed or reused slot detectably
//! stale instead of aliasing the new occupant.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use slab::Slab;

use crate::error::HandleError;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique pool identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u32);

impl PoolId {
    fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a value stored in a [`FixedPool`].
pub struct Handle<T> {
    pool: PoolId,
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Pool that issued this handle
    #[inline]
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    /// Slot index, always below the pool capacity
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pool == other.pool && self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pool.hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pool", &self.pool)
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Allocation refused because every slot is occupied.
///
/// Hands the rejected value back so the caller decides where it is dropped.
pub struct PoolExhausted<T> {
    capacity: usize,
    value: T,
}

impl<T> PoolExhausted<T> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Recover the value that could not be stored
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for PoolExhausted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolExhausted")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PoolExhausted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool exhausted: all {} slots in use", self.capacity)
    }
}

impl<T> std::error::Error for PoolExhausted<T> {}

/// Fixed-capacity storage for up to `N` live values of one kind.
///
/// Not synchronized: mutation takes `&mut self`, callers serialize access.
pub struct FixedPool<T, const N: usize> {
    id: PoolId,
    entries: Slab<T>,
    generations: [u32; N],
}

impl<T, const N: usize> FixedPool<T, N> {
    /// Create an empty pool with all storage reserved up front
    pub fn new() -> Self {
        Self {
            id: PoolId::next(),
            entries: Slab::with_capacity(N),
            generations: [0; N],
        }
    }

    #[inline]
    pub fn id(&self) -> PoolId {
        self.id
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of live values
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= N
    }

    /// Store a value in a free slot.
    ///
    /// # Errors
    /// `PoolExhausted` carrying the value back when all `N` slots are live.
    pub fn allocate(&mut self, value: T) -> Result<Handle<T>, PoolExhausted<T>> {
        if self.is_full() {
            return Err(PoolExhausted { capacity: N, value });
        }
        let key = self.entries.insert(value);
        debug_assert!(key < N, "slab key {key} escaped pool capacity {N}");
        Ok(self.handle_for(key))
    }

    /// Free a slot and return its value.
    ///
    /// # Errors
    /// - `ForeignPool` if the handle was issued by another pool
    /// - `Stale` if the slot is already free or has been reused
    pub fn deallocate(&mut self, handle: Handle<T>) -> Result<T, HandleError> {
        let key = self.check(handle)?;
        self.generations[key] = self.generations[key].wrapping_add(1);
        Ok(self.entries.remove(key))
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, HandleError> {
        let key = self.check(handle)?;
        self.entries.get(key).ok_or(HandleError::Stale {
            index: key,
            generation: handle.generation,
        })
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, HandleError> {
        let key = self.check(handle)?;
        self.entries.get_mut(key).ok_or(HandleError::Stale {
            index: key,
            generation: handle.generation,
        })
    }

    /// Whether the handle still refers to a live value of this pool
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.check(handle).is_ok()
    }

    /// Handles of all live values
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.entries.iter().map(move |(key, _)| self.handle_for(key))
    }

    /// Live values with their handles
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.entries
            .iter()
            .map(move |(key, value)| (self.handle_for(key), value))
    }

    /// Free every slot, returning the values in slot order.
    ///
    /// Outstanding handles become stale.
    pub fn drain(&mut self) -> Vec<T> {
        let keys: Vec<usize> = self.entries.iter().map(|(key, _)| key).collect();
        keys.into_iter()
            .map(|key| {
                self.generations[key] = self.generations[key].wrapping_add(1);
                self.entries.remove(key)
            })
            .collect()
    }

    fn handle_for(&self, key: usize) -> Handle<T> {
        Handle {
            pool: self.id,
            index: key as u32,
            generation: self.generations[key],
            _marker: PhantomData,
        }
    }

    fn check(&self, handle: Handle<T>) -> Result<usize, HandleError> {
        if handle.pool != self.id {
            return Err(HandleError::ForeignPool {
                expected: self.id,
                found: handle.pool,
            });
        }

        let key = handle.index as usize;
        match self.generations.get(key) {
            Some(&generation) if generation == handle.generation && self.entries.contains(key) => {
                Ok(key)
            }
            _ => Err(HandleError::Stale {
                index: key,
                generation: handle.generation,
            }),
        }
    }
}

impl<T, const N: usize> Default for FixedPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for FixedPool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("id", &self.id)
            .field("len", &self.entries.len())
            .field("capacity", &N)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bound() {
        let mut pool: FixedPool<u32, 16> = FixedPool::new();
        let handles: Vec<_> = (0..16).map(|i| pool.allocate(i).unwrap()).collect();
        assert!(pool.is_full());
        assert_eq!(handles.len(), 16);

        let err = pool.allocate(99).unwrap_err();
        assert_eq!(err.capacity(), 16);
        assert_eq!(err.into_inner(), 99);
        assert_eq!(pool.len(), 16);
    }

    #[test]
    fn test_slot_reuse_after_deallocate() {
        let mut pool: FixedPool<String, 2> = FixedPool::new();
        let a = pool.allocate("a".to_string()).unwrap();
        let _b = pool.allocate("b".to_string()).unwrap();
        assert!(pool.allocate("c".to_string()).is_err());

        assert_eq!(pool.deallocate(a).unwrap(), "a");
        let c = pool.allocate("c".to_string()).unwrap();
        assert_eq!(pool.get(c).unwrap(), "c");
        // Same slot, new generation
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
    }

    #[test]
    fn test_double_free_is_stale() {
        let mut pool: FixedPool<u8, 4> = FixedPool::new();
        let h = pool.allocate(7).unwrap();
        pool.deallocate(h).unwrap();

        let err = pool.deallocate(h).unwrap_err();
        assert!(matches!(err, HandleError::Stale { .. }));
    }

    #[test]
    fn test_stale_handle_does_not_alias_new_occupant() {
        let mut pool: FixedPool<u8, 1> = FixedPool::new();
        let old = pool.allocate(1).unwrap();
        pool.deallocate(old).unwrap();
        let new = pool.allocate(2).unwrap();

        assert!(pool.get(old).is_err());
        assert!(pool.deallocate(old).is_err());
        assert_eq!(*pool.get(new).unwrap(), 2);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a: FixedPool<u8, 4> = FixedPool::new();
        let mut b: FixedPool<u8, 4> = FixedPool::new();
        let h = a.allocate(1).unwrap();
        b.allocate(1).unwrap();

        let err = b.deallocate(h).unwrap_err();
        assert!(matches!(err, HandleError::ForeignPool { .. }));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_drain_invalidates_handles() {
        let mut pool: FixedPool<u8, 4> = FixedPool::new();
        let h1 = pool.allocate(1).unwrap();
        let h2 = pool.allocate(2).unwrap();

        let mut drained = pool.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);
        assert!(pool.is_empty());
        assert!(!pool.contains(h1));
        assert!(!pool.contains(h2));
    }

    #[test]
    fn test_handles_lists_live_values() {
        let mut pool: FixedPool<u8, 4> = FixedPool::new();
        let a = pool.allocate(1).unwrap();
        let b = pool.allocate(2).unwrap();
        pool.deallocate(a).unwrap();

        let live: Vec<_> = pool.handles().collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn test_get_mut() {
        let mut pool: FixedPool<Vec<u8>, 2> = FixedPool::new();
        let h = pool.allocate(vec![1]).unwrap();
        pool.get_mut(h).unwrap().push(2);
        assert_eq!(pool.get(h).unwrap(), &vec![1, 2]);
    }
}
