//! # Slot Pool
//!
//! Generational slot storage for objects that are created and freed one at a
//! time in no particular order.

use std::fmt;
use std::ops::{Index, IndexMut};

/// A pool of slots addressed by generational handles.
///
/// Freed slots go onto a free list and are reused by the next insert, so
/// both insert and free are O(1). Every reuse bumps the slot's generation;
/// a handle that outlived its object is rejected instead of aliasing the
/// new occupant.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is owned by a single tick-driven system.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: SlotPool<Ring> = SlotPool::with_capacity(64);
///
/// // Insert - O(1), reuses a freed slot when one exists
/// let handle = pool.insert(ring);
///
/// // Free - O(1), the slot goes back onto the free list
/// pool.remove(handle);
/// assert!(pool.get(handle).is_none());
/// ```
pub struct SlotPool<T> {
    /// The storage array.
    slots: Vec<Slot<T>>,
    /// Free list - indices of vacant slots.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    len: usize,
}

/// One entry in the pool.
struct Slot<T> {
    /// Bumped every time the slot is vacated.
    generation: u32,
    value: Option<T>,
}

/// Handle to an occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Index into the pool.
    index: u32,
    /// Generation the slot had when this handle was issued.
    generation: u32,
}

impl PoolHandle {
    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the generation this handle was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> SlotPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty pool with room for `capacity` objects before it
    /// needs to grow.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots ever allocated (occupied or free).
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Stores an object and returns its handle.
    ///
    /// This is a **O(1)** operation. A vacant slot is reused before the
    /// backing vector grows.
    pub fn insert(&mut self, value: T) -> PoolHandle {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return PoolHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });

        PoolHandle {
            index,
            generation: 0,
        }
    }

    /// Frees an occupied slot.
    ///
    /// This is a **O(1)** operation.
    ///
    /// # Returns
    ///
    /// The freed object, or None if the handle is stale or invalid.
    pub fn remove(&mut self, handle: PoolHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;

        Some(value)
    }

    /// Returns true if the handle still refers to a live object.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to a live object.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Gets a mutable reference to a live object.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Frees every slot. Outstanding handles all become stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index as u32);
        }
        self.len = 0;
    }

    /// Iterates over all live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    /// Iterates mutably over all live objects in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }
}

impl<T> Index<PoolHandle> for SlotPool<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the handle is stale. Use [`SlotPool::get`] when the handle
    /// may have outlived its object.
    fn index(&self, handle: PoolHandle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("stale pool handle {handle:?}"),
        }
    }
}

impl<T> IndexMut<PoolHandle> for SlotPool<T> {
    fn index_mut(&mut self, handle: PoolHandle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("stale pool handle {handle:?}"),
        }
    }
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("len", &self.len)
            .field("slot_count", &self.slots.len())
            .field("live", &self.iter().map(|(_, v)| v).collect::<Vec<_>>())
            .finish()
    }
}
