//! A small pool of short lived things (bits, sparks, drops).
//!
//! The storage is reserved once when a pattern starts and freed once when it stops. Entities are pushed lazily up to
//! the capacity and then recycled in place, so the pool never grows past what `allocate` reserved.
use alloc::vec::Vec;

use crate::errors::{LightsError, LightsResult};

pub trait PoolEntity {
    fn is_alive(&self) -> bool;
}

#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<T>,
    capacity: usize,
    allocated: bool,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    /// an empty pool. nothing is allocated until [`Pool::allocate`]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            capacity: 0,
            allocated: false,
        }
    }

    /// reserve room for exactly `capacity` entities. any previous storage is released first
    pub fn allocate(&mut self, capacity: usize) -> LightsResult<()> {
        self.release();

        let mut slots = Vec::new();

        slots
            .try_reserve_exact(capacity)
            .map_err(|source| LightsError::PoolAllocation {
                requested: capacity,
                source,
            })?;

        self.slots = slots;
        self.capacity = capacity;
        self.allocated = true;

        Ok(())
    }

    /// free the storage. returns false if there was nothing to free
    pub fn release(&mut self) -> bool {
        if !self.is_allocated() {
            return false;
        }

        self.slots = Vec::new();
        self.capacity = 0;
        self.allocated = false;

        true
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// the most entities this pool will hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// how many slots have been filled so far. dead entities still count
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// add a new entity. hands it back if the pool is full (or was never allocated)
    pub fn push(&mut self, entity: T) -> Result<(), T> {
        if self.is_full() {
            return Err(entity);
        }

        // this never reallocates. the room was reserved in allocate
        self.slots.push(entity);

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}

impl<T: PoolEntity> Pool<T> {
    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|x| x.is_alive()).count()
    }

    pub fn any_alive(&self) -> bool {
        self.slots.iter().any(|x| x.is_alive())
    }
}
